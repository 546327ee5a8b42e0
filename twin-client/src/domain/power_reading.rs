use time::PrimitiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct PowerReading {
    pub ts: PrimitiveDateTime,
    pub kwh: f64,
    pub day_of_week: f64,
    pub notes: Option<String>,
}

use crate::pipeline::{Envelope, PipelineError, Transform};
use time::macros::datetime;
use twin_client::PowerReading;

/// Pure validation of a `PowerReading`.
///
/// Rules:
/// - kWh must be finite and non-negative.
/// - day_of_week must be finite.
/// - ts must be within a broad sanity window [2000-01-01, 2100-01-01].
pub fn validate_power_reading(env: Envelope<PowerReading>) -> Result<Envelope<PowerReading>, PipelineError> {
    let r = &env.payload;

    if !r.kwh.is_finite() || r.kwh < 0.0 {
        return Err(PipelineError::Transform(format!(
            "kwh must be finite and non-negative, got {}",
            r.kwh
        )));
    }
    if !r.day_of_week.is_finite() {
        return Err(PipelineError::Transform("day_of_week must be finite".to_string()));
    }

    let min_ts = datetime!(2000-01-01 00:00:00);
    let max_ts = datetime!(2100-01-01 00:00:00);

    if r.ts < min_ts || r.ts > max_ts {
        return Err(PipelineError::Transform(format!("timestamp {} out of allowed range", r.ts)));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct PowerReadingValidation;

#[async_trait::async_trait]
impl Transform<PowerReading, PowerReading> for PowerReadingValidation {
    async fn apply(&self, input: Envelope<PowerReading>) -> Result<Envelope<PowerReading>, PipelineError> {
        validate_power_reading(input).inspect_err(|e| {
            metrics::counter!("power_reading_rejected_total").increment(1);
            tracing::warn!(error = %e, "rejected power reading");
        })
    }
}

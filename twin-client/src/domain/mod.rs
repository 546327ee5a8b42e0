pub mod feature_entry;
pub mod feature_key;
pub mod power_reading;
pub mod weather;

pub use feature_entry::{DailyRecord, FeatureEntry, HourlyRecord};
pub use feature_key::FeatureKey;
pub use power_reading::PowerReading;
pub use weather::{WeatherAggregates, WeatherDay};

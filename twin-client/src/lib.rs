pub mod domain;
pub mod store;

pub use domain::{DailyRecord, FeatureEntry, FeatureKey, HourlyRecord, PowerReading, WeatherAggregates, WeatherDay};
pub use store::{DittoStore, FeatureStore, InMemoryStore, StoreError};

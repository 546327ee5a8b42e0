pub mod feature_sync;

pub use feature_sync::{FeatureSyncSink, RowOutcome, SyncSummary};

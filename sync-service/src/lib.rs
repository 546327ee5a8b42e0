pub mod pipeline;
pub mod config;
pub mod sources;
pub mod sinks;
pub mod transform;
pub mod models;
pub mod predict;
pub mod store;
pub mod api;
pub mod observability;
pub mod metrics_server;

pub use pipeline::{Pipeline, Envelope};

// === Core Pipeline Modules ===
pub mod associator;
pub mod aws;
pub mod catalog;
pub mod config;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod models;
pub mod utils;

#[cfg(test)]
mod tests;

// === Common Exports ===
pub use error::{ScrapeError, ScrapeResult};

/// Prelude module containing commonly used types
pub mod prelude {
    pub use crate::associator::{Association, Associator};
    pub use crate::aws::{ClientFactory, QueueSender};
    pub use crate::config::{QueueSettings, ScrapeConfig};
    pub use crate::emitter::{ContextLabels, MetricMessage};
    pub use crate::error::{ScrapeError, ScrapeResult};
    pub use crate::executor::Executor;
    pub use crate::models::{
        CloudwatchMetric, CloudwatchMetricResult, CloudwatchMetricTask, DiscoveryJob,
        MetricRequest, MetricStats, Resource, StaticJob,
    };
}

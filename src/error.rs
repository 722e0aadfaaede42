//! Error types for the scrape pipeline.

/// Result type for scrape operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Standardized error types for the scrape pipeline
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("unknown service {name:?}")]
    UnknownService { name: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("authentication error: {message}")]
    Auth { message: String },

    #[error("AWS API error: {message}")]
    Aws { message: String },

    #[error("duplicate stat {stat:?} in metric group")]
    DuplicateStat { stat: String },

    #[error("queue send error: {message}")]
    QueueSend { message: String },
}

impl ScrapeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn auth(operation: &str, err: impl std::fmt::Debug) -> Self {
        Self::Auth {
            message: format!("{operation}: {err:?}"),
        }
    }

    pub fn aws(operation: &str, err: impl std::fmt::Debug) -> Self {
        Self::Aws {
            message: format!("{operation}: {err:?}"),
        }
    }

    pub fn queue(operation: &str, err: impl std::fmt::Debug) -> Self {
        Self::QueueSend {
            message: format!("{operation}: {err:?}"),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ScrapeError::UnknownService { .. } => "unknown_service",
            ScrapeError::Config { .. } => "configuration",
            ScrapeError::Auth { .. } => "authentication",
            ScrapeError::Aws { .. } => "aws_api",
            ScrapeError::DuplicateStat { .. } => "duplicate_stat",
            ScrapeError::QueueSend { .. } => "queue_send",
        }
    }
}

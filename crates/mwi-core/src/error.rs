//! Crate-wide error type for the crawl/relevance/link-graph engine.
//!
//! Mirrors the error-category split from `spec.md` §7: transient/retryable
//! conditions are distinguished from fatal-to-the-verb ones via
//! [`Error::is_recoverable`], and every variant carries a stable
//! [`Error::error_type`] tag for log correlation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("land not found: {0}")]
    LandNotFound(String),

    #[error("expression not found: {0}")]
    ExpressionNotFound(i64),

    #[error("domain not found: {0}")]
    DomainNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unreadable URL file: {0}")]
    UnreadableUrlFile(String),

    #[error("unknown merge strategy: {0}")]
    UnknownMergeStrategy(String),

    #[error("store conflict on {entity}: {detail}")]
    Conflict { entity: &'static str, detail: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("extractor error: {0}")]
    Extractor(String),

    #[error("gate error: {0}")]
    Gate(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable classifier string, suitable for log fields or metrics labels.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::LandNotFound(_) | Self::ExpressionNotFound(_) | Self::DomainNotFound(_) => {
                "NOT_FOUND"
            }
            Self::InvalidArgument(_)
            | Self::UnreadableUrlFile(_)
            | Self::UnknownMergeStrategy(_) => "INVALID_ARGUMENT",
            Self::Conflict { .. } => "CONFLICT",
            Self::Store(_) => "STORE_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Extractor(_) => "EXTRACTOR_ERROR",
            Self::Gate(_) => "GATE_ERROR",
            Self::Io(_) => "OS_ERROR",
            Self::Serialization(_) => "TYPE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Internal(_) => "UNHANDLED_EXCEPTION",
        }
    }

    /// Whether the verb entry-point should treat this as a per-item failure
    /// (count it and continue the batch) rather than an abort. Configuration
    /// errors and missing Lands are fatal to the verb per `spec.md` §7;
    /// everything else is recorded and the batch continues.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. }
                | Self::Store(_)
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::Extractor(_)
                | Self::Gate(_)
                | Self::Io(_)
                | Self::Serialization(_)
                | Self::Cancelled
        )
    }
}

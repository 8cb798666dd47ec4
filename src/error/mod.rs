//! Error types for the monologue pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for all pipeline operations.
#[derive(Error, Debug)]
pub enum MonologueError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-2xx response from the generation or synthesis endpoint.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected schema.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Local IO error at {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot probe audio duration of {}: {message}", path.display())]
    AudioProbe { path: PathBuf, message: String },

    /// Playback reached an index whose asset is not on disk.
    #[error("Segment {index} asset missing at {}", path.display())]
    Sync { index: usize, path: PathBuf },

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Segment limit of {limit} reached before the target duration")]
    SegmentLimit { limit: usize },

    /// The run stopped without reporting an outcome, e.g. a collaborator panicked.
    #[error("Pipeline aborted: {0}")]
    Aborted(String),

    #[error("Pipeline canceled")]
    Canceled,
}

/// Broad error category, mirroring the failure taxonomy the pipeline reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadStatus,
    Decode,
    LocalIo,
    Sync,
    Network,
    Timeout,
    Configuration,
    Playback,
    Canceled,
    Invalid,
    Aborted,
}

impl MonologueError {
    /// Create an API error from a status and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Api { .. } => ErrorCategory::BadStatus,
            Self::Decode(_) => ErrorCategory::Decode,
            Self::Network(_) => ErrorCategory::Network,
            Self::LocalIo { .. } | Self::AudioProbe { .. } => ErrorCategory::LocalIo,
            Self::Sync { .. } => ErrorCategory::Sync,
            Self::Playback(_) => ErrorCategory::Playback,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Canceled => ErrorCategory::Canceled,
            Self::Aborted(_) => ErrorCategory::Aborted,
            Self::InvalidArgument(_) | Self::SegmentLimit { .. } => ErrorCategory::Invalid,
        }
    }

    /// Whether a retry policy may attempt the operation again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Network(_) | Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Short message for the presentation layer.
    pub fn user_message(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Playback | ErrorCategory::Sync => "playback failed",
            ErrorCategory::Canceled => "canceled",
            ErrorCategory::Configuration => "configuration error",
            _ => "generation failed",
        }
    }
}

impl From<serde_json::Error> for MonologueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, MonologueError>;

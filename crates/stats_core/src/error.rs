use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid dataset version id: {0:?}")]
    InvalidVersion(String),

    #[error("Invalid {kind} name for output path: {value:?}")]
    InvalidComponent { kind: &'static str, value: String },

    #[error("Invalid binning for {field}: {reason}")]
    InvalidBinning { field: String, reason: String },

    #[error("Checksum mismatch: {path}")]
    ManifestMismatch { path: String },

    #[error("No manifest found for version {version}")]
    MissingManifest { version: String },
}

impl StatsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StatsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether re-running the pipeline can plausibly succeed without a code
    /// or input change.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StatsError::Io { .. } => true,
            StatsError::ManifestMismatch { .. } => true, // Re-publish rewrites the files
            StatsError::MissingManifest { .. } => true,
            StatsError::Json(_) => false,
            StatsError::Yaml(_) => false,
            StatsError::InvalidVersion(_) => false,
            StatsError::InvalidComponent { .. } => false,
            StatsError::InvalidBinning { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;

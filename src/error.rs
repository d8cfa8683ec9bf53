//! Error types for the gridseek crate

use thiserror::Error;

/// Main error type for the gridseek crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid action index {index} (expected 0-{max})")]
    InvalidAction { index: usize, max: usize },

    #[error("episode already finished; call reset before stepping again")]
    EpisodeFinished,

    #[error("environment has not been reset")]
    NotStarted,

    #[error("invalid map size {width}x{height} (both dimensions must be positive)")]
    InvalidMapSize { width: u32, height: u32 },

    #[error("feature vector has length {got}, expected {expected}")]
    FeatureLength { expected: usize, got: usize },

    #[error("value function produced {got} values, expected {expected}")]
    ValueLength { expected: usize, got: usize },

    #[error("value function produced a non-finite estimate for action {action}")]
    NonFiniteValue { action: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unsupported save format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("invalid reward scheme '{input}'. Expected one of: {expected}")]
    ParseRewardScheme { input: String, expected: String },

    #[error("invalid loss convention '{input}'. Expected one of: {expected}")]
    ParseTdLoss { input: String, expected: String },

    #[error("invalid approximator '{input}'. Expected one of: {expected}")]
    ParseApproximator { input: String, expected: String },

    #[error("invalid map size '{input}' (expected WIDTHxHEIGHT, e.g. 10x10)")]
    ParseMapSize { input: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

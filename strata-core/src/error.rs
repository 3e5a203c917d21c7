use thiserror::Error;

use crate::validate::ValidationFailure;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing key: no configuration source defines '{key}'")]
    MissingKey { key: String },

    #[error("no converter registered for type '{type_name}'")]
    NoConverterFound { type_name: String },

    #[error("cannot convert '{raw_value}' of key '{key}' to {type_name}: {reason}")]
    ConversionError {
        key: String,
        raw_value: String,
        type_name: String,
        reason: String,
    },

    #[error("validation error: {0}")]
    ValidationError(ValidationFailure),

    #[error("circular expression: {}", chain.join(" -> "))]
    CircularExpression { chain: Vec<String> },

    #[error("malformed expression in '{key}' ('{value}'): {reason}")]
    MalformedExpression {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to load configuration source '{source_name}': {reason}")]
    SourceLoadError { source_name: String, reason: String },

    #[error("ambiguous converters for type '{type_name}' at ordinal {ordinal}")]
    AmbiguousConverter { type_name: String, ordinal: i32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Startup-phase failures; a process must not run with a partial view after one of these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceLoadError { .. } | Self::AmbiguousConverter { .. } | Self::Io(_)
        )
    }
}

//! Error handling for the deep_beer service
//!
//! A single error enum covers the serving pipeline, artifact loading and the
//! offline preparation tools. HTTP mapping lives in `api_errors`.

use thiserror::Error;

/// Main error type for the deep_beer system
#[derive(Error, Debug)]
pub enum BeerError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A fitted transformer expects a column the record does not carry
    #[error("Schema mismatch: column '{column}' not found ({context})")]
    Schema { column: String, context: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Predicted index has no label in the fitted label space
    #[error("Decode failed: index {index} outside label space of {size} labels")]
    Decode { index: usize, size: usize },

    /// Missing, corrupt or inconsistent artifact; fatal at startup
    #[error("Artifact '{artifact}' failed to load: {message}")]
    Artifact { artifact: String, message: String },

    #[error("Tensor operation failed: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset error: {message}")]
    Dataset { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Result with BeerError
pub type BeerResult<T> = Result<T, BeerError>;

impl BeerError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
            context: context.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn decode(index: usize, size: usize) -> Self {
        Self::Decode { index, size }
    }

    /// Create an artifact load error
    pub fn artifact(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Artifact {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Prefix the error with the position of the batch item that raised it
    pub fn in_batch_item(self, index: usize) -> Self {
        match self {
            Self::Schema { column, context } => Self::Schema {
                column,
                context: format!("batch item {index}: {context}"),
            },
            Self::Validation { field, message } => Self::Validation {
                field: format!("[{index}].{field}"),
                message,
            },
            other => other,
        }
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for BeerError {
    fn from(err: serde_json::Error) -> Self {
        BeerError::serialization("json_operation", err)
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for BeerError {
    fn from(err: std::io::Error) -> Self {
        BeerError::io("io_operation", err)
    }
}

impl From<csv::Error> for BeerError {
    fn from(err: csv::Error) -> Self {
        BeerError::dataset(err.to_string())
    }
}

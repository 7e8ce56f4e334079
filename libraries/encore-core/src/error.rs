/// Core error types for Encore
use thiserror::Error;

/// Result type alias using `EncoreError`
pub type Result<T> = std::result::Result<T, EncoreError>;

/// Core error type for Encore
///
/// Collaborators (storage, media store, remote catalog) report failures
/// through this type. `Storage` is the generic storage failure every
/// persistence operation may return.
#[derive(Error, Debug)]
pub enum EncoreError {
    /// Generic storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote catalog unreachable or returned garbage
    #[error("Network error: {0}")]
    Network(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl EncoreError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = EncoreError::not_found("Track", "local-42");
        assert_eq!(err.to_string(), "Track not found: local-42");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EncoreError = io.into();
        assert!(matches!(err, EncoreError::Io(_)));
    }
}

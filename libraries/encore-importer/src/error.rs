//! Error types for the importer

use encore_core::EncoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Storage error: {0}")]
    Storage(#[from] EncoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_message_carries_sizes() {
        let err = ImportError::FileTooLarge {
            size: 60,
            limit: 50,
        };
        assert_eq!(
            err.to_string(),
            "File too large: 60 bytes exceeds the 50 byte limit"
        );
    }

    #[test]
    fn core_errors_convert() {
        let err: ImportError = EncoreError::storage("quota").into();
        assert!(matches!(err, ImportError::Storage(_)));
    }
}

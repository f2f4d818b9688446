//! Error types for the client core
//!
//! API failures stay as [`mirnet_api::ApiError`] and are surfaced as text;
//! the only error the core raises itself comes from reading picked files.

use std::path::PathBuf;

/// File picker errors
#[derive(Debug, thiserror::Error)]
pub enum PickerError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not a PNG or JPEG image
    #[error("unsupported file type: {0}")]
    UnsupportedMediaType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picker_error_display() {
        let err = PickerError::UnsupportedMediaType("notes.txt".into());
        assert_eq!(err.to_string(), "unsupported file type: notes.txt");
    }
}

//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("Sample interval must be positive and finite, got {0}")]
    InvalidSampleInterval(f64),
}

/// Result type alias for DSP operations
pub type DspResult<T> = Result<T, DspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DspError::BufferSizeMismatch {
            expected: 1024,
            got: 512,
        };
        assert!(err.to_string().contains("1024"));
        assert!(err.to_string().contains("512"));

        let err = DspError::InvalidSampleInterval(-1.0);
        assert!(err.to_string().contains("-1"));
    }
}

//! Error types for weft-core.

use std::io;

/// Error type for weft-core operations.
#[derive(Debug, thiserror::Error)]
pub enum WeftError {
    /// A caller-supplied value was rejected (negative dimension, malformed
    /// percentage, empty grapheme, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `insert_before` was given an anchor that is not a current child.
    #[error("unknown anchor: {0}")]
    UnknownAnchor(String),

    /// An operation required a live node but the target is destroyed or
    /// detached.
    #[error("unknown renderable: {0}")]
    UnknownRenderable(String),

    /// An internal invariant was broken (scissor stack mismatch, re-entrant
    /// frame render, drawing into a released buffer).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Layout computation failed.
    #[error("layout error: {0}")]
    Layout(String),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for weft-core operations.
pub type Result<T> = std::result::Result<T, WeftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WeftError::UnknownAnchor("sidebar".into());
        assert_eq!(err.to_string(), "unknown anchor: sidebar");
    }

    #[test]
    fn io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err: WeftError = io_err.into();
        assert!(matches!(err, WeftError::Io(_)));
    }

    #[test]
    fn invalid_argument_display() {
        let err = WeftError::InvalidArgument("width must be non-zero".into());
        assert!(err.to_string().contains("width must be non-zero"));
    }
}

//! Unified error types for the episode analytics crates
//!
//! [`GatError`] is returned by every fallible operation in `gat-core` and
//! `gat-kpi`. Only [`GatError::EpisodeInconsistency`] and
//! [`GatError::InvalidTimestamp`] abort a table build; a
//! [`GatError::MalformedActionEffect`] is recovered locally and surfaces as
//! a diagnostic instead.
//!
//! # Example
//!
//! ```ignore
//! use gat_core::{GatError, GatResult};
//!
//! fn check(episode: &Episode) -> GatResult<()> {
//!     episode.validate()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for episode operations.
#[derive(Error, Debug)]
pub enum GatError {
    /// Episode lengths or per-timestep vector lengths disagree with the
    /// declared episode shape
    #[error("Episode inconsistency: {0}")]
    EpisodeInconsistency(String),

    /// An action channel is missing sub-fields or references unknown ids
    #[error("Malformed action effect on channel '{channel}': {reason}")]
    MalformedActionEffect {
        channel: &'static str,
        reason: String,
    },

    /// Calendar fields of an observation do not form a valid date/time
    #[error("Invalid timestamp at timestep {timestep}: {reason}")]
    InvalidTimestamp { timestep: usize, reason: String },

    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// DataFrame construction errors
    #[error("Frame error: {0}")]
    Frame(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using GatError.
pub type GatResult<T> = Result<T, GatError>;

impl GatError {
    pub fn inconsistency(message: impl Into<String>) -> Self {
        GatError::EpisodeInconsistency(message.into())
    }

    pub fn malformed(channel: &'static str, reason: impl Into<String>) -> Self {
        GatError::MalformedActionEffect {
            channel,
            reason: reason.into(),
        }
    }
}

// JSON parsing errors
impl From<serde_json::Error> for GatError {
    fn from(err: serde_json::Error) -> Self {
        GatError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatError::inconsistency("3 actions for 3 observations");
        assert!(err.to_string().contains("Episode inconsistency"));
        assert!(err.to_string().contains("3 actions"));
    }

    #[test]
    fn test_malformed_display_names_channel() {
        let err = GatError::malformed("reconnect", "missing connected_id");
        assert!(err.to_string().contains("'reconnect'"));
        assert!(err.to_string().contains("missing connected_id"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let gat_err: GatError = io_err.into();
        assert!(matches!(gat_err, GatError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<Vec<u32>>("[1,").unwrap_err();
        let gat_err: GatError = err.into();
        assert!(matches!(gat_err, GatError::Parse(_)));
    }
}

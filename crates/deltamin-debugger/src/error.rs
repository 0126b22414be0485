//! Error types for the debugger adapters.

use deltamin_reducer::ReduceError;
use thiserror::Error;

/// Errors that can occur while configuring or running a debugger.
#[derive(Debug, Error)]
pub enum DebugError {
    /// The reducer failed.
    #[error(transparent)]
    Reduce(#[from] ReduceError),

    /// Reading the input or writing the result failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`DebuggerConfig`](crate::DebuggerConfig).
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Structured input could not be parsed into a tree.
    #[error("Parse error at byte {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    /// The configuration asks for something the chosen input kind cannot do.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    Logging(String),
}

impl DebugError {
    /// Create a parse error at `offset`.
    pub fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type alias for debugger operations.
pub type Result<T> = std::result::Result<T, DebugError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DebugError::parse(12, "unclosed '{'");
        assert_eq!(err.to_string(), "Parse error at byte 12: unclosed '{'");

        let err: DebugError = ReduceError::NoFailure.into();
        assert_eq!(
            err.to_string(),
            "Input does not exhibit failure - nothing to reduce"
        );
    }
}

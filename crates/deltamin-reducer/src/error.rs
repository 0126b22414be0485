//! Error types for the reducers.

use deltamin_core::PrintError;
use thiserror::Error;

/// Errors that can occur during a reduction run.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// Input verification was requested and the input does not fail.
    #[error("Input does not exhibit failure - nothing to reduce")]
    NoFailure,

    /// A pruned tree could not be serialized for the oracle.
    #[error("Tree serialization failed: {0}")]
    Print(#[from] PrintError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The oracle-call budget ran out before the reducer converged.
    #[error("Oracle budget of {0} checks exhausted")]
    BudgetExhausted(usize),
}

/// Result type alias for reducer operations.
pub type Result<T> = std::result::Result<T, ReduceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ReduceError::BudgetExhausted(40).to_string(),
            "Oracle budget of 40 checks exhausted"
        );

        let err: ReduceError = PrintError::unprintable("dangling brace").into();
        assert!(matches!(err, ReduceError::Print(_)));
        assert_eq!(
            err.to_string(),
            "Tree serialization failed: tree is not printable: dangling brace"
        );
    }
}

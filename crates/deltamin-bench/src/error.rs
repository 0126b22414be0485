//! Error types for the benchmark harness.

use deltamin_reducer::ReduceError;
use thiserror::Error;

/// Errors that can occur while running or persisting a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A reducer failed on a problem.
    #[error("Reduction failed: {0}")]
    Reduce(#[from] ReduceError),

    /// Results could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Results could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A problem's input does not fail its own oracle.
    #[error("Input of problem {problem} (seed {seed}) does not fail")]
    InputPasses { problem: String, seed: u64 },

    /// Invalid benchmark configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BenchError::InputPasses {
            problem: "scattered".into(),
            seed: 7,
        };
        assert_eq!(
            err.to_string(),
            "Input of problem scattered (seed 7) does not fail"
        );
        let err = BenchError::from(ReduceError::BudgetExhausted(3));
        assert!(err.to_string().starts_with("Reduction failed"));
    }
}

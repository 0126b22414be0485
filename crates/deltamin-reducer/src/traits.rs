//! Core traits for configuration reduction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use deltamin_core::{Configuration, Oracle};

use crate::error::{ReduceError, Result};
use crate::result::Reduction;

/// Configuration shared by every reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Maximum number of a round's candidates tested at once.
    ///
    /// `1` keeps the run strictly sequential.
    pub max_concurrency: usize,

    /// Spend one oracle call confirming that the input fails before
    /// reducing it.
    pub verify_input: bool,

    /// Upper bound on oracle calls for one run.
    pub max_checks: Option<usize>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            verify_input: false,
            max_checks: None,
        }
    }
}

impl ReducerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum concurrency level.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Enable or disable input verification.
    pub fn with_verify_input(mut self, verify: bool) -> Self {
        self.verify_input = verify;
        self
    }

    /// Limit the number of oracle calls.
    pub fn with_max_checks(mut self, max: usize) -> Self {
        self.max_checks = Some(max);
        self
    }

    /// Check the configuration for values no reducer can run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(ReduceError::InvalidConfig(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.max_checks == Some(0) {
            return Err(ReduceError::InvalidConfig(
                "max_checks must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

/// A strategy that shrinks a failing configuration while preserving the
/// failure.
///
/// The input configuration must fail under `oracle`. Reducers do not check
/// this unless [`ReducerConfig::verify_input`] is set; on an input that does
/// not fail they still terminate, but the result carries no minimality
/// guarantee.
///
/// # Example
///
/// ```rust,ignore
/// use deltamin_core::{Configuration, Input};
/// use deltamin_reducer::{DdMin, Reducer, ReducerConfig};
///
/// let reducer = DdMin::new(ReducerConfig::default());
/// let input = Input::new(vec![1, 3, 2, 7, 9, 3, 7, 5]).into_shared();
/// let reduction = reducer.reduce(Configuration::full(input), &oracle).await?;
/// println!("{} -> {} elements", reduction.original_size(), reduction.reduced_size());
/// ```
#[async_trait]
pub trait Reducer<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Reduce `config` while keeping `oracle` at FAIL.
    ///
    /// # Errors
    ///
    /// * `ReduceError::NoFailure` - Verification is on and the input passes.
    /// * `ReduceError::BudgetExhausted` - The oracle-call budget ran out.
    async fn reduce(
        &self,
        config: Configuration<T>,
        oracle: &dyn Oracle<Configuration<T>>,
    ) -> Result<Reduction<T>>;

    /// The configuration this reducer runs with.
    fn reducer_config(&self) -> &ReducerConfig;

    /// The same strategy running with `config` instead.
    ///
    /// Composite reducers use this to hand a nested reducer a narrower
    /// configuration, such as the budget left over from earlier work.
    fn reconfigured(&self, config: ReducerConfig) -> Box<dyn Reducer<T>>;

    /// Get the name of this reducer for logging purposes.
    fn name(&self) -> &str;

    /// Get a description of the reduction strategy.
    fn description(&self) -> &str {
        "No description available"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ReducerConfig::default();
        assert_eq!(config.max_concurrency, 1);
        assert!(!config.verify_input);
        assert_eq!(config.max_checks, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ReducerConfig::new()
            .with_max_concurrency(0)
            .with_verify_input(true)
            .with_max_checks(200);

        assert_eq!(config.max_concurrency, 1);
        assert!(config.verify_input);
        assert_eq!(config.max_checks, Some(200));
    }

    #[test]
    fn test_config_validation() {
        let config = ReducerConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReduceError::InvalidConfig(_))
        ));

        let config = ReducerConfig::new().with_max_checks(0);
        assert!(config.validate().is_err());
    }
}

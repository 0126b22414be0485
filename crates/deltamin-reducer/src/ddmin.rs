//! Delta debugging reducer.
//!
//! Implements the classic ddmin algorithm from "Simplifying and Isolating
//! Failure-Inducing Input" by Zeller & Hildebrandt (2002).
//!
//! The configuration is split into `n` contiguous chunks. Removing a chunk
//! (testing its complement) is tried first, then keeping a chunk alone. When
//! neither reduces, granularity doubles until every chunk is a single element,
//! at which point the result is 1-minimal.

use std::ops::Range;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, trace};

use deltamin_core::{Configuration, Oracle};

use crate::error::Result;
use crate::result::{Reduction, ReductionStats};
use crate::round::Round;
use crate::traits::{Reducer, ReducerConfig};

/// States of the partition-based control loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    SelectGranularity,
    TryComplements,
    TrySubsets,
    GrowGranularity,
    Done,
}

/// Delta debugging reducer using the classic ddmin algorithm.
///
/// Granularity starts at 2, drops by one after a complement is adopted,
/// resets to 2 after a single chunk is adopted and doubles when a whole
/// round produces nothing. Within a round the leftmost failing candidate
/// wins.
#[derive(Debug, Clone, Default)]
pub struct DdMin {
    config: ReducerConfig,
}

impl DdMin {
    /// Create a new ddmin reducer with the given configuration.
    pub fn new(config: ReducerConfig) -> Self {
        Self { config }
    }

    /// Create a reducer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ReducerConfig::default())
    }

    /// The reducer configuration.
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }
}

/// Run ddmin on `current`, starting at `granularity` chunks.
///
/// [`DdMin`] starts at 2. The boundary reducer starts its final pass at the
/// full length, since its scan already tried the coarser removals.
pub(crate) async fn partition_reduce<T>(
    mut current: Configuration<T>,
    granularity: usize,
    round: &Round<'_, T>,
    stats: &mut ReductionStats,
) -> Result<Configuration<T>>
where
    T: Send + Sync + 'static,
{
    let mut n: usize = granularity.max(2);
    let mut chunks: Vec<Range<usize>> = Vec::new();
    let mut phase = Phase::SelectGranularity;

    loop {
        phase = match phase {
            Phase::SelectGranularity => {
                if current.is_empty() {
                    Phase::Done
                } else {
                    // A single element is split into one chunk so that its
                    // removal (the empty complement) still gets tested.
                    n = n.min(current.len());
                    chunks = current.partition(n);
                    stats.observe_granularity(n);
                    trace!(
                        current_size = current.len(),
                        granularity = n,
                        chunks = chunks.len(),
                        "ddmin round"
                    );
                    Phase::TryComplements
                }
            }
            Phase::TryComplements => {
                let outcome = round
                    .run(
                        chunks.len(),
                        |i| current.complement(chunks[i].clone()),
                        stats,
                    )
                    .await?;
                match outcome.winner {
                    Some(i) => {
                        let next = current.complement(chunks[i].clone());
                        debug!(
                            chunk_index = i,
                            removed = current.len() - next.len(),
                            remaining = next.len(),
                            "Reduced to complement"
                        );
                        current = next;
                        n = n.saturating_sub(1).max(2);
                        stats.record_successful_reduction();
                        Phase::SelectGranularity
                    }
                    // With two chunks each subset equals the other complement.
                    None if chunks.len() > 2 => Phase::TrySubsets,
                    None => {
                        stats.record_failed_attempt();
                        Phase::GrowGranularity
                    }
                }
            }
            Phase::TrySubsets => {
                let outcome = round
                    .run(chunks.len(), |i| current.slice(chunks[i].clone()), stats)
                    .await?;
                match outcome.winner {
                    Some(i) => {
                        let next = current.slice(chunks[i].clone());
                        debug!(
                            chunk_index = i,
                            chunk_size = next.len(),
                            "Reduced to subset"
                        );
                        current = next;
                        n = 2;
                        stats.record_successful_reduction();
                        Phase::SelectGranularity
                    }
                    None => {
                        stats.record_failed_attempt();
                        Phase::GrowGranularity
                    }
                }
            }
            Phase::GrowGranularity => {
                if n >= current.len() {
                    debug!(
                        final_size = current.len(),
                        "Reduction complete - maximum granularity reached"
                    );
                    Phase::Done
                } else {
                    n = (2 * n).min(current.len());
                    stats.record_granularity_increase(n);
                    Phase::SelectGranularity
                }
            }
            Phase::Done => break,
        };
    }

    Ok(current)
}

#[async_trait]
impl<T> Reducer<T> for DdMin
where
    T: Send + Sync + 'static,
{
    async fn reduce(
        &self,
        config: Configuration<T>,
        oracle: &dyn Oracle<Configuration<T>>,
    ) -> Result<Reduction<T>> {
        self.config.validate()?;
        let start = Instant::now();
        let original_size = config.len();

        info!(
            original_size,
            reducer = Reducer::<T>::name(self),
            oracle = oracle.name(),
            max_concurrency = self.config.max_concurrency,
            "Starting ddmin reduction"
        );

        let mut stats = ReductionStats::new(original_size);
        let round = Round::new(oracle, &self.config);
        round.verify_input(&config, &mut stats).await?;

        let reduced = partition_reduce(config, 2, &round, &mut stats).await?;
        Ok(Reduction::finish(
            Reducer::<T>::name(self),
            reduced,
            stats,
            start,
        ))
    }

    fn reducer_config(&self) -> &ReducerConfig {
        &self.config
    }

    fn reconfigured(&self, config: ReducerConfig) -> Box<dyn Reducer<T>> {
        Box::new(DdMin::new(config))
    }

    fn name(&self) -> &str {
        "ddmin"
    }

    fn description(&self) -> &str {
        "Delta debugging reducer using the classic ddmin algorithm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltamin_core::{oracle_fn, Input, RecordingOracle, Verdict};

    use crate::error::ReduceError;

    fn full<T>(elements: Vec<T>) -> Configuration<T> {
        Configuration::full(Input::new(elements).into_shared())
    }

    fn values(config: &Configuration<u32>) -> Vec<u32> {
        config.materialize()
    }

    // FAIL iff 3 is followed, not necessarily directly, by 7.
    fn three_then_seven(c: &Configuration<u32>) -> Verdict {
        let mut seen_three = false;
        for &x in c.iter() {
            if x == 3 {
                seen_three = true;
            } else if x == 7 && seen_three {
                return Verdict::Fail;
            }
        }
        Verdict::Pass
    }

    // FAIL iff 3, 5 and 7 are present; UNRESOLVED without 5.
    fn needs_three_five_seven(c: &Configuration<u32>) -> Verdict {
        let has = |v: u32| c.iter().any(|&x| x == v);
        if !has(5) {
            Verdict::Unresolved
        } else if has(3) && has(7) {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    #[tokio::test]
    async fn test_ordered_subsequence() {
        let reducer = DdMin::with_defaults();
        let oracle = oracle_fn(three_then_seven);
        let input = full(vec![1, 3, 2, 7, 9, 3, 7, 5]);

        let reduction = reducer.reduce(input, &oracle).await.unwrap();

        assert_eq!(values(&reduction.configuration), vec![3, 7]);
        assert_eq!(reduction.original_size(), 8);
        assert_eq!(reduction.reduced_size(), 2);
        assert!(reduction.stats.successful_reductions >= 3);
    }

    #[tokio::test]
    async fn test_unresolved_counts_as_not_failing() {
        let reducer = DdMin::with_defaults();
        let oracle = RecordingOracle::new(oracle_fn(needs_three_five_seven));

        let reduction = reducer
            .reduce(full((0..10).collect()), &oracle)
            .await
            .unwrap();

        assert_eq!(values(&reduction.configuration), vec![3, 5, 7]);
        assert!(reduction.stats.verdicts.unresolved > 0);
        assert_eq!(reduction.stats.verdicts, oracle.counts());
        assert_eq!(reduction.stats.checks_performed, oracle.calls());
    }

    #[tokio::test]
    async fn test_result_is_one_minimal() {
        let reducer = DdMin::with_defaults();
        let oracle = oracle_fn(needs_three_five_seven);
        let reduction = reducer
            .reduce(full((0..32).collect()), &oracle)
            .await
            .unwrap();

        let result = reduction.configuration;
        assert_eq!(oracle.test(&result).await, Verdict::Fail);
        for pos in 0..result.len() {
            assert_ne!(oracle.test(&result.without(pos)).await, Verdict::Fail);
        }
    }

    #[tokio::test]
    async fn test_idempotent() {
        let reducer = DdMin::with_defaults();
        let oracle = oracle_fn(three_then_seven);
        let first = reducer
            .reduce(full(vec![5, 3, 1, 1, 7, 3, 9, 7, 2, 2]), &oracle)
            .await
            .unwrap();

        let second = reducer
            .reduce(first.configuration.clone(), &oracle)
            .await
            .unwrap();

        assert_eq!(second.configuration, first.configuration);
        assert_eq!(second.stats.successful_reductions, 0);
    }

    #[tokio::test]
    async fn test_length_never_increases() {
        let sizes = std::sync::Mutex::new(Vec::new());
        let oracle = oracle_fn(|c: &Configuration<u32>| {
            let verdict = needs_three_five_seven(c);
            if verdict.is_fail() {
                sizes.lock().unwrap().push(c.len());
            }
            verdict
        });

        DdMin::with_defaults()
            .reduce(full((0..40).collect()), &oracle)
            .await
            .unwrap();

        let sizes = sizes.into_inner().unwrap();
        assert!(!sizes.is_empty());
        assert!(sizes.windows(2).all(|w| w[1] <= w[0]));
    }

    #[tokio::test]
    async fn test_single_element_can_vanish() {
        let oracle = oracle_fn(|_: &Configuration<u32>| Verdict::Fail);
        let reduction = DdMin::with_defaults()
            .reduce(full(vec![42]), &oracle)
            .await
            .unwrap();
        assert!(reduction.configuration.is_empty());

        let reduction = DdMin::with_defaults()
            .reduce(full(Vec::<u32>::new()), &oracle)
            .await
            .unwrap();
        assert!(reduction.configuration.is_empty());
        assert_eq!(reduction.stats.checks_performed, 0);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let oracle = oracle_fn(three_then_seven);
        let input = vec![1, 3, 2, 7, 9, 3, 7, 5, 3, 3, 8, 7];

        let sequential = DdMin::with_defaults()
            .reduce(full(input.clone()), &oracle)
            .await
            .unwrap();
        let concurrent = DdMin::new(ReducerConfig::new().with_max_concurrency(4))
            .reduce(full(input), &oracle)
            .await
            .unwrap();

        assert_eq!(
            sequential.configuration.indices(),
            concurrent.configuration.indices()
        );
        assert!(concurrent.stats.checks_performed >= sequential.stats.checks_performed);
    }

    #[tokio::test]
    async fn test_precondition_not_rechecked_by_default() {
        let oracle = RecordingOracle::new(oracle_fn(|_: &Configuration<u32>| Verdict::Pass));
        let reduction = DdMin::with_defaults()
            .reduce(full(vec![1, 2, 3, 4]), &oracle)
            .await
            .unwrap();

        // Nothing ever fails, so nothing is removed; the input itself is
        // never tested.
        assert_eq!(reduction.reduced_size(), 4);
        assert_eq!(oracle.counts().fail, 0);

        let err = DdMin::new(ReducerConfig::new().with_verify_input(true))
            .reduce(full(vec![1, 2, 3, 4]), &oracle)
            .await
            .unwrap_err();
        assert!(matches!(err, ReduceError::NoFailure));
    }

    #[test]
    fn test_reducer_creation() {
        let reducer = DdMin::with_defaults();
        assert_eq!(Reducer::<u32>::name(&reducer), "ddmin");

        let reducer = DdMin::new(ReducerConfig::new().with_max_checks(500));
        assert_eq!(reducer.config().max_checks, Some(500));
    }
}

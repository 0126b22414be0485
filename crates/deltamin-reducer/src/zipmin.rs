//! Boundary-scanning reducer.
//!
//! ZipMin peels material off the two ends of the configuration before
//! falling back to full partitioning. The unresolved part is a window
//! between a kept prefix and a kept suffix; each end of the window has a
//! cursor holding the size of the chunk to try removing next.
//!
//! Cursors start at half the configuration. A refused removal halves the
//! cursor, so the chunk size walks down the way ddmin's granularity walks
//! up. An adopted removal doubles it, so long irrelevant stretches go in a
//! few checks. Once a single element is refused it joins the kept part and
//! the window shrinks by one. When the window closes, the remainder goes
//! through ddmin at full granularity, which gives the same 1-minimality
//! guarantee.
//!
//! This pays off when the failure-relevant elements sit together in one
//! region; when they are spread out the scan still narrows the gaps between
//! them with a binary search per gap.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, trace};

use deltamin_core::{Configuration, Oracle};

use crate::ddmin::partition_reduce;
use crate::error::Result;
use crate::result::{Reduction, ReductionStats};
use crate::round::Round;
use crate::traits::{Reducer, ReducerConfig};

/// Which end of the window a boundary candidate trims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Head,
    Tail,
}

/// Chunk size for one end of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    size: usize,
}

impl Cursor {
    fn new(len: usize) -> Self {
        Self {
            size: (len / 2).max(1),
        }
    }

    /// Size to try on a window of `span` elements, at most half of it so
    /// the two ends never overlap.
    fn clamp(&self, span: usize) -> usize {
        self.size.min((span / 2).max(1))
    }

    /// The removal of `tried` elements was adopted.
    fn gallop(&mut self, tried: usize) {
        self.size = tried.saturating_mul(2);
    }

    /// The removal of `tried` elements was refused. Returns true when a
    /// single element was refused, which then stays.
    fn shrink(&mut self, tried: usize) -> bool {
        if tried <= 1 {
            self.size = 1;
            true
        } else {
            self.size = tried / 2;
            false
        }
    }
}

/// Boundary reducer for failures concentrated in one region.
#[derive(Debug, Clone, Default)]
pub struct ZipMin {
    config: ReducerConfig,
}

impl ZipMin {
    /// Create a new boundary reducer with the given configuration.
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

    /// Scan inward from both ends until the window closes.
    async fn trim_boundaries<T>(
        &self,
        mut current: Configuration<T>,
        round: &Round<'_, T>,
        stats: &mut ReductionStats,
    ) -> Result<Configuration<T>>
    where
        T: Send + Sync + 'static,
    {
        let mut head = Cursor::new(current.len());
        let mut tail = head;
        // Positions [lo, hi) of `current` are still unresolved.
        let mut lo = 0;
        let mut hi = current.len();

        while lo < hi {
            let span = hi - lo;
            let head_size = head.clamp(span);
            let tail_size = tail.clamp(span);

            let mut planned = vec![(Side::Head, lo..lo + head_size)];
            if span > 1 {
                planned.push((Side::Tail, hi - tail_size..hi));
            }
            trace!(
                current_size = current.len(),
                window = span,
                head = head_size,
                tail = tail_size,
                "ZipMin boundary round"
            );

            let outcome = round
                .run(
                    planned.len(),
                    |i| current.complement(planned[i].1.clone()),
                    stats,
                )
                .await?;

            match outcome.winner {
                Some(i) => {
                    let (side, range) = planned[i].clone();
                    debug!(
                        side = ?side,
                        removed = range.len(),
                        remaining = current.len() - range.len(),
                        "Trimmed boundary"
                    );
                    hi -= range.len();
                    match side {
                        Side::Head => head.gallop(range.len()),
                        Side::Tail => tail.gallop(range.len()),
                    }
                    current = current.complement(range);
                    stats.record_successful_reduction();
                }
                None => {
                    stats.record_failed_attempt();
                    for (side, range) in &planned {
                        match side {
                            Side::Head => {
                                if head.shrink(range.len()) {
                                    lo += 1;
                                }
                            }
                            Side::Tail => {
                                if tail.shrink(range.len()) {
                                    hi -= 1;
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(current)
    }
}

#[async_trait]
impl<T> Reducer<T> for ZipMin
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
            "Starting ZipMin reduction"
        );

        let mut stats = ReductionStats::new(original_size);
        let round = Round::new(oracle, &self.config);
        round.verify_input(&config, &mut stats).await?;

        let trimmed = self.trim_boundaries(config, &round, &mut stats).await?;
        debug!(
            remaining = trimmed.len(),
            checks = stats.checks_performed,
            "Window closed, finishing with ddmin"
        );
        let granularity = trimmed.len();
        let reduced = partition_reduce(trimmed, granularity, &round, &mut stats).await?;

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
        Box::new(ZipMin::new(config))
    }

    fn name(&self) -> &str {
        "zipmin"
    }

    fn description(&self) -> &str {
        "Boundary reducer that scans inward from both ends before finishing with ddmin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltamin_core::{oracle_fn, Input, RecordingOracle, Verdict};

    use crate::ddmin::DdMin;

    fn chars(text: &str) -> Configuration<char> {
        Configuration::full(Input::new(text.chars().collect()).into_shared())
    }

    fn all_digits(c: &Configuration<char>) -> Verdict {
        let text: String = c.iter().collect();
        if ('0'..='9').all(|d| text.contains(d)) {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    #[test]
    fn test_cursor_sizes() {
        let mut cursor = Cursor::new(20);
        assert_eq!(cursor.size, 10);
        assert_eq!(cursor.clamp(7), 3);

        assert!(!cursor.shrink(10));
        assert_eq!(cursor.size, 5);
        cursor.gallop(5);
        assert_eq!(cursor.size, 10);

        assert!(!cursor.shrink(2));
        assert!(cursor.shrink(1));
        assert_eq!(cursor.size, 1);
        assert_eq!(Cursor::new(1).clamp(1), 1);
    }

    #[tokio::test]
    async fn test_clustered_digits() {
        let input = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz1234567890ABCDEFGHI";
        let oracle = oracle_fn(all_digits);

        let zip = RecordingOracle::new(&oracle);
        let reduction = ZipMin::with_defaults()
            .reduce(chars(input), &zip)
            .await
            .unwrap();
        let text: String = reduction.configuration.materialize().into_iter().collect();
        assert_eq!(text, "1234567890");

        let dd = RecordingOracle::new(&oracle);
        DdMin::with_defaults()
            .reduce(chars(input), &dd)
            .await
            .unwrap();
        assert!(
            zip.calls() < dd.calls(),
            "zipmin {} vs ddmin {}",
            zip.calls(),
            dd.calls()
        );
    }

    #[tokio::test]
    async fn test_long_irrelevant_prefix_goes_in_few_checks() {
        let input = format!("{}1234567890", "x".repeat(1000));
        let oracle = RecordingOracle::new(oracle_fn(all_digits));

        let reduction = ZipMin::with_defaults()
            .reduce(chars(&input), &oracle)
            .await
            .unwrap();

        assert_eq!(reduction.configuration.len(), 10);
        assert!(oracle.calls() < 100, "{} calls", oracle.calls());
    }

    #[tokio::test]
    async fn test_clustered_core_matches_ddmin() {
        let input = format!("{}XYZ{}", "a".repeat(60), "b".repeat(60));
        let oracle = oracle_fn(|c: &Configuration<char>| {
            let text: String = c.iter().collect();
            if text.contains("XYZ") {
                Verdict::Fail
            } else {
                Verdict::Pass
            }
        });

        let zip = RecordingOracle::new(&oracle);
        let zipped = ZipMin::with_defaults()
            .reduce(chars(&input), &zip)
            .await
            .unwrap();

        let dd = RecordingOracle::new(&oracle);
        let dded = DdMin::with_defaults()
            .reduce(chars(&input), &dd)
            .await
            .unwrap();

        assert_eq!(zipped.configuration.materialize(), vec!['X', 'Y', 'Z']);
        assert_eq!(dded.configuration.materialize(), vec!['X', 'Y', 'Z']);
        assert_eq!(zipped.stats.checks_performed, zip.calls());
        assert_eq!(dded.stats.checks_performed, dd.calls());
    }

    #[tokio::test]
    async fn test_result_is_one_minimal() {
        let oracle = oracle_fn(|c: &Configuration<u32>| {
            let has = |v: u32| c.iter().any(|&x| x == v);
            if has(2) && has(11) && has(29) {
                Verdict::Fail
            } else {
                Verdict::Unresolved
            }
        });
        let input = Configuration::full(Input::new((0..30).collect()).into_shared());

        let reduction = ZipMin::with_defaults().reduce(input, &oracle).await.unwrap();
        let result = reduction.configuration;

        assert_eq!(result.materialize(), vec![2, 11, 29]);
        for pos in 0..result.len() {
            assert_ne!(oracle.test(&result.without(pos)).await, Verdict::Fail);
        }
    }

    #[tokio::test]
    async fn test_idempotent() {
        let oracle = oracle_fn(all_digits);
        let first = ZipMin::with_defaults()
            .reduce(chars("xx0123yy456789zz"), &oracle)
            .await
            .unwrap();
        let second = ZipMin::with_defaults()
            .reduce(first.configuration.clone(), &oracle)
            .await
            .unwrap();

        assert_eq!(second.configuration, first.configuration);
        assert_eq!(second.stats.successful_reductions, 0);
    }
}

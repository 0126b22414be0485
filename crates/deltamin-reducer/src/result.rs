//! Result types for reduction runs.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use deltamin_core::{Configuration, Verdict, VerdictCounts};

/// The result of a finished reduction run.
#[derive(Debug, Clone)]
pub struct Reduction<T> {
    /// The reduced configuration. It failed the last time it was tested.
    pub configuration: Configuration<T>,

    /// Statistics about the run.
    pub stats: ReductionStats,
}

impl<T> Reduction<T> {
    /// Wrap a finished run, filling in the size fields of `stats`.
    pub fn new(configuration: Configuration<T>, mut stats: ReductionStats) -> Self {
        stats.reduced_size = configuration.len();
        Self {
            configuration,
            stats,
        }
    }

    /// Close a run started at `start`: stamp the duration and log the
    /// summary line.
    pub(crate) fn finish(
        reducer: &str,
        configuration: Configuration<T>,
        mut stats: ReductionStats,
        start: Instant,
    ) -> Self {
        let duration = start.elapsed();
        stats.duration = Some(duration);
        let reduction = Self::new(configuration, stats);

        info!(
            reducer,
            original_size = reduction.stats.original_size,
            reduced_size = reduction.stats.reduced_size,
            reduction_percent = format!("{:.1}%", reduction.reduction_percentage()),
            checks = reduction.stats.checks_performed,
            unresolved = reduction.stats.verdicts.unresolved,
            duration = ?duration,
            "Reduction complete"
        );
        reduction
    }

    /// Number of elements in the input configuration.
    pub fn original_size(&self) -> usize {
        self.stats.original_size
    }

    /// Number of elements left after reduction.
    pub fn reduced_size(&self) -> usize {
        self.stats.reduced_size
    }

    /// Share of elements kept, from 0.0 to 1.0.
    pub fn reduction_ratio(&self) -> f64 {
        self.stats.reduction_ratio()
    }

    /// Get the percentage reduction achieved.
    pub fn reduction_percentage(&self) -> f64 {
        (1.0 - self.reduction_ratio()) * 100.0
    }
}

impl<T> fmt::Display for Reduction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reduction {{ {} -> {} elements ({:.1}% reduction), {} checks",
            self.stats.original_size,
            self.stats.reduced_size,
            self.reduction_percentage(),
            self.stats.checks_performed
        )?;
        if let Some(duration) = self.stats.duration {
            write!(f, ", {:?}", duration)?;
        }
        write!(f, " }}")
    }
}

/// Statistics about a reduction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReductionStats {
    /// Size of the input configuration.
    pub original_size: usize,

    /// Size of the reduced configuration.
    pub reduced_size: usize,

    /// Number of oracle calls, discarded ones included.
    pub checks_performed: usize,

    /// Oracle verdicts by kind.
    pub verdicts: VerdictCounts,

    /// Number of candidates adopted as the new configuration.
    pub successful_reductions: usize,

    /// Number of rounds that produced no reduction.
    pub failed_attempts: usize,

    /// Number of times granularity was increased.
    pub granularity_increases: usize,

    /// Maximum granularity reached.
    pub max_granularity: usize,

    /// Oracle calls whose result was ignored because an earlier candidate
    /// of the same concurrent batch won.
    pub discarded_checks: usize,

    /// Time taken for the run.
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl ReductionStats {
    /// Create stats for a run over `original_size` elements.
    pub fn new(original_size: usize) -> Self {
        Self {
            original_size,
            reduced_size: original_size,
            ..Default::default()
        }
    }

    /// Record one oracle call.
    pub fn record_check(&mut self, verdict: Verdict) {
        self.checks_performed += 1;
        self.verdicts.record(verdict);
    }

    /// Record an adopted candidate.
    pub fn record_successful_reduction(&mut self) {
        self.successful_reductions += 1;
    }

    /// Record a round without reduction.
    pub fn record_failed_attempt(&mut self) {
        self.failed_attempts += 1;
    }

    /// Record a granularity increase.
    pub fn record_granularity_increase(&mut self, new_granularity: usize) {
        self.granularity_increases += 1;
        self.observe_granularity(new_granularity);
    }

    /// Track the largest granularity used.
    pub fn observe_granularity(&mut self, granularity: usize) {
        if granularity > self.max_granularity {
            self.max_granularity = granularity;
        }
    }

    /// Fold the counters of a nested run into these stats.
    ///
    /// Sizes and duration are left alone; they describe the outer run.
    pub fn absorb(&mut self, nested: &ReductionStats) {
        self.checks_performed += nested.checks_performed;
        self.verdicts.merge(&nested.verdicts);
        self.successful_reductions += nested.successful_reductions;
        self.failed_attempts += nested.failed_attempts;
        self.granularity_increases += nested.granularity_increases;
        self.discarded_checks += nested.discarded_checks;
        self.observe_granularity(nested.max_granularity);
    }

    /// Share of elements kept, from 0.0 to 1.0.
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_size > 0 {
            self.reduced_size as f64 / self.original_size as f64
        } else {
            1.0
        }
    }

    /// Get the total number of decided rounds.
    pub fn total_attempts(&self) -> usize {
        self.successful_reductions + self.failed_attempts
    }

    /// Get the success rate of rounds.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_attempts();
        if total == 0 {
            0.0
        } else {
            self.successful_reductions as f64 / total as f64
        }
    }
}

impl fmt::Display for ReductionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ {}/{} elements kept, {} checks ({}), {:.1}% success rate",
            self.reduced_size,
            self.original_size,
            self.checks_performed,
            self.verdicts,
            self.success_rate() * 100.0
        )?;
        if self.discarded_checks > 0 {
            write!(f, ", {} discarded", self.discarded_checks)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltamin_core::Input;

    #[test]
    fn test_reduction_sizes() {
        let input = Input::new((0..10).collect::<Vec<u32>>()).into_shared();
        let config = Configuration::from_indices(input, vec![1, 4, 7, 9]);
        let reduction = Reduction::new(config, ReductionStats::new(10));

        assert_eq!(reduction.original_size(), 10);
        assert_eq!(reduction.reduced_size(), 4);
        assert!((reduction.reduction_ratio() - 0.4).abs() < 1e-9);
        assert!((reduction.reduction_percentage() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_recording() {
        let mut stats = ReductionStats::new(8);
        stats.record_check(Verdict::Fail);
        stats.record_check(Verdict::Pass);
        stats.record_check(Verdict::Unresolved);
        stats.record_successful_reduction();
        stats.record_failed_attempt();
        stats.record_failed_attempt();
        stats.record_granularity_increase(4);
        stats.record_granularity_increase(8);

        assert_eq!(stats.checks_performed, 3);
        assert_eq!(stats.verdicts.unresolved, 1);
        assert_eq!(stats.total_attempts(), 3);
        assert!((stats.success_rate() - 0.333).abs() < 0.01);
        assert_eq!(stats.max_granularity, 8);
    }

    #[test]
    fn test_absorb_nested_stats() {
        let mut outer = ReductionStats::new(20);
        let mut nested = ReductionStats::new(5);
        nested.record_check(Verdict::Fail);
        nested.record_check(Verdict::Pass);
        nested.record_successful_reduction();
        nested.observe_granularity(5);
        nested.discarded_checks = 1;

        outer.absorb(&nested);
        outer.absorb(&nested);

        assert_eq!(outer.original_size, 20);
        assert_eq!(outer.checks_performed, 4);
        assert_eq!(outer.verdicts.fail, 2);
        assert_eq!(outer.successful_reductions, 2);
        assert_eq!(outer.discarded_checks, 2);
        assert_eq!(outer.max_granularity, 5);
    }

    #[test]
    fn test_stats_display() {
        let mut stats = ReductionStats::new(4);
        stats.reduced_size = 2;
        stats.record_check(Verdict::Fail);
        stats.record_successful_reduction();
        assert_eq!(
            stats.to_string(),
            "Stats { 2/4 elements kept, 1 checks (1 fail, 0 pass, 0 unresolved), 100.0% success rate }"
        );
    }
}

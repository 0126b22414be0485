//! Round evaluation shared by the reducers.
//!
//! A round is an ordered list of candidates planned before any of them is
//! tested. Candidates are tested in batches of `max_concurrency`; the first
//! FAIL in planned order wins and no later batch is issued. Results of later
//! candidates in the winning batch are counted but discarded.

use futures::future::join_all;
use tracing::{trace, warn};

use deltamin_core::{Configuration, Oracle, Verdict};

use crate::error::{ReduceError, Result};
use crate::result::ReductionStats;
use crate::traits::ReducerConfig;

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoundOutcome {
    /// Position of the adopted candidate, if any failed.
    pub winner: Option<usize>,
    /// Verdicts of the candidates up to and including the winner, in
    /// planned order.
    pub verdicts: Vec<Verdict>,
}

/// Drives an oracle over the candidates of a round.
pub(crate) struct Round<'a, T> {
    oracle: &'a dyn Oracle<Configuration<T>>,
    config: &'a ReducerConfig,
}

impl<'a, T> Round<'a, T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(oracle: &'a dyn Oracle<Configuration<T>>, config: &'a ReducerConfig) -> Self {
        Self { oracle, config }
    }

    /// Test `count` candidates, built on demand by `candidate`, in order.
    pub(crate) async fn run<F>(
        &self,
        count: usize,
        candidate: F,
        stats: &mut ReductionStats,
    ) -> Result<RoundOutcome>
    where
        F: Fn(usize) -> Configuration<T>,
    {
        let width = self.config.max_concurrency.max(1);
        let mut verdicts = Vec::with_capacity(count);
        let mut start = 0;

        while start < count {
            let mut end = (start + width).min(count);
            if let Some(max) = self.config.max_checks {
                let left = max.saturating_sub(stats.checks_performed);
                if left == 0 {
                    warn!(max_checks = max, "Oracle budget exhausted");
                    return Err(ReduceError::BudgetExhausted(max));
                }
                end = end.min(start + left);
            }

            let batch: Vec<Configuration<T>> = (start..end).map(&candidate).collect();
            let results = join_all(batch.iter().map(|c| self.oracle.test(c))).await;

            for (offset, (config, &verdict)) in batch.iter().zip(&results).enumerate() {
                trace!(
                    candidate = start + offset,
                    len = config.len(),
                    %verdict,
                    "Tested candidate"
                );
                stats.record_check(verdict);
            }

            if let Some(pos) = results.iter().position(Verdict::is_fail) {
                stats.discarded_checks += results.len() - pos - 1;
                verdicts.extend_from_slice(&results[..=pos]);
                return Ok(RoundOutcome {
                    winner: Some(start + pos),
                    verdicts,
                });
            }

            verdicts.extend(results);
            start = end;
        }

        Ok(RoundOutcome {
            winner: None,
            verdicts,
        })
    }

    /// Confirm that `config` fails, when the reducer is configured to.
    pub(crate) async fn verify_input(
        &self,
        config: &Configuration<T>,
        stats: &mut ReductionStats,
    ) -> Result<()> {
        if !self.config.verify_input {
            return Ok(());
        }
        let outcome = self.run(1, |_| config.clone(), stats).await?;
        if outcome.winner.is_none() {
            warn!(len = config.len(), "Input does not fail the oracle");
            return Err(ReduceError::NoFailure);
        }
        Ok(())
    }
}

//! Probabilistic delta debugging.
//!
//! ProbDD follows ddmin's control flow but builds its chunks from a relevance
//! model instead of from position. Every element of the input carries a
//! probability of being needed for the failure. Chunks are cut from the
//! current elements ordered by ascending probability, so material that looks
//! irrelevant is proposed for removal first.
//!
//! After each round the model is updated from the verdicts that were used
//! for the decision:
//!
//! - removing a chunk kept the failure: the chunk's probabilities are
//!   multiplied by `damping`;
//! - removing a chunk lost the failure: each probability `p` in the chunk
//!   moves to `p + (1 - p) * boost`;
//! - keeping a chunk alone kept the failure: every removed element is damped.
//!
//! Probabilities are clamped to `[floor, ceiling]`, both strictly inside
//! `(0, 1)`, so no element is ever locked in or out for good.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use deltamin_core::{Configuration, Oracle};

use crate::ddmin::Phase;
use crate::error::{ReduceError, Result};
use crate::result::{Reduction, ReductionStats};
use crate::round::Round;
use crate::traits::{Reducer, ReducerConfig};

/// Tuning of the relevance model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilityConfig {
    /// Initial probability of every element.
    pub prior: f64,

    /// Factor applied to elements whose removal kept the failure.
    pub damping: f64,

    /// Share of the remaining distance to 1 added to elements whose removal
    /// lost the failure.
    pub boost: f64,

    /// Lowest probability an element can reach.
    pub floor: f64,

    /// Highest probability an element can reach.
    pub ceiling: f64,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            prior: 0.5,
            damping: 0.5,
            boost: 0.5,
            floor: 0.01,
            ceiling: 0.99,
        }
    }
}

impl ProbabilityConfig {
    /// Create a new model configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial probability.
    pub fn with_prior(mut self, prior: f64) -> Self {
        self.prior = prior;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    /// Set the clamp interval.
    pub fn with_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor = floor;
        self.ceiling = ceiling;
        self
    }

    /// Check that the bounds are ordered and inside `(0, 1)` and that both
    /// factors lie in `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        let open_unit = |x: f64| x > 0.0 && x < 1.0;
        if !(open_unit(self.floor) && open_unit(self.ceiling)) {
            return Err(ReduceError::InvalidConfig(format!(
                "probability bounds [{}, {}] must lie inside (0, 1)",
                self.floor, self.ceiling
            )));
        }
        if !(self.floor <= self.prior && self.prior <= self.ceiling) {
            return Err(ReduceError::InvalidConfig(format!(
                "prior {} must lie within [{}, {}]",
                self.prior, self.floor, self.ceiling
            )));
        }
        if !open_unit(self.damping) {
            return Err(ReduceError::InvalidConfig(format!(
                "damping {} must lie inside (0, 1)",
                self.damping
            )));
        }
        if !open_unit(self.boost) {
            return Err(ReduceError::InvalidConfig(format!(
                "boost {} must lie inside (0, 1)",
                self.boost
            )));
        }
        Ok(())
    }
}

/// Per-element relevance probabilities of one run, indexed by position in
/// the original input.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceModel {
    probabilities: Vec<f64>,
    config: ProbabilityConfig,
}

impl RelevanceModel {
    /// A model over `len` elements, all at the prior.
    pub fn new(len: usize, config: &ProbabilityConfig) -> Self {
        Self {
            probabilities: vec![config.prior; len],
            config: config.clone(),
        }
    }

    /// Probability of the element at original index `index`.
    pub fn probability(&self, index: usize) -> f64 {
        self.probabilities[index]
    }

    /// All probabilities, by original index.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Returns true if every probability lies within the clamp interval.
    pub fn within_bounds(&self) -> bool {
        self.probabilities
            .iter()
            .all(|&p| p >= self.config.floor && p <= self.config.ceiling)
    }

    /// Positions of `config` ordered by ascending probability; ties keep
    /// positional order.
    fn ranked_positions<T>(&self, config: &Configuration<T>) -> Vec<usize> {
        let indices = config.indices();
        let mut positions: Vec<usize> = (0..indices.len()).collect();
        positions.sort_by(|&a, &b| {
            self.probabilities[indices[a]]
                .total_cmp(&self.probabilities[indices[b]])
                .then(a.cmp(&b))
        });
        positions
    }

    /// Elements whose removal kept the failure.
    pub fn damp(&mut self, indices: impl IntoIterator<Item = usize>) {
        for index in indices {
            let p = self.probabilities[index] * self.config.damping;
            self.probabilities[index] = self.clamp(p);
        }
    }

    /// Elements whose removal lost the failure.
    pub fn boost(&mut self, indices: impl IntoIterator<Item = usize>) {
        for index in indices {
            let p = self.probabilities[index];
            let p = p + (1.0 - p) * self.config.boost;
            self.probabilities[index] = self.clamp(p);
        }
    }

    fn clamp(&self, p: f64) -> f64 {
        p.clamp(self.config.floor, self.config.ceiling)
    }

    fn mean<T>(&self, config: &Configuration<T>) -> f64 {
        if config.is_empty() {
            return 0.0;
        }
        let total: f64 = config.indices().iter().map(|&i| self.probabilities[i]).sum();
        total / config.len() as f64
    }
}

/// Probability-guided variant of ddmin.
#[derive(Debug, Clone, Default)]
pub struct ProbDd {
    config: ReducerConfig,
    probability: ProbabilityConfig,
}

impl ProbDd {
    /// Create a new probabilistic reducer.
    pub fn new(config: ReducerConfig, probability: ProbabilityConfig) -> Self {
        Self {
            config,
            probability,
        }
    }

    /// Create a reducer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ReducerConfig::default(), ProbabilityConfig::default())
    }

    /// The reducer configuration.
    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// The relevance model configuration.
    pub fn probability(&self) -> &ProbabilityConfig {
        &self.probability
    }

    /// Reduce `config` and also return the final relevance model.
    pub async fn reduce_with_model<T>(
        &self,
        config: Configuration<T>,
        oracle: &dyn Oracle<Configuration<T>>,
    ) -> Result<(Reduction<T>, RelevanceModel)>
    where
        T: Send + Sync + 'static,
    {
        self.reduce_observed(config, oracle, |_| {}).await
    }

    /// Like [`reduce_with_model`](Self::reduce_with_model), calling `observe`
    /// with the model after every round of oracle calls.
    pub async fn reduce_observed<T, F>(
        &self,
        config: Configuration<T>,
        oracle: &dyn Oracle<Configuration<T>>,
        mut observe: F,
    ) -> Result<(Reduction<T>, RelevanceModel)>
    where
        T: Send + Sync + 'static,
        F: FnMut(&RelevanceModel) + Send,
    {
        self.config.validate()?;
        self.probability.validate()?;
        let start = Instant::now();
        let original_size = config.len();

        info!(
            original_size,
            reducer = "probdd",
            oracle = oracle.name(),
            prior = self.probability.prior,
            damping = self.probability.damping,
            boost = self.probability.boost,
            "Starting ProbDD reduction"
        );

        let mut stats = ReductionStats::new(original_size);
        let round = Round::new(oracle, &self.config);
        round.verify_input(&config, &mut stats).await?;

        let mut model = RelevanceModel::new(config.input().len(), &self.probability);
        let mut current = config;
        let mut n: usize = 2;
        let mut chunks: Vec<Vec<usize>> = Vec::new();
        let mut phase = Phase::SelectGranularity;

        loop {
            phase = match phase {
                Phase::SelectGranularity => {
                    if current.is_empty() {
                        Phase::Done
                    } else {
                        n = n.min(current.len());
                        chunks = probability_chunks(&model, &current, n);
                        stats.observe_granularity(n);
                        trace!(
                            current_size = current.len(),
                            granularity = n,
                            mean_probability = model.mean(&current),
                            "ProbDD round"
                        );
                        Phase::TryComplements
                    }
                }
                Phase::TryComplements => {
                    let outcome = round
                        .run(
                            chunks.len(),
                            |i| current.remove_positions(&chunks[i]),
                            &mut stats,
                        )
                        .await?;

                    // Candidates before the winner lost the failure.
                    let refused = outcome.winner.unwrap_or(outcome.verdicts.len());
                    for chunk in &chunks[..refused] {
                        model.boost(chunk.iter().map(|&pos| current.indices()[pos]));
                    }
                    if let Some(i) = outcome.winner {
                        model.damp(chunks[i].iter().map(|&pos| current.indices()[pos]));
                    }
                    debug_assert!(model.within_bounds());
                    observe(&model);

                    match outcome.winner {
                        Some(i) => {
                            let next = current.remove_positions(&chunks[i]);
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
                        None if chunks.len() > 2 => Phase::TrySubsets,
                        None => {
                            stats.record_failed_attempt();
                            Phase::GrowGranularity
                        }
                    }
                }
                Phase::TrySubsets => {
                    let outcome = round
                        .run(
                            chunks.len(),
                            |i| current.select(&chunks[i]),
                            &mut stats,
                        )
                        .await?;
                    match outcome.winner {
                        Some(i) => {
                            let next = current.select(&chunks[i]);
                            model.damp(
                                current
                                    .indices()
                                    .iter()
                                    .copied()
                                    .filter(|&index| !next.contains_index(index)),
                            );
                            debug_assert!(model.within_bounds());
                            observe(&model);
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
                            observe(&model);
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

        let reduction = Reduction::finish("probdd", current, stats, start);
        Ok((reduction, model))
    }
}

/// Split `config` into `n` chunks of positions, lowest probability first.
///
/// Chunk sizes follow ddmin (`ceil(len / n)`, last chunk smaller); each
/// chunk's positions are sorted so it can be removed or selected directly.
fn probability_chunks<T>(
    model: &RelevanceModel,
    config: &Configuration<T>,
    n: usize,
) -> Vec<Vec<usize>> {
    let ranked = model.ranked_positions(config);
    config
        .partition(n)
        .into_iter()
        .map(|range| {
            let mut chunk = ranked[range].to_vec();
            chunk.sort_unstable();
            chunk
        })
        .collect()
}

#[async_trait]
impl<T> Reducer<T> for ProbDd
where
    T: Send + Sync + 'static,
{
    async fn reduce(
        &self,
        config: Configuration<T>,
        oracle: &dyn Oracle<Configuration<T>>,
    ) -> Result<Reduction<T>> {
        let (reduction, _) = self.reduce_with_model(config, oracle).await?;
        Ok(reduction)
    }

    fn reducer_config(&self) -> &ReducerConfig {
        &self.config
    }

    fn reconfigured(&self, config: ReducerConfig) -> Box<dyn Reducer<T>> {
        Box::new(ProbDd::new(config, self.probability.clone()))
    }

    fn name(&self) -> &str {
        "probdd"
    }

    fn description(&self) -> &str {
        "Delta debugging with a relevance-probability model guiding chunk order"
    }
}

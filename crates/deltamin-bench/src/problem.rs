//! Synthetic problems with a known minimal answer.
//!
//! A problem is the input `0..size` plus a set of relevant values; its
//! oracle fails exactly when every relevant value is present. That failure
//! is monotone, so the relevant set is the unique 1-minimal answer and a
//! reducer's result can be scored against it.

use async_trait::async_trait;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use deltamin_core::{Configuration, Input, Oracle, Verdict};

/// A reduction problem with its optimal answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticProblem {
    /// Generator that produced the problem.
    pub name: String,
    /// Seed it was produced from.
    pub seed: u64,
    /// The failing input, `0..size`.
    pub input: Vec<u32>,
    /// Values every failing candidate must contain, ascending.
    pub relevant: Vec<u32>,
}

impl SyntheticProblem {
    /// Size of the optimal answer.
    pub fn optimal_size(&self) -> usize {
        self.relevant.len()
    }

    /// The full input as a configuration.
    pub fn configuration(&self) -> Configuration<u32> {
        Configuration::full(Input::new(self.input.clone()).into_shared())
    }

    /// An oracle that fails iff every relevant value is present.
    pub fn oracle(&self) -> ProblemOracle {
        ProblemOracle {
            relevant: self.relevant.clone(),
        }
    }

    /// Returns true if `values` is exactly the optimal answer.
    pub fn is_optimal(&self, values: &[u32]) -> bool {
        values == self.relevant.as_slice()
    }
}

/// Oracle of a [`SyntheticProblem`].
#[derive(Debug, Clone)]
pub struct ProblemOracle {
    relevant: Vec<u32>,
}

#[async_trait]
impl Oracle<Configuration<u32>> for ProblemOracle {
    async fn test(&self, candidate: &Configuration<u32>) -> Verdict {
        let present = candidate
            .iter()
            .filter(|&&v| self.relevant.binary_search(&v).is_ok())
            .count();
        if present == self.relevant.len() {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Produces problems deterministically from a seed.
pub trait ProblemGenerator: Send + Sync {
    /// Generate the problem for `seed`.
    fn generate(&self, seed: u64) -> SyntheticProblem;

    /// Name used in results.
    fn name(&self) -> &str;
}

/// Relevant values spread uniformly over the input.
#[derive(Debug, Clone)]
pub struct ScatteredGenerator {
    size: usize,
    relevant: usize,
}

impl ScatteredGenerator {
    /// `relevant` of `size` values matter; `relevant` is capped at `size`.
    pub fn new(size: usize, relevant: usize) -> Self {
        Self {
            size,
            relevant: relevant.min(size),
        }
    }
}

impl ProblemGenerator for ScatteredGenerator {
    fn generate(&self, seed: u64) -> SyntheticProblem {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut relevant: Vec<u32> = rand::seq::index::sample(&mut rng, self.size, self.relevant)
            .into_iter()
            .map(|i| i as u32)
            .collect();
        relevant.sort_unstable();

        SyntheticProblem {
            name: self.name().to_string(),
            seed,
            input: (0..self.size as u32).collect(),
            relevant,
        }
    }

    fn name(&self) -> &str {
        "scattered"
    }
}

/// Relevant values forming one contiguous run.
#[derive(Debug, Clone)]
pub struct ClusteredGenerator {
    size: usize,
    relevant: usize,
}

impl ClusteredGenerator {
    /// A run of `relevant` of `size` values matters; `relevant` is capped at
    /// `size`.
    pub fn new(size: usize, relevant: usize) -> Self {
        Self {
            size,
            relevant: relevant.min(size),
        }
    }
}

impl ProblemGenerator for ClusteredGenerator {
    fn generate(&self, seed: u64) -> SyntheticProblem {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let start = rng.gen_range(0..=self.size - self.relevant) as u32;

        SyntheticProblem {
            name: self.name().to_string(),
            seed,
            input: (0..self.size as u32).collect(),
            relevant: (start..start + self.relevant as u32).collect(),
        }
    }

    fn name(&self) -> &str {
        "clustered"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_problem() {
        let generator = ScatteredGenerator::new(200, 6);
        assert_eq!(generator.generate(7), generator.generate(7));
        assert_ne!(generator.generate(7).relevant, generator.generate(8).relevant);
    }

    #[test]
    fn test_scattered_shape() {
        let problem = ScatteredGenerator::new(100, 5).generate(1);

        assert_eq!(problem.input.len(), 100);
        assert_eq!(problem.optimal_size(), 5);
        assert!(problem.relevant.windows(2).all(|w| w[0] < w[1]));
        assert!(problem.relevant.iter().all(|&v| v < 100));
    }

    #[test]
    fn test_clustered_is_contiguous() {
        for seed in 0..20 {
            let problem = ClusteredGenerator::new(50, 4).generate(seed);
            assert_eq!(problem.optimal_size(), 4);
            assert!(problem.relevant.windows(2).all(|w| w[1] == w[0] + 1));
            assert!(*problem.relevant.last().unwrap() < 50);
        }
    }

    #[test]
    fn test_relevant_capped_at_size() {
        let problem = ClusteredGenerator::new(3, 10).generate(0);
        assert_eq!(problem.relevant, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_oracle_needs_every_relevant_value() {
        let problem = ScatteredGenerator::new(30, 3).generate(11);
        let oracle = problem.oracle();
        let full = problem.configuration();

        assert_eq!(oracle.test(&full).await, Verdict::Fail);

        let positions: Vec<usize> = problem.relevant.iter().map(|&v| v as usize).collect();
        let exact = full.select(&positions);
        assert_eq!(oracle.test(&exact).await, Verdict::Fail);
        assert!(problem.is_optimal(&exact.materialize()));

        let missing_one = exact.without(0);
        assert_eq!(oracle.test(&missing_one).await, Verdict::Pass);
    }
}

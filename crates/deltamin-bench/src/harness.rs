//! Benchmark harness.
//!
//! Runs every registered reducer, with and without each configured outcome
//! cache, on every problem of every generator for each seed, and scores each
//! run by oracle calls and by whether it found the known minimal answer.

use std::time::Instant;

use tracing::{debug, info, warn};

use deltamin_core::{CacheKind, CachedOracle, Oracle, RecordingOracle};
use deltamin_reducer::Reducer;

use crate::error::{BenchError, Result};
use crate::problem::{ProblemGenerator, SyntheticProblem};
use crate::result::BenchmarkResult;

/// Whether a problem's input fails its own oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemCheck {
    /// Generator that produced the problem.
    pub problem: String,
    /// Seed of the problem.
    pub seed: u64,
    /// True when the full input fails.
    pub fails: bool,
}

/// Reducers × caches × generators × seeds.
pub struct Benchmark {
    reducers: Vec<Box<dyn Reducer<u32>>>,
    caches: Vec<Option<CacheKind>>,
    generators: Vec<Box<dyn ProblemGenerator>>,
    seeds: Vec<u64>,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::new()
    }
}

impl Benchmark {
    /// An empty benchmark over seed 0, without caching.
    pub fn new() -> Self {
        Self {
            reducers: Vec::new(),
            caches: vec![None],
            generators: Vec::new(),
            seeds: vec![0],
        }
    }

    /// Add a reducer.
    pub fn with_reducer<R>(mut self, reducer: R) -> Self
    where
        R: Reducer<u32> + 'static,
    {
        self.reducers.push(Box::new(reducer));
        self
    }

    /// Replace the cache settings every reducer runs under; `None` runs
    /// uncached.
    pub fn with_caches(mut self, caches: impl IntoIterator<Item = Option<CacheKind>>) -> Self {
        self.caches = caches.into_iter().collect();
        self
    }

    /// Add a problem generator.
    pub fn with_generator<G>(mut self, generator: G) -> Self
    where
        G: ProblemGenerator + 'static,
    {
        self.generators.push(Box::new(generator));
        self
    }

    /// Replace the seeds problems are generated from.
    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = u64>) -> Self {
        self.seeds = seeds.into_iter().collect();
        self
    }

    /// Number of runs [`run`](Self::run) will perform.
    pub fn run_count(&self) -> usize {
        self.reducers.len() * self.caches.len() * self.generators.len() * self.seeds.len()
    }

    fn problems(&self) -> impl Iterator<Item = SyntheticProblem> + '_ {
        self.generators.iter().flat_map(move |generator| {
            self.seeds.iter().map(move |&seed| generator.generate(seed))
        })
    }

    /// Test every problem's full input against its oracle, one call each.
    pub async fn validate(&self) -> Vec<ProblemCheck> {
        let mut checks = Vec::with_capacity(self.generators.len() * self.seeds.len());
        for problem in self.problems() {
            let fails = problem
                .oracle()
                .test(&problem.configuration())
                .await
                .is_fail();
            if !fails {
                warn!(problem = %problem.name, seed = problem.seed, "Problem input does not fail");
            }
            checks.push(ProblemCheck {
                problem: problem.name,
                seed: problem.seed,
                fails,
            });
        }
        checks
    }

    /// Run everything.
    ///
    /// Problems are generated once per generator and seed, checked to fail,
    /// and shared by all reducers and caches.
    pub async fn run(&self) -> Result<Vec<BenchmarkResult>> {
        if self.run_count() == 0 {
            return Err(BenchError::InvalidConfig(
                "a benchmark needs at least one reducer, cache setting, generator and seed".into(),
            ));
        }

        let start = Instant::now();
        info!(
            reducers = self.reducers.len(),
            caches = self.caches.len(),
            generators = self.generators.len(),
            seeds = self.seeds.len(),
            runs = self.run_count(),
            "Starting benchmark"
        );

        let mut results = Vec::with_capacity(self.run_count());
        for problem in self.problems() {
            if !problem.oracle().test(&problem.configuration()).await.is_fail() {
                return Err(BenchError::InputPasses {
                    problem: problem.name,
                    seed: problem.seed,
                });
            }
            for reducer in &self.reducers {
                for &cache in &self.caches {
                    results.push(run_problem(reducer.as_ref(), &problem, cache).await?);
                }
            }
        }

        info!(
            runs = results.len(),
            optimal = results.iter().filter(|r| r.optimal).count(),
            duration = ?start.elapsed(),
            "Benchmark complete"
        );
        Ok(results)
    }
}

/// Run one reducer on one problem, optionally behind an outcome cache.
pub async fn run_problem(
    reducer: &dyn Reducer<u32>,
    problem: &SyntheticProblem,
    cache: Option<CacheKind>,
) -> Result<BenchmarkResult> {
    let oracle = RecordingOracle::new(problem.oracle());
    let start = Instant::now();
    let (reduction, cache_hits) = match cache {
        Some(kind) => {
            let cached = CachedOracle::with_kind(&oracle, kind);
            let reduction = reducer.reduce(problem.configuration(), &cached).await?;
            (reduction, cached.hits())
        }
        None => (reducer.reduce(problem.configuration(), &oracle).await?, 0),
    };
    let duration = start.elapsed();

    let values = reduction.configuration.materialize();
    let result = BenchmarkResult {
        problem: problem.name.clone(),
        seed: problem.seed,
        algorithm: reducer.name().to_string(),
        cache,
        input_size: problem.input.len(),
        output_size: values.len(),
        optimal_size: problem.optimal_size(),
        optimal: problem.is_optimal(&values),
        oracle_calls: oracle.calls(),
        cache_hits,
        verdicts: oracle.counts(),
        duration_secs: duration.as_secs_f64(),
    };

    debug!(
        problem = %result.problem,
        seed = result.seed,
        algorithm = %result.algorithm,
        cache = ?result.cache,
        output_size = result.output_size,
        optimal_size = result.optimal_size,
        oracle_calls = result.oracle_calls,
        cache_hits = result.cache_hits,
        "Benchmark run"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltamin_reducer::{DdMin, ProbDd, ReduceError, ReducerConfig, ZipMin};

    use crate::problem::{ClusteredGenerator, ScatteredGenerator};
    use crate::result::summarize;

    /// Needs a value its input never contains.
    struct UnreachableGenerator;

    impl ProblemGenerator for UnreachableGenerator {
        fn generate(&self, seed: u64) -> SyntheticProblem {
            SyntheticProblem {
                name: self.name().to_string(),
                seed,
                input: (0..16).collect(),
                relevant: vec![3, 99],
            }
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    #[tokio::test]
    async fn test_result_size_matches_optimum() {
        let problem = ScatteredGenerator::new(64, 4).generate(3);

        for reducer in [
            Box::new(DdMin::with_defaults()) as Box<dyn Reducer<u32>>,
            Box::new(ZipMin::with_defaults()),
            Box::new(ProbDd::with_defaults()),
        ] {
            let result = run_problem(reducer.as_ref(), &problem, None).await.unwrap();
            assert_eq!(result.output_size, 4, "{}", result.algorithm);
            assert!(result.optimal);
            assert!(result.oracle_calls > 0);
            assert_eq!(result.oracle_calls, result.verdicts.total());
            assert_eq!(result.cache, None);
            assert_eq!(result.cache_hits, 0);
        }
    }

    #[tokio::test]
    async fn test_batch_run() {
        let benchmark = Benchmark::new()
            .with_reducer(DdMin::with_defaults())
            .with_reducer(ZipMin::with_defaults())
            .with_reducer(ProbDd::with_defaults())
            .with_generator(ScatteredGenerator::new(48, 3))
            .with_generator(ClusteredGenerator::new(48, 3))
            .with_seeds(0..3);
        assert_eq!(benchmark.run_count(), 18);

        let results = benchmark.run().await.unwrap();
        assert_eq!(results.len(), 18);
        assert!(results.iter().all(|r| r.optimal && r.output_size == 3));

        let summaries = summarize(&results);
        let names: Vec<&str> = summaries.iter().map(|s| s.algorithm.as_str()).collect();
        assert_eq!(names, vec!["ddmin", "zipmin", "probdd"]);
        assert!(summaries.iter().all(|s| s.runs == 6 && s.optimal_rate == 1.0));
    }

    #[tokio::test]
    async fn test_zipmin_cheaper_on_clustered() {
        let results = Benchmark::new()
            .with_reducer(DdMin::with_defaults())
            .with_reducer(ZipMin::with_defaults())
            .with_generator(ClusteredGenerator::new(1000, 10))
            .with_seeds(0..10)
            .run()
            .await
            .unwrap();
        assert!(results.iter().all(|r| r.optimal));

        let summaries = summarize(&results);
        let ddmin = summaries.iter().find(|s| s.algorithm == "ddmin").unwrap();
        let zipmin = summaries.iter().find(|s| s.algorithm == "zipmin").unwrap();
        assert!(
            zipmin.mean_calls < ddmin.mean_calls,
            "zipmin {} vs ddmin {}",
            zipmin.mean_calls,
            ddmin.mean_calls
        );
    }

    #[tokio::test]
    async fn test_cache_axis() {
        let benchmark = Benchmark::new()
            .with_reducer(DdMin::with_defaults())
            .with_generator(ScatteredGenerator::new(64, 4))
            .with_caches([None, Some(CacheKind::Hash), Some(CacheKind::Trie)])
            .with_seeds(0..2);
        assert_eq!(benchmark.run_count(), 6);

        let results = benchmark.run().await.unwrap();
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.optimal));

        for runs in results.chunks(3) {
            assert_eq!(runs[0].cache, None);
            assert_eq!(runs[1].cache, Some(CacheKind::Hash));
            assert_eq!(runs[2].cache, Some(CacheKind::Trie));
            assert_eq!(runs[0].cache_hits, 0);
            // Cached runs make the same decisions with no more real calls.
            for cached in &runs[1..] {
                assert_eq!(cached.output_size, runs[0].output_size);
                assert_eq!(cached.oracle_calls + cached.cache_hits, runs[0].oracle_calls);
            }
        }

        let summaries = summarize(&results);
        assert_eq!(summaries.len(), 3);
        assert!(summaries.iter().all(|s| s.algorithm == "ddmin" && s.runs == 2));
    }

    #[tokio::test]
    async fn test_validate_flags_passing_input() {
        let benchmark = Benchmark::new()
            .with_reducer(DdMin::with_defaults())
            .with_generator(ScatteredGenerator::new(32, 2))
            .with_generator(UnreachableGenerator)
            .with_seeds(0..2);

        let checks = benchmark.validate().await;
        assert_eq!(checks.len(), 4);
        assert!(checks[..2].iter().all(|c| c.problem == "scattered" && c.fails));
        assert!(checks[2..].iter().all(|c| c.problem == "unreachable" && !c.fails));

        let err = benchmark.run().await.unwrap_err();
        assert!(matches!(
            err,
            BenchError::InputPasses { ref problem, seed: 0 } if problem == "unreachable"
        ));
    }

    #[tokio::test]
    async fn test_generators_produce_failing_inputs() {
        let checks = Benchmark::new()
            .with_generator(ScatteredGenerator::new(100, 5))
            .with_generator(ClusteredGenerator::new(100, 5))
            .with_generator(ClusteredGenerator::new(3, 10))
            .with_seeds(0..5)
            .validate()
            .await;
        assert_eq!(checks.len(), 15);
        assert!(checks.iter().all(|c| c.fails));
    }

    #[tokio::test]
    async fn test_empty_benchmark_rejected() {
        let err = Benchmark::new().run().await.unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));

        let err = Benchmark::new()
            .with_reducer(DdMin::with_defaults())
            .with_generator(ScatteredGenerator::new(8, 1))
            .with_caches(Vec::new())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_budget_error_propagates() {
        let problem = ScatteredGenerator::new(64, 4).generate(0);
        let reducer = DdMin::new(ReducerConfig::new().with_max_checks(3));

        let err = run_problem(&reducer, &problem, None).await.unwrap_err();
        assert!(matches!(
            err,
            BenchError::Reduce(ReduceError::BudgetExhausted(3))
        ));
    }
}

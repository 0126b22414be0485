//! Benchmark results, summaries and JSON persistence.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use deltamin_core::{CacheKind, VerdictCounts};

use crate::error::Result;

/// Outcome of one reducer on one problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Generator that produced the problem.
    pub problem: String,
    /// Seed of the problem.
    pub seed: u64,
    /// Reducer name.
    pub algorithm: String,
    /// Outcome cache the reducer ran behind, if any.
    pub cache: Option<CacheKind>,
    /// Input size.
    pub input_size: usize,
    /// Size of the reducer's result.
    pub output_size: usize,
    /// Size of the known minimal answer.
    pub optimal_size: usize,
    /// Whether the result is exactly the known minimal answer.
    pub optimal: bool,
    /// Calls made to the oracle.
    pub oracle_calls: usize,
    /// Candidates answered by the cache instead.
    pub cache_hits: usize,
    /// Verdicts of those calls.
    pub verdicts: VerdictCounts,
    /// Wall time in seconds.
    pub duration_secs: f64,
}

impl BenchmarkResult {
    /// Fraction of the input removed; 1.0 for an empty input.
    pub fn reduction_ratio(&self) -> f64 {
        if self.input_size == 0 {
            1.0
        } else {
            (self.input_size - self.output_size) as f64 / self.input_size as f64
        }
    }
}

/// Aggregate over every run of one reducer under one cache setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    /// Reducer name.
    pub algorithm: String,
    /// Cache setting of the runs.
    pub cache: Option<CacheKind>,
    /// Number of runs.
    pub runs: usize,
    /// Mean oracle calls per run.
    pub mean_calls: f64,
    /// Fewest oracle calls in a run.
    pub min_calls: usize,
    /// Most oracle calls in a run.
    pub max_calls: usize,
    /// Fraction of runs that found the known minimal answer.
    pub optimal_rate: f64,
    /// Mean reduction ratio.
    pub mean_reduction_ratio: f64,
    /// Mean wall time in seconds.
    pub mean_duration_secs: f64,
}

impl fmt::Display for AlgorithmSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.map_or("none", |kind| kind.as_str());
        write!(
            f,
            "{:<8} cache={:<4} runs={:<4} calls={:.1} [{}..{}] optimal={:.0}% reduced={:.1}%",
            self.algorithm,
            cache,
            self.runs,
            self.mean_calls,
            self.min_calls,
            self.max_calls,
            self.optimal_rate * 100.0,
            self.mean_reduction_ratio * 100.0
        )
    }
}

/// Summarize `results` per algorithm and cache setting, in order of first
/// appearance.
pub fn summarize(results: &[BenchmarkResult]) -> Vec<AlgorithmSummary> {
    let mut groups: Vec<(&str, Option<CacheKind>)> = Vec::new();
    for result in results {
        let key = (result.algorithm.as_str(), result.cache);
        if !groups.contains(&key) {
            groups.push(key);
        }
    }

    groups
        .into_iter()
        .map(|(algorithm, cache)| {
            let runs: Vec<&BenchmarkResult> = results
                .iter()
                .filter(|r| r.algorithm == algorithm && r.cache == cache)
                .collect();
            let n = runs.len() as f64;
            let mean = |value: fn(&BenchmarkResult) -> f64| {
                runs.iter().map(|r| value(r)).sum::<f64>() / n
            };

            AlgorithmSummary {
                algorithm: algorithm.to_string(),
                cache,
                runs: runs.len(),
                mean_calls: mean(|r| r.oracle_calls as f64),
                min_calls: runs.iter().map(|r| r.oracle_calls).min().unwrap_or(0),
                max_calls: runs.iter().map(|r| r.oracle_calls).max().unwrap_or(0),
                optimal_rate: mean(|r| if r.optimal { 1.0 } else { 0.0 }),
                mean_reduction_ratio: mean(BenchmarkResult::reduction_ratio),
                mean_duration_secs: mean(|r| r.duration_secs),
            }
        })
        .collect()
}

/// Write `results` to `path` as pretty-printed JSON.
pub fn write_json(path: impl AsRef<Path>, results: &[BenchmarkResult]) -> Result<()> {
    let json = serde_json::to_vec_pretty(results)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read results written by [`write_json`].
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<BenchmarkResult>> {
    let content = std::fs::read(path)?;
    let results = serde_json::from_slice(&content)?;
    Ok(results)
}

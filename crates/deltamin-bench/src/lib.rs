//! # deltamin-bench
//!
//! Measures reducers on synthetic problems whose minimal answer is known.
//!
//! ## Generators
//!
//! - **ScatteredGenerator**: relevant elements spread uniformly
//! - **ClusteredGenerator**: relevant elements in one contiguous run
//!
//! Every run reports its oracle-call count and whether the reducer found
//! the known answer. [`summarize`] aggregates runs per algorithm and cache
//! setting; results persist as JSON. [`Benchmark::validate`] checks that
//! every problem's input fails before anything is reduced.
//!
//! ## Example
//!
//! ```rust,ignore
//! use deltamin_bench::{summarize, Benchmark, ClusteredGenerator, ScatteredGenerator};
//! use deltamin_reducer::{DdMin, ZipMin};
//!
//! let results = Benchmark::new()
//!     .with_reducer(DdMin::with_defaults())
//!     .with_reducer(ZipMin::with_defaults())
//!     .with_generator(ScatteredGenerator::new(1000, 8))
//!     .with_generator(ClusteredGenerator::new(1000, 8))
//!     .with_seeds(0..10)
//!     .run()
//!     .await?;
//!
//! for summary in summarize(&results) {
//!     println!("{summary}");
//! }
//! ```

pub mod error;
pub mod harness;
pub mod problem;
pub mod result;

pub use error::{BenchError, Result};
pub use harness::{run_problem, Benchmark, ProblemCheck};
pub use problem::{
    ClusteredGenerator, ProblemGenerator, ProblemOracle, ScatteredGenerator, SyntheticProblem,
};
pub use result::{read_json, summarize, write_json, AlgorithmSummary, BenchmarkResult};

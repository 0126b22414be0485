//! # deltamin-reducer
//!
//! Reducers that shrink a failing configuration while preserving the
//! failure, driven by a caller-supplied [`Oracle`].
//!
//! ## Algorithms
//!
//! - **DdMin**: classic ddmin partitioning, 1-minimal results
//! - **ZipMin**: trims both ends first, then falls back to ddmin
//! - **Hdd**: prunes a tree level by level with a flat reducer per level
//! - **ProbDd**: ddmin with chunks ordered by a learned relevance model
//!
//! ## Example
//!
//! ```rust,ignore
//! use deltamin_core::{oracle_fn, Configuration, Input, Verdict};
//! use deltamin_reducer::{DdMin, Reducer, ReducerConfig};
//!
//! let oracle = oracle_fn(|c: &Configuration<u32>| {
//!     if c.iter().any(|&x| x == 7) { Verdict::Fail } else { Verdict::Pass }
//! });
//! let input = Input::new(vec![1, 3, 2, 7, 9]).into_shared();
//!
//! let reduction = DdMin::new(ReducerConfig::default())
//!     .reduce(Configuration::full(input), &oracle)
//!     .await?;
//! assert_eq!(reduction.configuration.materialize(), vec![7]);
//! ```
//!
//! ## Concurrency
//!
//! With `max_concurrency > 1` the candidates of a round are tested in
//! batches. The earliest failing candidate in planned order is adopted, so
//! results match a sequential run; later results of the winning batch are
//! counted as discarded.

pub mod ddmin;
pub mod error;
pub mod hierarchical;
pub mod probdd;
pub mod result;
mod round;
pub mod traits;
pub mod zipmin;

pub use ddmin::DdMin;
pub use error::{ReduceError, Result};
pub use hierarchical::{Hdd, HddConfig, TreeReduction};
pub use probdd::{ProbDd, ProbabilityConfig, RelevanceModel};
pub use result::{Reduction, ReductionStats};
pub use traits::{Reducer, ReducerConfig};
pub use zipmin::ZipMin;

pub use deltamin_core::{Configuration, Input, Oracle, Verdict};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let _config = ReducerConfig::default();
        let _hdd = HddConfig::default();
        let _probability = ProbabilityConfig::default();
        assert_eq!(Reducer::<u8>::name(&ZipMin::with_defaults()), "zipmin");
        assert_eq!(Reducer::<u8>::name(&ProbDd::with_defaults()), "probdd");
    }
}

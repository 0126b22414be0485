//! # deltamin-core
//!
//! The data model shared by every deltamin reducer.
//!
//! - [`Input`]: the original failure-inducing element sequence, optionally in
//!   replaced mode (removal substitutes a filler instead of deleting).
//! - [`Configuration`]: an immutable candidate subset of an input.
//! - [`Verdict`]: FAIL, PASS or UNRESOLVED.
//! - [`Oracle`]: the async pass/fail test reducers drive.
//! - [`Tree`]: an arena tree whose subtrees can be pruned to placeholders,
//!   with [`TreePrinter`] turning it back into raw form.
//!
//! ## Example
//!
//! ```rust
//! use deltamin_core::{Configuration, Input};
//!
//! let input = Input::new(vec![1, 3, 2, 7]).into_shared();
//! let full = Configuration::full(input);
//! let chunks = full.partition(2);
//! let rest = full.complement(chunks[0].clone());
//! assert_eq!(rest.materialize(), vec![2, 7]);
//! ```

pub mod cache;
pub mod configuration;
pub mod error;
pub mod input;
pub mod oracle;
pub mod tree;
pub mod verdict;

pub use cache::{CacheKind, CachedOracle, HashStore, TrieStore, VerdictStore};
pub use configuration::Configuration;
pub use error::PrintError;
pub use input::Input;
pub use oracle::{oracle_fn, FnOracle, Oracle, RecordingOracle};
pub use tree::{ConcatPrinter, FlattenPrinter, Node, NodeId, NodeState, Tree, TreeBuilder, TreePrinter};
pub use verdict::{Verdict, VerdictCounts};

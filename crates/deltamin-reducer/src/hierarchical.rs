//! Hierarchical delta debugging.
//!
//! HDD reduces a tree one depth level at a time, root first. The live nodes
//! of a level become a flat configuration of [`NodeId`]s, which a flat
//! reducer (ddmin unless configured otherwise) shrinks. Removing a node
//! prunes its whole subtree; the oracle sees the printed form of the whole
//! tree with that pruning applied. Passes over all levels repeat until one
//! full pass prunes nothing.
//!
//! The root is never pruned.
//!
//! Each level runs with a copy of the level reducer's configuration that
//! skips input verification (the whole tree was verified once, up front)
//! and whose budget is what the run has left. With a cache configured, each
//! level gets a fresh one: a level's candidates index its own node list.

use std::fmt;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use deltamin_core::{
    CacheKind, CachedOracle, Configuration, Input, NodeId, Oracle, PrintError, Tree, TreePrinter,
    Verdict,
};

use crate::ddmin::DdMin;
use crate::error::{ReduceError, Result};
use crate::result::ReductionStats;
use crate::traits::{Reducer, ReducerConfig};

/// Configuration specific to hierarchical reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HddConfig {
    /// Base reducer configuration, also handed to the default level reducer.
    pub base: ReducerConfig,

    /// Stop after this many top-to-bottom passes even if the last one
    /// pruned something.
    pub max_passes: Option<usize>,

    /// Cache level verdicts in a store of this kind.
    pub cache: Option<CacheKind>,
}

impl Default for HddConfig {
    fn default() -> Self {
        Self {
            base: ReducerConfig::default(),
            max_passes: None,
            cache: None,
        }
    }
}

impl HddConfig {
    /// Create a new hierarchical configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base reducer configuration.
    pub fn with_base(mut self, base: ReducerConfig) -> Self {
        self.base = base;
        self
    }

    /// Limit the number of passes.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes.max(1));
        self
    }

    /// Cache verdicts per level.
    pub fn with_cache(mut self, kind: CacheKind) -> Self {
        self.cache = Some(kind);
        self
    }
}

/// The result of a hierarchical run.
#[derive(Debug, Clone)]
pub struct TreeReduction<T> {
    /// The pruned tree. Its printed form failed the last time it was tested.
    pub tree: Tree<T>,

    /// Statistics; sizes count live nodes.
    pub stats: ReductionStats,

    /// Number of top-to-bottom passes made.
    pub passes: usize,

    /// Candidates answered by the level caches.
    pub cache_hits: usize,
}

/// What one level run produced.
struct LevelOutcome<T> {
    tree: Tree<T>,
    pruned: usize,
    cache_hits: usize,
}

impl<T> TreeReduction<T> {
    /// Live nodes before reduction.
    pub fn original_size(&self) -> usize {
        self.stats.original_size
    }

    /// Live nodes after reduction.
    pub fn reduced_size(&self) -> usize {
        self.stats.reduced_size
    }
}

/// Hierarchical reducer over [`Tree`]s.
pub struct Hdd {
    config: HddConfig,
    level_reducer: Box<dyn Reducer<NodeId>>,
}

impl fmt::Debug for Hdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hdd")
            .field("config", &self.config)
            .field("level_reducer", &self.level_reducer.name())
            .finish()
    }
}

impl Hdd {
    /// Create a hierarchical reducer that runs ddmin on every level.
    pub fn new(config: HddConfig) -> Self {
        let level_reducer = Box::new(DdMin::new(config.base.clone()));
        Self {
            config,
            level_reducer,
        }
    }

    /// Create a reducer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(HddConfig::default())
    }

    /// Reduce each level with `reducer` instead of ddmin.
    pub fn with_level_reducer<R>(mut self, reducer: R) -> Self
    where
        R: Reducer<NodeId> + 'static,
    {
        self.level_reducer = Box::new(reducer);
        self
    }

    /// The reducer configuration.
    pub fn config(&self) -> &HddConfig {
        &self.config
    }

    /// Name of the reducer used per level.
    pub fn level_reducer_name(&self) -> &str {
        self.level_reducer.name()
    }

    /// Reduce `tree`, testing each candidate as printed by `printer`.
    ///
    /// # Errors
    ///
    /// * `ReduceError::Print` - A candidate tree could not be printed. The
    ///   run stops at the first such failure.
    /// * `ReduceError::NoFailure` - Verification is on and the input passes.
    /// * `ReduceError::BudgetExhausted` - The oracle-call budget ran out.
    pub async fn reduce<T, P>(
        &self,
        tree: Tree<T>,
        printer: &P,
        oracle: &dyn Oracle<P::Output>,
    ) -> Result<TreeReduction<T>>
    where
        T: Send + Sync + 'static,
        P: TreePrinter<T>,
    {
        self.config.base.validate()?;
        let start = Instant::now();
        let original_size = tree.live_count();

        info!(
            original_size,
            max_depth = tree.max_depth(),
            level_reducer = self.level_reducer.name(),
            oracle = oracle.name(),
            "Starting hierarchical reduction"
        );

        let mut stats = ReductionStats::new(original_size);
        if self.config.base.verify_input {
            let raw = printer.print(&tree)?;
            let verdict = oracle.test(&raw).await;
            stats.record_check(verdict);
            if !verdict.is_fail() {
                warn!(original_size, "Input tree does not fail the oracle");
                return Err(ReduceError::NoFailure);
            }
        }

        let mut tree = tree;
        let mut passes = 0;
        let mut cache_hits = 0;
        loop {
            passes += 1;
            let mut pruned_this_pass = 0;

            for depth in 1..=tree.max_depth() {
                let level = tree.level(depth);
                if level.is_empty() {
                    trace!(depth, "Level empty, skipping");
                    continue;
                }

                let outcome = self
                    .reduce_level(&tree, &level, printer, oracle, &mut stats)
                    .await?;
                cache_hits += outcome.cache_hits;
                if outcome.pruned > 0 {
                    debug!(
                        depth,
                        level_size = level.len(),
                        pruned = outcome.pruned,
                        live = outcome.tree.live_count(),
                        "Pruned level"
                    );
                    tree = outcome.tree;
                    pruned_this_pass += outcome.pruned;
                }
            }

            debug!(pass = passes, pruned = pruned_this_pass, "HDD pass complete");
            if pruned_this_pass == 0 {
                break;
            }
            if self.config.max_passes.is_some_and(|max| passes >= max) {
                debug!(passes, "Pass limit reached");
                break;
            }
        }

        let duration = start.elapsed();
        stats.reduced_size = tree.live_count();
        stats.duration = Some(duration);

        info!(
            original_size,
            reduced_size = stats.reduced_size,
            passes,
            checks = stats.checks_performed,
            unresolved = stats.verdicts.unresolved,
            cache_hits,
            duration = ?duration,
            "Hierarchical reduction complete"
        );

        Ok(TreeReduction {
            tree,
            stats,
            passes,
            cache_hits,
        })
    }

    /// Configuration for the next level run: no verification of its own and
    /// at most the budget the run has left.
    fn level_config(&self, stats: &ReductionStats) -> Result<ReducerConfig> {
        let mut config = self.level_reducer.reducer_config().clone();
        config.verify_input = false;
        if let Some(max) = self.config.base.max_checks {
            let left = max.saturating_sub(stats.checks_performed);
            if left == 0 {
                warn!(max_checks = max, "Oracle budget exhausted");
                return Err(ReduceError::BudgetExhausted(max));
            }
            config.max_checks = Some(config.max_checks.map_or(left, |own| own.min(left)));
        }
        Ok(config)
    }

    /// Run the level reducer over `level`.
    async fn reduce_level<T, P>(
        &self,
        tree: &Tree<T>,
        level: &[NodeId],
        printer: &P,
        oracle: &dyn Oracle<P::Output>,
        stats: &mut ReductionStats,
    ) -> Result<LevelOutcome<T>>
    where
        T: Send + Sync + 'static,
        P: TreePrinter<T>,
    {
        let level_reducer = self.level_reducer.reconfigured(self.level_config(stats)?);

        let adapter = LevelOracle {
            tree,
            level,
            printer,
            oracle,
            print_error: Mutex::new(None),
        };
        let full = Configuration::full(Input::new(level.to_vec()).into_shared());
        let (outcome, cache_hits) = match self.config.cache {
            Some(kind) => {
                let cached = CachedOracle::with_kind(&adapter, kind);
                let outcome = level_reducer.reduce(full, &cached).await;
                trace!(hits = cached.hits(), misses = cached.misses(), "Level cache");
                (outcome, cached.hits())
            }
            None => (level_reducer.reduce(full, &adapter).await, 0),
        };

        if let Some(err) = adapter.take_error() {
            return Err(err.into());
        }
        let reduction = outcome.map_err(|err| match (err, self.config.base.max_checks) {
            (ReduceError::BudgetExhausted(_), Some(max)) => ReduceError::BudgetExhausted(max),
            (err, _) => err,
        })?;
        stats.absorb(&reduction.stats);

        let kept = &reduction.configuration;
        let removed: Vec<NodeId> = level
            .iter()
            .enumerate()
            .filter(|(pos, _)| !kept.contains_index(*pos))
            .map(|(_, &id)| id)
            .collect();
        Ok(LevelOutcome {
            tree: tree.with_pruned(&removed),
            pruned: removed.len(),
            cache_hits,
        })
    }
}

/// Presents one tree level to a flat reducer.
///
/// A candidate keeps some of the level's nodes; the others are pruned and
/// the resulting tree is printed and handed to the user's oracle.
struct LevelOracle<'a, T, P: TreePrinter<T>> {
    tree: &'a Tree<T>,
    level: &'a [NodeId],
    printer: &'a P,
    oracle: &'a dyn Oracle<P::Output>,
    print_error: Mutex<Option<PrintError>>,
}

impl<T, P: TreePrinter<T>> LevelOracle<'_, T, P> {
    fn has_failed(&self) -> bool {
        self.print_error
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(true)
    }

    fn record_error(&self, err: PrintError) {
        if let Ok(mut slot) = self.print_error.lock() {
            slot.get_or_insert(err);
        }
    }

    fn take_error(&self) -> Option<PrintError> {
        match self.print_error.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

#[async_trait]
impl<'a, T, P> Oracle<Configuration<NodeId>> for LevelOracle<'a, T, P>
where
    T: Send + Sync,
    P: TreePrinter<T>,
{
    async fn test(&self, candidate: &Configuration<NodeId>) -> Verdict {
        // Once printing failed the run is lost; answer without calling the
        // user's oracle so the level reducer winds down quickly.
        if self.has_failed() {
            return Verdict::Unresolved;
        }

        let removed: Vec<NodeId> = self
            .level
            .iter()
            .enumerate()
            .filter(|(pos, _)| !candidate.contains_index(*pos))
            .map(|(_, &id)| id)
            .collect();
        let pruned = self.tree.with_pruned(&removed);

        match self.printer.print(&pruned) {
            Ok(raw) => self.oracle.test(&raw).await,
            Err(err) => {
                warn!(error = %err, removed = removed.len(), "Failed to print candidate tree");
                self.record_error(err);
                Verdict::Unresolved
            }
        }
    }

    fn name(&self) -> &str {
        self.oracle.name()
    }
}

//! Debugger adapters.
//!
//! A [`Debugger`] turns a concrete input (text, a list, bytes, the lines or
//! bytes of a file, or a tree) into a configuration, runs the configured
//! reducer against a caller-supplied oracle over the raw form, and converts
//! the result back. Oracles always see materialized candidates, never
//! configurations.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info};

use deltamin_core::{
    CachedOracle, Configuration, Input, Oracle, RecordingOracle, Tree, TreePrinter, Verdict,
    VerdictCounts,
};
use deltamin_reducer::{DdMin, Hdd, ProbDd, Reducer, ReductionStats, ZipMin};

use crate::config::{Algorithm, DebuggerConfig};
use crate::error::{DebugError, Result};
use crate::parser::TreeParser;

/// Filler used for removed lines in replaced mode.
const FILLER_LINE: &str = "\n";

/// How a file is split into elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// One element per byte.
    Binary,
    /// One element per line, newline included.
    Text,
}

/// Outcome of a debugger run.
#[derive(Debug, Clone)]
pub struct DebugReport<O> {
    /// The reduced input in raw form.
    pub output: O,

    /// Reducer that produced it.
    pub algorithm: Algorithm,

    /// Number of elements (or live tree nodes) in the input.
    pub input_len: usize,

    /// Number of elements (or live tree nodes) retained. In replaced mode
    /// the raw output keeps the input length; this counts what was kept.
    pub output_len: usize,

    /// Reducer statistics.
    pub stats: ReductionStats,

    /// Verdicts of the calls that reached the caller's oracle.
    pub verdicts: VerdictCounts,

    /// Candidates answered by the outcome cache.
    pub cache_hits: usize,

    /// Wall time of the run.
    pub duration: Duration,
}

impl<O> DebugReport<O> {
    /// Calls that reached the caller's oracle.
    pub fn oracle_calls(&self) -> usize {
        self.verdicts.total()
    }

    /// Fraction of the input removed; 1.0 for an empty input.
    pub fn reduction_ratio(&self) -> f64 {
        if self.input_len == 0 {
            1.0
        } else {
            (self.input_len - self.output_len) as f64 / self.input_len as f64
        }
    }
}

impl<O> fmt::Display for DebugReport<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({:.1}% removed), {} oracle calls [{}]",
            self.algorithm,
            self.input_len,
            self.output_len,
            self.reduction_ratio() * 100.0,
            self.oracle_calls(),
            self.verdicts
        )?;
        if self.cache_hits > 0 {
            write!(f, ", {} cache hits", self.cache_hits)?;
        }
        Ok(())
    }
}

/// Presents a caller's oracle over raw values as an oracle over
/// configurations.
struct RawOracle<'a, T, R: ?Sized + ToOwned + Sync> {
    oracle: &'a dyn Oracle<R>,
    render: fn(&Configuration<T>) -> R::Owned,
}

#[async_trait]
impl<'a, T, R> Oracle<Configuration<T>> for RawOracle<'a, T, R>
where
    T: Send + Sync,
    R: ?Sized + ToOwned + Sync,
    R::Owned: Send,
{
    async fn test(&self, candidate: &Configuration<T>) -> Verdict {
        let owned = (self.render)(candidate);
        let raw: &R = owned.borrow();
        self.oracle.test(raw).await
    }

    fn name(&self) -> &str {
        self.oracle.name()
    }
}

fn render_list<T: Clone>(config: &Configuration<T>) -> Vec<T> {
    config.materialize()
}

fn render_text(config: &Configuration<char>) -> String {
    config.materialize().into_iter().collect()
}

fn render_lines(config: &Configuration<String>) -> String {
    config.materialize().concat()
}

fn render_line_bytes(config: &Configuration<String>) -> Vec<u8> {
    render_lines(config).into_bytes()
}

/// Runs reducers over concrete inputs.
#[derive(Debug, Clone, Default)]
pub struct Debugger {
    config: DebuggerConfig,
}

impl Debugger {
    /// Create a debugger, validating `config`.
    pub fn new(config: DebuggerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a debugger with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: DebuggerConfig::default(),
        }
    }

    /// The debugger configuration.
    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    fn flat_reducer<T>(&self, algorithm: Algorithm) -> Result<Box<dyn Reducer<T>>>
    where
        T: Send + Sync + 'static,
    {
        let base = self.config.reducer.clone();
        match algorithm {
            Algorithm::DdMin => Ok(Box::new(DdMin::new(base))),
            Algorithm::ZipMin => Ok(Box::new(ZipMin::new(base))),
            Algorithm::ProbDd => Ok(Box::new(ProbDd::new(
                base,
                self.config.probability.clone(),
            ))),
            Algorithm::Hdd => Err(DebugError::Unsupported(
                "hdd reduces trees; use reduce_tree or reduce_structured".into(),
            )),
        }
    }

    fn hdd(&self) -> Result<Hdd> {
        let hdd = Hdd::new(self.config.hdd_config());
        let base = self.config.reducer.clone();
        match self.config.level_algorithm {
            Algorithm::DdMin => Ok(hdd),
            Algorithm::ZipMin => Ok(hdd.with_level_reducer(ZipMin::new(base))),
            Algorithm::ProbDd => Ok(hdd.with_level_reducer(ProbDd::new(
                base,
                self.config.probability.clone(),
            ))),
            Algorithm::Hdd => Err(DebugError::InvalidConfig(
                "level_algorithm must be a flat reducer".into(),
            )),
        }
    }

    /// Reduce a flat input, rendering candidates with `render`.
    async fn run_flat<T, R>(
        &self,
        input: Input<T>,
        render: fn(&Configuration<T>) -> R::Owned,
        oracle: &dyn Oracle<R>,
    ) -> Result<DebugReport<R::Owned>>
    where
        T: Send + Sync + 'static,
        R: ?Sized + ToOwned + Sync,
        R::Owned: Send,
    {
        let reducer = self.flat_reducer::<T>(self.config.algorithm)?;
        let start = Instant::now();
        let input_len = input.len();

        info!(
            algorithm = %self.config.algorithm,
            input_len,
            replaced = input.is_replaced(),
            cache = self.config.cache,
            cache_kind = %self.config.cache_kind,
            oracle = oracle.name(),
            "Starting debugger run"
        );

        let recording = RecordingOracle::new(RawOracle { oracle, render });
        let full = Configuration::full(input.into_shared());
        let (reduction, cache_hits) = if self.config.cache {
            let cached = CachedOracle::with_kind(&recording, self.config.cache_kind);
            let reduction = reducer.reduce(full, &cached).await?;
            debug!(
                hits = cached.hits(),
                misses = cached.misses(),
                "Outcome cache"
            );
            (reduction, cached.hits())
        } else {
            (reducer.reduce(full, &recording).await?, 0)
        };

        let report = DebugReport {
            output: render(&reduction.configuration),
            algorithm: self.config.algorithm,
            input_len,
            output_len: reduction.reduced_size(),
            stats: reduction.stats,
            verdicts: recording.counts(),
            cache_hits,
            duration: start.elapsed(),
        };
        info!(
            input_len,
            output_len = report.output_len,
            oracle_calls = report.oracle_calls(),
            cache_hits,
            duration = ?report.duration,
            "Debugger run complete"
        );
        Ok(report)
    }

    /// Reduce a list of items.
    ///
    /// In replaced mode `filler` takes the place of removed items and must
    /// be given.
    pub async fn reduce_list<T>(
        &self,
        items: Vec<T>,
        filler: Option<T>,
        oracle: &dyn Oracle<[T]>,
    ) -> Result<DebugReport<Vec<T>>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let input = match (self.config.replaced, filler) {
            (true, Some(filler)) => Input::replaced(items, filler),
            (true, None) => {
                return Err(DebugError::Unsupported(
                    "replaced mode needs a filler item".into(),
                ));
            }
            (false, _) => Input::new(items),
        };
        self.run_flat(input, render_list::<T>, oracle).await
    }

    /// Reduce a string character by character.
    pub async fn reduce_text(
        &self,
        text: &str,
        oracle: &dyn Oracle<str>,
    ) -> Result<DebugReport<String>> {
        let chars: Vec<char> = text.chars().collect();
        let input = if self.config.replaced {
            Input::replaced(chars, self.config.filler_char)
        } else {
            Input::new(chars)
        };
        self.run_flat(input, render_text, oracle).await
    }

    /// Reduce a string line by line. Lines keep their newline.
    pub async fn reduce_lines(
        &self,
        text: &str,
        oracle: &dyn Oracle<str>,
    ) -> Result<DebugReport<String>> {
        let input = self.line_input(text);
        self.run_flat(input, render_lines, oracle).await
    }

    /// Reduce a byte buffer byte by byte.
    pub async fn reduce_bytes(
        &self,
        bytes: Vec<u8>,
        oracle: &dyn Oracle<[u8]>,
    ) -> Result<DebugReport<Vec<u8>>> {
        let input = if self.config.replaced {
            Input::replaced(bytes, self.config.filler_byte)
        } else {
            Input::new(bytes)
        };
        self.run_flat(input, render_list::<u8>, oracle).await
    }

    /// Reduce the contents of the file at `path`.
    ///
    /// The oracle sees candidate file contents. When an output path is
    /// configured the reduced contents are written there.
    pub async fn reduce_file(
        &self,
        path: impl AsRef<Path>,
        kind: FileKind,
        oracle: &dyn Oracle<[u8]>,
    ) -> Result<DebugReport<Vec<u8>>> {
        let path = path.as_ref();
        debug!(path = %path.display(), kind = ?kind, "Reading input file");

        let report = match kind {
            FileKind::Binary => {
                let bytes = tokio::fs::read(path).await?;
                self.reduce_bytes(bytes, oracle).await?
            }
            FileKind::Text => {
                let text = tokio::fs::read_to_string(path).await?;
                let input = self.line_input(&text);
                self.run_flat(input, render_line_bytes, oracle).await?
            }
        };

        if let Some(output) = &self.config.output_path {
            tokio::fs::write(output, &report.output).await?;
            info!(
                path = %output.display(),
                bytes = report.output.len(),
                "Wrote reduced file"
            );
        }
        Ok(report)
    }

    fn line_input(&self, text: &str) -> Input<String> {
        let lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        if self.config.replaced {
            Input::replaced(lines, FILLER_LINE.to_string())
        } else {
            Input::new(lines)
        }
    }

    /// Reduce a tree with HDD, testing candidates as printed by `printer`.
    ///
    /// Always uses HDD, whatever flat algorithm is configured; the
    /// configured level algorithm reduces each level. With caching on, each
    /// level gets a fresh outcome cache.
    pub async fn reduce_tree<T, P>(
        &self,
        tree: Tree<T>,
        printer: &P,
        oracle: &dyn Oracle<P::Output>,
    ) -> Result<DebugReport<P::Output>>
    where
        T: Send + Sync + 'static,
        P: TreePrinter<T>,
    {
        let hdd = self.hdd()?;
        let start = Instant::now();
        let input_len = tree.live_count();

        info!(
            input_len,
            level_algorithm = %self.config.level_algorithm,
            oracle = oracle.name(),
            "Starting tree debugger run"
        );

        let recording = RecordingOracle::new(oracle);
        let reduction = hdd.reduce(tree, printer, &recording).await?;
        let output = printer
            .print(&reduction.tree)
            .map_err(deltamin_reducer::ReduceError::from)?;

        let report = DebugReport {
            output,
            algorithm: Algorithm::Hdd,
            input_len,
            output_len: reduction.reduced_size(),
            stats: reduction.stats,
            verdicts: recording.counts(),
            cache_hits: reduction.cache_hits,
            duration: start.elapsed(),
        };
        info!(
            input_len,
            output_len = report.output_len,
            passes = reduction.passes,
            oracle_calls = report.oracle_calls(),
            cache_hits = report.cache_hits,
            duration = ?report.duration,
            "Tree debugger run complete"
        );
        Ok(report)
    }

    /// Parse `raw` with `parser` and reduce the resulting tree.
    pub async fn reduce_structured<T, Q, P>(
        &self,
        raw: &str,
        parser: &Q,
        printer: &P,
        oracle: &dyn Oracle<P::Output>,
    ) -> Result<DebugReport<P::Output>>
    where
        T: Send + Sync + 'static,
        Q: TreeParser<T>,
        P: TreePrinter<T>,
    {
        let tree = parser.parse(raw)?;
        self.reduce_tree(tree, printer, oracle).await
    }
}

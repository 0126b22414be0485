//! Debugger configuration.
//!
//! Everything a debugger run needs besides the input and the oracle:
//! which reducer to use, replaced mode, outcome caching, where to write a
//! reduced file, and logging. Loadable from TOML; every field has a default.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use deltamin_core::CacheKind;
use deltamin_reducer::{HddConfig, ProbabilityConfig, ReducerConfig};

use crate::error::{DebugError, Result};

/// Reducer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Classic ddmin.
    #[default]
    DdMin,
    /// Boundary trimming with ddmin fallback.
    ZipMin,
    /// Level-wise tree reduction; needs a parser and printer.
    Hdd,
    /// ddmin with probability-ordered chunks.
    ProbDd,
}

impl Algorithm {
    /// All selectable algorithms.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::DdMin,
        Algorithm::ZipMin,
        Algorithm::Hdd,
        Algorithm::ProbDd,
    ];

    /// Returns true if the algorithm works on flat sequences.
    pub fn is_flat(&self) -> bool {
        !matches!(self, Algorithm::Hdd)
    }

    /// The name used in configuration files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::DdMin => "ddmin",
            Algorithm::ZipMin => "zipmin",
            Algorithm::Hdd => "hdd",
            Algorithm::ProbDd => "probdd",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debugger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Reducer to run.
    pub algorithm: Algorithm,

    /// Flat reducer HDD runs on each tree level.
    pub level_algorithm: Algorithm,

    /// Substitute a filler for removed elements instead of deleting them.
    pub replaced: bool,

    /// Filler for byte inputs in replaced mode.
    pub filler_byte: u8,

    /// Filler for character inputs in replaced mode.
    pub filler_char: char,

    /// Answer repeated candidates from an outcome cache.
    pub cache: bool,

    /// Store behind the outcome cache.
    pub cache_kind: CacheKind,

    /// Where file reduction writes its result, if anywhere.
    pub output_path: Option<PathBuf>,

    /// Settings shared by every reducer.
    pub reducer: ReducerConfig,

    /// Pass limit for HDD.
    pub max_passes: Option<usize>,

    /// ProbDD model parameters.
    pub probability: ProbabilityConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::DdMin,
            level_algorithm: Algorithm::DdMin,
            replaced: false,
            filler_byte: 0,
            filler_char: ' ',
            cache: false,
            cache_kind: CacheKind::Hash,
            output_path: None,
            reducer: ReducerConfig::default(),
            max_passes: None,
            probability: ProbabilityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (pretty, json, compact).
    pub format: String,

    /// Whether to include the event target in each line.
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            include_targets: true,
        }
    }
}

impl DebuggerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Select the reducer.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Select the reducer HDD uses per level.
    pub fn with_level_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.level_algorithm = algorithm;
        self
    }

    /// Enable or disable replaced mode.
    pub fn with_replaced(mut self, replaced: bool) -> Self {
        self.replaced = replaced;
        self
    }

    /// Set the filler byte used in replaced mode.
    pub fn with_filler_byte(mut self, filler: u8) -> Self {
        self.filler_byte = filler;
        self
    }

    /// Set the filler character used in replaced mode.
    pub fn with_filler_char(mut self, filler: char) -> Self {
        self.filler_char = filler;
        self
    }

    /// Enable or disable the outcome cache.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Choose the store behind the outcome cache.
    pub fn with_cache_kind(mut self, kind: CacheKind) -> Self {
        self.cache_kind = kind;
        self
    }

    /// Write reduced files to `path`.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the shared reducer configuration.
    pub fn with_reducer(mut self, reducer: ReducerConfig) -> Self {
        self.reducer = reducer;
        self
    }

    /// Set the ProbDD model parameters.
    pub fn with_probability(mut self, probability: ProbabilityConfig) -> Self {
        self.probability = probability;
        self
    }

    /// Configuration handed to HDD.
    pub fn hdd_config(&self) -> HddConfig {
        let mut config = HddConfig::new().with_base(self.reducer.clone());
        if self.cache {
            config = config.with_cache(self.cache_kind);
        }
        match self.max_passes {
            Some(passes) => config.with_max_passes(passes),
            None => config,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(DebugError::InvalidConfig(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        // Validate log format
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(DebugError::InvalidConfig(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }

        if !self.level_algorithm.is_flat() {
            return Err(DebugError::InvalidConfig(
                "level_algorithm must be a flat reducer".into(),
            ));
        }
        if self.max_passes == Some(0) {
            return Err(DebugError::InvalidConfig(
                "max_passes must be at least 1 when set".into(),
            ));
        }

        self.reducer.validate()?;
        self.probability.validate()?;
        Ok(())
    }
}

//! # deltamin-debugger
//!
//! Adapters that run deltamin reducers on concrete inputs.
//!
//! ## Inputs
//!
//! - **Text**: reduced character by character, or line by line
//! - **Lists**: any `Clone` item type
//! - **Bytes and files**: binary files per byte, text files per line
//! - **Trees**: reduced with HDD, either built by the caller or parsed from
//!   text with a [`TreeParser`] such as [`DelimiterParser`]
//!
//! Every input kind supports replaced mode, where removed elements are
//! overwritten by a filler instead of deleted.
//!
//! ## Example
//!
//! ```rust,ignore
//! use deltamin_core::{oracle_fn, Verdict};
//! use deltamin_debugger::{Algorithm, Debugger, DebuggerConfig};
//!
//! let oracle = oracle_fn(|text: &str| {
//!     if text.contains("<b>") { Verdict::Fail } else { Verdict::Pass }
//! });
//! let debugger = Debugger::new(DebuggerConfig::new().with_algorithm(Algorithm::ZipMin))?;
//!
//! let report = debugger.reduce_text("some <i>text</i> <b> here", &oracle).await?;
//! assert_eq!(report.output, "<b>");
//! println!("{report}");
//! ```

pub mod config;
pub mod debugger;
pub mod error;
pub mod logging;
pub mod parser;

pub use config::{Algorithm, DebuggerConfig, LoggingConfig};
pub use debugger::{DebugReport, Debugger, FileKind};
pub use error::{DebugError, Result};
pub use logging::init_tracing;
pub use parser::{DelimiterParser, Fragment, FragmentPrinter, TreeParser};

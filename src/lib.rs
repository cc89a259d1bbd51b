//! Utility-first CSS generation: scan sources for class tokens, resolve a
//! theme, run the plugin pipeline and emit only the rules that are used.
//!
//! ```no_run
//! use stylesmith::{compile, config};
//!
//! let config = config::load(std::path::Path::new("stylesmith.toml"))?;
//! let output = compile(&config, ".")?;
//! std::fs::write("dist/app.css", output.css.as_str())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assembler;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod plugin;
pub mod scanner;
pub mod theme;

pub use assembler::{CssOutput, EmittedRule, Stylesheet};
pub use cancel::{CancellationToken, Cancelled};
pub use config::{Config, DarkMode, PluginRef};
pub use engine::{compile, BuildOutput, Engine};
pub use error::{ConfigError, EngineError, PluginError, ScanError, ScanWarning};
pub use plugin::pipeline::RuleIndex;
pub use plugin::{Plugin, PluginContext, RuleBody, UtilityTemplate};
pub use scanner::{CandidateToken, Corpus, ScanOptions};
pub use theme::{ThemeConfig, ThemeTable, ThemeValue, TokenMap};

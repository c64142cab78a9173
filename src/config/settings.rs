//! Settings sections of the engine configuration
//!
//! # Main Types
//!
//! - [`ExecutionSettings`] - Defaults applied to new graphs
//! - [`LoggingSettings`] - Tracing filter and output

use crate::deferred::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default tracing filter directive
pub const DEFAULT_LOG_FILTER: &str = "info,lazypipe_rs=debug";

/// Execution defaults for new graphs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Mode a new graph starts in
    pub default_mode: ExecutionMode,

    /// Emit a trace event with the elapsed time of every executed node
    pub trace_node_timings: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, overridden by `RUST_LOG` when set
    pub filter: String,

    /// Optional log file; logs go to stderr when unset
    pub file: Option<PathBuf>,

    /// Colored output (ignored for file output)
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            file: None,
            ansi: true,
        }
    }
}

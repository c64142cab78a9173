//! Error handling for lazypipe-rs
//!
//! This module defines the error taxonomy shared by graph construction,
//! deferred dispatch and pipeline execution, plus a Result alias for use
//! throughout the crate.

use crate::pipeline::id::NodeId;
use crate::validator::ValidationError;
use thiserror::Error;

/// Boxed failure raised by a node's operation.
pub type NodeFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Violations of the deferred-dispatch contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// A deferred call in deferred mode received no node argument.
    #[error(
        "`{function}` found no node among its positional arguments; \
         call it inside an instant execution scope to run it directly"
    )]
    NoGraphArgument { function: String },

    /// A node handle showed up where only concrete values can be used.
    #[error("`{function}` received node {node}, whose value cannot be resolved outside a pipeline")]
    UnresolvedNode { function: String, node: NodeId },
}

/// Main error type for lazypipe-rs operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid graph, pipeline or validator configuration
    #[error("Construction error: {0}")]
    Construction(String),

    /// Pipeline invoked with the wrong number of inputs
    #[error("Pipeline takes {expected} positional argument(s), but {given} were provided")]
    Arity { expected: usize, given: usize },

    /// A node's operation failed while the pipeline was running
    #[error("Node {node} ({name}) failed: {source}")]
    Execution {
        node: NodeId,
        name: String,
        #[source]
        source: NodeFailure,
    },

    /// A validator rejected an output value
    #[error("Validation of output {output_index} failed at validator #{position}: {source}")]
    Validation {
        output_index: usize,
        position: usize,
        #[source]
        source: ValidationError,
    },

    /// Deferred call made against the dispatch contract
    #[error("Contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// Iteration requested on a node whose item count is unknown
    #[error("Node {0} cannot be iterated before unwrap(n) records its length")]
    NotUnwrapped(NodeId),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a construction error from a Rhai parse error
    pub fn from_rhai_parse(err: rhai::ParseError) -> Self {
        PipelineError::Construction(format!("script failed to compile: {err}"))
    }

    /// Strip any context wrappers and return the underlying error.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

/// Result type alias for lazypipe-rs operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

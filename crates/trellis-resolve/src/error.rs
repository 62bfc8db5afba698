//! Resolution errors and diagnostics
//!
//! Nothing here is fatal to a resolution pass. Errors are recorded as
//! diagnostics against the instance that caused them and the pass moves on
//! to the next sibling.

use trellis_data::DataError;
use trellis_tree::{InstanceId, TreeError};

/// Result type for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Resolution error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    // Malformed child
    #[error("textBoard must be an array, found {found}")]
    MalformedTextBoard { found: String },

    #[error("textBoard segment {index} is neither a break nor an object")]
    MalformedSegment { index: usize },

    #[error("{kind} has no iteratorVar")]
    MissingIteratorVar { kind: String },

    #[error("page has no path")]
    MissingPagePath,

    #[error("page '{path}' nested deeper than {max} pages")]
    PageDepthExceeded { path: String, max: usize },

    #[error("invalid {axis} for page '{path}': {source}")]
    InvalidViewport {
        path: String,
        axis: &'static str,
        source: DataError,
    },

    // Missing data
    #[error("page '{path}' not found")]
    PageNotFound { path: String },

    #[error("no value for dataKey '{key}'")]
    MissingData { key: String },

    #[error("list source '{key}' not found")]
    MissingListSource { key: String },

    #[error("list has no blueprint child")]
    MissingBlueprint,

    // Conflicting fields
    #[error("label has both text and textBoard; text wins")]
    ConflictingText,

    // List reconciliation
    #[error("data-removed: record is not bound to any item")]
    RecordNotFound,

    #[error("data-{op} index {index} out of range ({len} items)")]
    IndexOutOfRange { op: &'static str, index: usize, len: usize },

    #[error("no list binder for instance {0}")]
    UnknownList(InstanceId),

    #[error("event {0} is not a list data event")]
    NotADataEvent(&'static str),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl ResolveError {
    /// How loudly this error is reported
    pub fn severity(&self) -> Severity {
        match self {
            ResolveError::PageNotFound { .. } => Severity::Info,
            ResolveError::Tree(_) | ResolveError::UnknownList(_) => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

/// Recorded problem from a resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Instance the problem was found on, when one exists
    pub instance: Option<InstanceId>,
    pub error: ResolveError,
}

impl Diagnostic {
    pub fn new(instance: Option<InstanceId>, error: ResolveError) -> Self {
        Self {
            severity: error.severity(),
            instance,
            error,
        }
    }

    /// Emit through `tracing` at the matching level
    pub(crate) fn log(&self) {
        let instance = self.instance.map(|id| id.to_string()).unwrap_or_default();
        match self.severity {
            Severity::Info => tracing::info!(%instance, "{}", self.error),
            Severity::Warning => tracing::warn!(%instance, "{}", self.error),
            Severity::Error => tracing::error!(%instance, "{}", self.error),
        }
    }
}

//! Trellis Data - Bound data primitives
//!
//! Records shared between the data store and the instance tree, dot-path
//! access into JSON values, and viewport geometry.

mod path;
mod record;
mod viewport;

pub use path::DataPath;
pub use record::Record;
pub use viewport::{parse_px, Axis, Viewport};

/// Re-export of the value type records wrap
pub use serde_json::Value;

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

/// Data access errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("empty data path")]
    EmptyPath,

    #[error("empty segment in data path '{path}'")]
    EmptySegment { path: String },

    #[error("cannot descend into scalar at segment '{segment}'")]
    NotAContainer { segment: String },

    #[error("array index {index} out of bounds at segment '{segment}'")]
    IndexOutOfBounds { segment: String, index: usize },

    #[error("invalid pixel length: {raw}")]
    InvalidLength { raw: String },
}

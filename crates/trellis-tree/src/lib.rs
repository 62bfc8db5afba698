//! Trellis Tree - Descriptors and live instances
//!
//! Immutable component descriptors and the arena-backed tree of mutable
//! component instances built from them.

mod cache;
mod descriptor;
mod events;
mod instance;
mod tree;

pub use cache::{InstanceCache, InstanceRegistry};
pub use descriptor::{ComponentKind, Descriptor, ListSource, Style};
pub use events::{EventKind, Handler, InstanceEvent};
pub use instance::{Instance, PagePhase, PageSlot, PropValue};
pub use tree::InstanceTree;

use std::fmt;

/// Instance identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub(crate) u32);

impl InstanceId {
    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Tree operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("instance {0} not found")]
    NotFound(InstanceId),

    #[error("instance {child} is not a child of {parent}")]
    NotAChild { parent: InstanceId, child: InstanceId },

    #[error("cannot insert {child} under its own descendant {parent}")]
    HierarchyRequest { parent: InstanceId, child: InstanceId },

    #[error("child index {index} out of range for {parent} ({len} children)")]
    IndexOutOfRange { parent: InstanceId, index: usize, len: usize },
}

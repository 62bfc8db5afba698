//! Trellis Resolve - Descriptor tree to live instance tree
//!
//! Turns declarative component descriptors plus a data store into a live
//! instance tree, then keeps list-bound subtrees in sync as records are
//! added, updated and removed.
//!
//! # Example
//! ```rust,ignore
//! use trellis_resolve::{ConsumerContext, MemoryStore, Resolver, ResolverConfig};
//!
//! let mut resolver = Resolver::new(ResolverConfig::default());
//! let root = resolver.resolve(&mut tree, descriptor, None, &cx)?;
//! resolver.run_deferred(&mut tree); // announces resolved pages
//! ```

mod blueprint;
mod color;
mod config;
mod context;
mod error;
mod list;
mod lookup;
mod page;
mod resolver;
mod scheduler;
mod scroll;
mod store;
mod text;

pub use blueprint::extract_blueprint;
pub use color::{ColorFormatter, CssColor};
pub use config::{IndexPolicy, ResolverConfig};
pub use context::{ConsumerContext, ListScope, PageScope};
pub use error::{Diagnostic, ResolveError, ResolveResult, Severity};
pub use list::{reconcile, ListDiff, ListPatch, RecordMatch};
pub use lookup::{lookup, Origin, Resolved};
pub use page::page_viewport;
pub use resolver::{Reconciled, Resolver};
pub use scheduler::{DeferredQueue, DeferredTask};
pub use store::{DataStore, MemoryStore, PageSpec};

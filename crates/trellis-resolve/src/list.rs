//! List Binder
//!
//! Keeps a list instance's items in step with its bound records.
//!
//! [`reconcile`] is the pure planning step: given the records currently
//! bound (in item order) and one incoming change, it decides which single
//! tree operation to perform. The resolver applies the plan, so list
//! behavior can be tested without building any instances.
//!
//! # Invariants
//! - Items and bound records have the same length and order between events
//! - A removal touches exactly the one item bound to the removed record
//! - An update never creates or destroys an item

use std::rc::Rc;

use trellis_data::Record;
use trellis_tree::{Descriptor, EventKind, InstanceEvent, InstanceId};

use crate::context::ListScope;
use crate::{ConsumerContext, IndexPolicy, ResolveError, ResolveResult};

/// Incoming change to a list's records
#[derive(Debug, Clone)]
pub enum ListDiff {
    Added { index: usize, record: Record },
    Updated { index: usize, record: Record },
    Removed { record: Record },
}

impl ListDiff {
    /// Decode a `data-*` event
    pub fn from_event(event: &InstanceEvent) -> ResolveResult<Self> {
        let diff = match (event.kind, event.index, event.record.clone()) {
            (EventKind::DataAdded, Some(index), Some(record)) => ListDiff::Added { index, record },
            (EventKind::DataUpdated, Some(index), Some(record)) => ListDiff::Updated { index, record },
            (EventKind::DataRemoved, _, Some(record)) => ListDiff::Removed { record },
            (kind, _, _) => return Err(ResolveError::NotADataEvent(kind.as_str())),
        };
        Ok(diff)
    }

    /// Encode as the `data-*` event for `list`
    pub fn to_event(&self, list: InstanceId) -> InstanceEvent {
        match self {
            ListDiff::Added { index, record } => InstanceEvent::data_added(list, *index, record.clone()),
            ListDiff::Updated { index, record } => InstanceEvent::data_updated(list, *index, record.clone()),
            ListDiff::Removed { record } => InstanceEvent::data_removed(list, record.clone()),
        }
    }
}

/// Planned tree operation
#[derive(Debug, Clone)]
pub enum ListPatch {
    /// Stamp a new item at `index`
    Insert { index: usize, record: Record },
    /// Swap the record bound to the item at `index`
    Rebind { index: usize, record: Record },
    /// Tear down the item at `index`
    Detach { index: usize, record: Record },
}

/// How a removal finds its item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMatch<'a> {
    /// Same record handle
    Identity,
    /// Same value in the named field (or same handle)
    Key(&'a str),
}

impl RecordMatch<'_> {
    fn matches(self, bound: &Record, incoming: &Record) -> bool {
        match self {
            RecordMatch::Identity => bound.same(incoming),
            RecordMatch::Key(key) => bound.same_key(incoming, key),
        }
    }
}

/// Plan the single operation that applies `diff` to a list whose items are
/// bound to `bound`, in order.
pub fn reconcile(
    bound: &[Record],
    diff: &ListDiff,
    policy: IndexPolicy,
    matcher: RecordMatch<'_>,
) -> ResolveResult<ListPatch> {
    let len = bound.len();
    match diff {
        ListDiff::Added { index, record } => {
            let index = if *index <= len {
                *index
            } else {
                match policy {
                    IndexPolicy::Clamp => len,
                    IndexPolicy::Reject => {
                        return Err(ResolveError::IndexOutOfRange { op: "added", index: *index, len });
                    }
                }
            };
            Ok(ListPatch::Insert { index, record: record.clone() })
        }
        ListDiff::Updated { index, record } => {
            if *index >= len {
                return Err(ResolveError::IndexOutOfRange { op: "updated", index: *index, len });
            }
            Ok(ListPatch::Rebind { index: *index, record: record.clone() })
        }
        ListDiff::Removed { record } => bound
            .iter()
            .position(|b| matcher.matches(b, record))
            .map(|index| ListPatch::Detach { index, record: bound[index].clone() })
            .ok_or(ResolveError::RecordNotFound),
    }
}

/// One stamped item
#[derive(Debug)]
pub(crate) struct ListEntry {
    pub(crate) item: InstanceId,
    pub(crate) scope: Rc<ListScope>,
}

/// Reconciliation state of one list instance
#[derive(Debug)]
pub(crate) struct ListBinder {
    pub(crate) blueprint: Option<Rc<Descriptor>>,
    pub(crate) iterator_var: String,
    /// Context the list itself was resolved in
    pub(crate) context: ConsumerContext,
    entries: Vec<ListEntry>,
}

impl ListBinder {
    pub(crate) fn new(
        blueprint: Option<Rc<Descriptor>>,
        iterator_var: &str,
        context: ConsumerContext,
    ) -> Self {
        Self {
            blueprint,
            iterator_var: iterator_var.to_string(),
            context,
            entries: Vec::new(),
        }
    }

    /// Bound records in item order
    pub(crate) fn records(&self) -> Vec<Record> {
        self.entries.iter().map(|e| e.scope.record()).collect()
    }

    /// Items in order
    pub(crate) fn items(&self) -> Vec<InstanceId> {
        self.entries.iter().map(|e| e.item).collect()
    }

    pub(crate) fn entry(&self, index: usize) -> Option<&ListEntry> {
        self.entries.get(index)
    }

    pub(crate) fn insert(&mut self, index: usize, entry: ListEntry) {
        self.entries.insert(index, entry);
        self.reindex(index);
    }

    pub(crate) fn remove(&mut self, index: usize) -> ListEntry {
        let entry = self.entries.remove(index);
        self.reindex(index);
        entry
    }

    /// Drop the entry stamped as `item`, wherever it sits
    pub(crate) fn forget(&mut self, item: InstanceId) -> Option<ListEntry> {
        let index = self.entries.iter().position(|e| e.item == item)?;
        Some(self.remove(index))
    }

    /// Item scopes report their live position
    fn reindex(&self, from: usize) {
        for (index, entry) in self.entries.iter().enumerate().skip(from) {
            entry.scope.set_index(index);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

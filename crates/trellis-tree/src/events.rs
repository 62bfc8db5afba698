//! Instance Events
//!
//! Data reconciliation and lifecycle notifications emitted on instances.

use std::rc::Rc;

use trellis_data::Record;

use crate::InstanceId;

/// Listener callback
pub type Handler = Rc<dyn Fn(&InstanceEvent)>;

/// Instance event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // Incoming list data changes
    DataAdded,
    DataUpdated,
    DataRemoved,

    // Derived list notifications
    ItemUpdated,
    ItemRemoved,

    // Page lifecycle
    SubtreeResolved,
}

impl EventKind {
    /// Wire name of the event
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::DataAdded => "data-added",
            EventKind::DataUpdated => "data-updated",
            EventKind::DataRemoved => "data-removed",
            EventKind::ItemUpdated => "item-updated",
            EventKind::ItemRemoved => "item-removed",
            EventKind::SubtreeResolved => "subtree-resolved",
        }
    }
}

/// Instance event
#[derive(Debug, Clone)]
pub struct InstanceEvent {
    pub kind: EventKind,
    /// Instance the event is emitted on
    pub target: InstanceId,
    /// Item instance involved (derived list notifications)
    pub related: Option<InstanceId>,
    pub index: Option<usize>,
    pub record: Option<Record>,
}

impl InstanceEvent {
    /// Create data-added event
    pub fn data_added(list: InstanceId, index: usize, record: Record) -> Self {
        Self {
            kind: EventKind::DataAdded,
            target: list,
            related: None,
            index: Some(index),
            record: Some(record),
        }
    }

    /// Create data-updated event
    pub fn data_updated(list: InstanceId, index: usize, record: Record) -> Self {
        Self {
            kind: EventKind::DataUpdated,
            target: list,
            related: None,
            index: Some(index),
            record: Some(record),
        }
    }

    /// Create data-removed event
    pub fn data_removed(list: InstanceId, record: Record) -> Self {
        Self {
            kind: EventKind::DataRemoved,
            target: list,
            related: None,
            index: None,
            record: Some(record),
        }
    }

    /// Create item-updated event, emitted on the rebound item
    pub fn item_updated(item: InstanceId, index: usize, record: Record) -> Self {
        Self {
            kind: EventKind::ItemUpdated,
            target: item,
            related: Some(item),
            index: Some(index),
            record: Some(record),
        }
    }

    /// Create item-removed event, emitted on the list
    pub fn item_removed(list: InstanceId, item: InstanceId, index: usize, record: Record) -> Self {
        Self {
            kind: EventKind::ItemRemoved,
            target: list,
            related: Some(item),
            index: Some(index),
            record: Some(record),
        }
    }

    /// Create subtree-resolved event, emitted on a page
    pub fn subtree_resolved(page: InstanceId) -> Self {
        Self {
            kind: EventKind::SubtreeResolved,
            target: page,
            related: None,
            index: None,
            record: None,
        }
    }
}

/// Registered listener
pub(crate) struct Listener {
    pub(crate) id: Option<String>,
    pub(crate) handler: Handler,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_removed_event() {
        let record = Record::new(json!({ "name": "a" }));
        let event = InstanceEvent::item_removed(InstanceId(1), InstanceId(5), 0, record.clone());

        assert_eq!(event.kind, EventKind::ItemRemoved);
        assert_eq!(event.target, InstanceId(1));
        assert_eq!(event.related, Some(InstanceId(5)));
        assert!(event.record.unwrap().same(&record));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(EventKind::DataAdded.as_str(), "data-added");
        assert_eq!(EventKind::SubtreeResolved.as_str(), "subtree-resolved");
    }
}

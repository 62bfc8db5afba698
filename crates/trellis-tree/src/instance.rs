//! Component Instance - Live node
//!
//! One mutable node of the instance tree. Links are arena ids; the
//! descriptor is shared with every other instance stamped from it.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use trellis_data::{Record, Viewport};

use crate::{ComponentKind, Descriptor, InstanceId, Style};

/// Property bag value
#[derive(Debug, Clone)]
pub enum PropValue {
    /// Plain value (`text`, resolved timer value, ...)
    Value(Value),
    /// Bound data record (list items, under their iterator variable)
    Record(Record),
}

impl PropValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PropValue::Value(v) => Some(v),
            PropValue::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            PropValue::Record(r) => Some(r),
            PropValue::Value(_) => None,
        }
    }

    /// Current value, reading through a record
    pub fn to_value(&self) -> Value {
        match self {
            PropValue::Value(v) => v.clone(),
            PropValue::Record(r) => r.snapshot(),
        }
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Value(value)
    }
}

impl From<Record> for PropValue {
    fn from(record: Record) -> Self {
        PropValue::Record(record)
    }
}

/// Page announcement phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    /// Subtree still being built
    Resolving,
    /// Built, `subtree-resolved` queued but not yet delivered
    ResolvedNotAnnounced,
    /// `subtree-resolved` delivered
    Announced,
}

/// Page-specific instance state
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlot {
    /// Path the page specification was fetched by
    pub path: String,
    pub viewport: Viewport,
    /// Whether the store had a specification for `path`
    pub found: bool,
    pub phase: PagePhase,
}

/// Component instance
#[derive(Debug)]
pub struct Instance {
    descriptor: Rc<Descriptor>,
    kind: ComponentKind,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) children: Vec<InstanceId>,
    props: BTreeMap<String, PropValue>,
    style: Style,
    page: Option<PageSlot>,
}

impl Instance {
    pub(crate) fn new(descriptor: Rc<Descriptor>) -> Self {
        Self {
            kind: descriptor.kind.clone(),
            style: descriptor.style.clone(),
            descriptor,
            parent: None,
            children: Vec::new(),
            props: BTreeMap::new(),
            page: None,
        }
    }

    /// Descriptor this instance was built from
    pub fn descriptor(&self) -> &Rc<Descriptor> {
        &self.descriptor
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    /// Set a property, returning the previous value
    pub fn edit(&mut self, key: &str, value: impl Into<PropValue>) -> Option<PropValue> {
        self.props.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.props.get(key)
    }

    /// Record bound under `key`, if any
    pub fn record(&self, key: &str) -> Option<&Record> {
        self.props.get(key).and_then(PropValue::as_record)
    }

    /// Plain `text` property
    pub fn text(&self) -> Option<&str> {
        self.props.get("text")?.as_value()?.as_str()
    }

    /// Instance style (starts as a copy of the descriptor's)
    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn set_style(&mut self, key: &str, value: impl Into<Value>) {
        self.style.insert(key.to_string(), value.into());
    }

    pub fn page(&self) -> Option<&PageSlot> {
        self.page.as_ref()
    }

    pub fn page_mut(&mut self) -> Option<&mut PageSlot> {
        self.page.as_mut()
    }

    pub fn set_page(&mut self, slot: PageSlot) {
        self.page = Some(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_style_copied_from_descriptor() {
        let desc = Rc::new(Descriptor::new("view").with_style("color", "red"));
        let mut instance = Instance::new(desc.clone());

        instance.set_style("position", "relative");
        assert_eq!(instance.style().get("color"), Some(&json!("red")));
        assert_eq!(instance.style().len(), 2);
        assert_eq!(desc.style.len(), 1);
    }

    #[test]
    fn test_props() {
        let mut instance = Instance::new(Rc::new(Descriptor::new("label")));
        let record = Record::new(json!({ "name": "a" }));

        assert!(instance.edit("text", json!("Hello")).is_none());
        instance.edit("itemObject", record.clone());

        assert_eq!(instance.text(), Some("Hello"));
        assert!(instance.record("itemObject").unwrap().same(&record));
        assert!(instance.record("text").is_none());
    }
}

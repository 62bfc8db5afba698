//! Edge case tests for trellis-tree

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use trellis_data::Record;
use trellis_tree::{
    ComponentKind, Descriptor, EventKind, InstanceCache, InstanceEvent, InstanceRegistry,
    InstanceTree, ListSource, TreeError,
};

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[test]
fn test_descriptor_single_child_object() {
    let desc = Descriptor::from_json(json!({
        "type": "list",
        "listObject": "messages",
        "iteratorVar": "message",
        "children": { "type": "listItem" }
    }))
    .unwrap();

    assert_eq!(desc.children.len(), 1);
    assert_eq!(desc.list_object, Some(ListSource::Key("messages".into())));
}

#[test]
fn test_descriptor_unknown_type_round_trips() {
    let desc = Descriptor::from_json(json!({ "type": "carousel", "style": { "gap": 4 } })).unwrap();

    assert_eq!(desc.kind, ComponentKind::Other("carousel".into()));
    assert_eq!(serde_json::to_value(&desc).unwrap(), json!({ "type": "carousel", "style": { "gap": 4 } }));
}

#[test]
fn test_descriptor_text_board_left_raw() {
    let desc = Descriptor::from_json(json!({ "type": "label", "textBoard": 12 })).unwrap();
    assert_eq!(desc.text_board, Some(json!(12)));
}

// ============================================================================
// TREE OPERATIONS
// ============================================================================

#[test]
fn test_remove_subtree_frees_everything() {
    let mut tree = InstanceTree::new();
    let root = tree.create(Rc::new(Descriptor::new("view")));
    let list = tree.create(Rc::new(Descriptor::new("list")));
    let item = tree.create(Rc::new(Descriptor::new("listItem")));
    tree.append_child(root, list).unwrap();
    tree.append_child(list, item).unwrap();
    tree.on(item, EventKind::ItemUpdated, Rc::new(|_: &InstanceEvent| {}), None);

    let removed = tree.remove_subtree(list).unwrap();

    assert_eq!(removed, vec![list, item]);
    assert_eq!(tree.len(), 1);
    assert!(tree.children(root).is_empty());
    assert_eq!(tree.listener_count(item, EventKind::ItemUpdated), 0);
    assert_eq!(tree.remove_subtree(item), Err(TreeError::NotFound(item)));
}

#[test]
fn test_ids_not_reused() {
    let mut tree = InstanceTree::new();
    let first = tree.create(Rc::new(Descriptor::new("view")));
    tree.remove_subtree(first).unwrap();
    let second = tree.create(Rc::new(Descriptor::new("view")));

    assert_ne!(first, second);
    assert!(tree.get(first).is_none());
}

#[test]
fn test_clear_and_set_parent() {
    let mut tree = InstanceTree::new();
    let a = tree.create(Rc::new(Descriptor::new("view")));
    let b = tree.create(Rc::new(Descriptor::new("view")));
    let child = tree.create(Rc::new(Descriptor::new("label")));

    tree.set_parent(child, Some(a)).unwrap();
    tree.set_parent(child, Some(b)).unwrap();
    assert!(tree.children(a).is_empty());
    assert_eq!(tree.parent(child), Some(b));

    assert_eq!(tree.clear_children(b).unwrap(), vec![child]);
    assert_eq!(tree.parent(child), None);
    tree.set_parent(child, None).unwrap();
}

#[test]
fn test_remove_non_child() {
    let mut tree = InstanceTree::new();
    let a = tree.create(Rc::new(Descriptor::new("view")));
    let b = tree.create(Rc::new(Descriptor::new("view")));
    assert_eq!(tree.remove_child(a, b), Err(TreeError::NotAChild { parent: a, child: b }));
}

// ============================================================================
// EVENTS AND PROPS
// ============================================================================

#[test]
fn test_emit_reaches_only_matching_kind() {
    let mut tree = InstanceTree::new();
    let list = tree.create(Rc::new(Descriptor::new("list")));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    tree.on(list, EventKind::DataAdded, Rc::new(move |e: &InstanceEvent| log.borrow_mut().push(e.index)), None);

    let record = Record::new(json!({}));
    assert_eq!(tree.emit(&InstanceEvent::data_added(list, 3, record.clone())), 1);
    assert_eq!(tree.emit(&InstanceEvent::data_removed(list, record)), 0);
    assert_eq!(*seen.borrow(), vec![Some(3)]);
}

#[test]
fn test_off_removes_named_listener() {
    let mut tree = InstanceTree::new();
    let page = tree.create(Rc::new(Descriptor::new("page")));
    tree.on(page, EventKind::SubtreeResolved, Rc::new(|_: &InstanceEvent| {}), Some("ready"));
    tree.on(page, EventKind::SubtreeResolved, Rc::new(|_: &InstanceEvent| {}), None);

    assert!(tree.off(page, EventKind::SubtreeResolved, "ready"));
    assert!(!tree.off(page, EventKind::SubtreeResolved, "ready"));
    assert_eq!(tree.listener_count(page, EventKind::SubtreeResolved), 1);
}

#[test]
fn test_record_prop_reads_through() {
    let mut tree = InstanceTree::new();
    let item = tree.create(Rc::new(Descriptor::new("listItem")));
    let record = Record::new(json!({ "n": 1 }));
    tree.edit(item, "row", record.clone()).unwrap();

    record.replace(json!({ "n": 2 }));
    assert_eq!(tree.get_prop(item, "row").unwrap().to_value(), json!({ "n": 2 }));
}

// ============================================================================
// INSTANCE CACHE
// ============================================================================

#[test]
fn test_registry_counts_evictions() {
    let mut tree = InstanceTree::new();
    let id = tree.create(Rc::new(Descriptor::new("view")));
    let mut cache = InstanceRegistry::new();

    cache.insert(id);
    assert!(cache.contains(id));
    assert!(cache.remove(id));
    assert!(!cache.remove(id));
    assert!(cache.is_empty());
    assert_eq!(cache.evicted(), 1);
}

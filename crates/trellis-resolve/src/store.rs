//! Data Store - Host-provided data and page specifications

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_data::{Record, Viewport};
use trellis_tree::Descriptor;

/// Fetched page specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Page name; also the key of the page's data under the global root
    pub name: String,
    #[serde(default)]
    pub components: Vec<Rc<Descriptor>>,
}

impl PageSpec {
    pub fn new(name: &str, components: Vec<Descriptor>) -> Self {
        Self {
            name: name.to_string(),
            components: components.into_iter().map(Rc::new).collect(),
        }
    }
}

/// Data store contract
pub trait DataStore {
    /// Global data root
    fn root(&self) -> Record;

    /// Viewport of the root page
    fn root_viewport(&self) -> Viewport;

    /// Page specification by path; `None` is a valid, empty page
    fn fetch_page(&self, path: &str) -> Option<PageSpec>;

    /// Record array bound to a list key
    fn list(&self, _key: &str) -> Option<Vec<Record>> {
        None
    }
}

/// In-memory data store
#[derive(Debug)]
pub struct MemoryStore {
    root: Record,
    viewport: Viewport,
    pages: RefCell<HashMap<String, PageSpec>>,
    lists: RefCell<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new(root: Value, viewport: Viewport) -> Self {
        Self {
            root: Record::new(root),
            viewport,
            pages: RefCell::new(HashMap::new()),
            lists: RefCell::new(HashMap::new()),
        }
    }

    /// Register a page specification under `path`
    pub fn insert_page(&self, path: &str, spec: PageSpec) {
        self.pages.borrow_mut().insert(path.to_string(), spec);
    }

    /// Replace the record array of a list key, returning the new records
    pub fn set_list(&self, key: &str, rows: Vec<Value>) -> Vec<Record> {
        let records: Vec<Record> = rows.into_iter().map(Record::new).collect();
        self.lists.borrow_mut().insert(key.to_string(), records.clone());
        records
    }

    /// Append one record to a list key
    pub fn push(&self, key: &str, row: Value) -> (usize, Record) {
        let record = Record::new(row);
        let mut lists = self.lists.borrow_mut();
        let rows = lists.entry(key.to_string()).or_default();
        rows.push(record.clone());
        (rows.len() - 1, record)
    }

    /// Remove a record from a list key by identity, returning its old index
    pub fn remove(&self, key: &str, record: &Record) -> Option<usize> {
        let mut lists = self.lists.borrow_mut();
        let rows = lists.get_mut(key)?;
        let index = rows.iter().position(|r| r.same(record))?;
        rows.remove(index);
        Some(index)
    }
}

impl DataStore for MemoryStore {
    fn root(&self) -> Record {
        self.root.clone()
    }

    fn root_viewport(&self) -> Viewport {
        self.viewport
    }

    fn fetch_page(&self, path: &str) -> Option<PageSpec> {
        self.pages.borrow().get(path).cloned()
    }

    fn list(&self, key: &str) -> Option<Vec<Record>> {
        self.lists.borrow().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_push_and_remove() {
        let store = MemoryStore::new(json!({}), Viewport::new(375.0, 667.0));
        let (first_index, first) = store.push("messages", json!({ "text": "hi" }));
        let (second_index, _) = store.push("messages", json!({ "text": "there" }));

        assert_eq!((first_index, second_index), (0, 1));
        assert_eq!(store.remove("messages", &first), Some(0));
        assert_eq!(store.list("messages").unwrap().len(), 1);
        assert_eq!(store.remove("messages", &first), None);
    }

    #[test]
    fn test_page_spec_from_json() {
        let spec: PageSpec = serde_json::from_value(json!({
            "name": "Cereal",
            "components": [{ "type": "label", "text": "Bowl" }]
        }))
        .unwrap();

        let store = MemoryStore::new(json!({}), Viewport::default());
        store.insert_page("Cereal", spec);
        assert_eq!(store.fetch_page("Cereal").unwrap().components.len(), 1);
        assert!(store.fetch_page("Toast").is_none());
    }
}

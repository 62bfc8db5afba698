//! Data Lookup Chain
//!
//! Resolves a `dataKey` against, in order: the enclosing list items
//! (innermost first, iterator variables shadow outer ones of the same
//! name), the global root, then the global root's entry for the current
//! page. The value found is written back where it was found.

use serde_json::Value;
use trellis_data::{DataPath, Record};

use crate::{ConsumerContext, ResolveResult};

/// Where a lookup succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Record of an enclosing list item; 0 is the nearest
    ListItem { depth: usize },
    /// Global data root
    Global,
    /// Global root entry keyed by page name
    Page { name: String },
}

/// Successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub origin: Origin,
}

/// Resolve `key` through the lookup chain.
///
/// `Ok(None)` means nothing matched anywhere; an unparsable key is an error.
pub fn lookup(cx: &ConsumerContext, key: &str) -> ResolveResult<Option<Resolved>> {
    let path = DataPath::parse(key)?;

    if let Some(found) = lookup_list_scopes(cx, &path)? {
        return Ok(Some(found));
    }

    let root = cx.store().root();
    if let Some(value) = prime(&root, &path)? {
        return Ok(Some(Resolved { value, origin: Origin::Global }));
    }

    if let Some(page) = cx.page() {
        let page_path = path.prefixed(&page.name);
        if let Some(value) = prime(&root, &page_path)? {
            return Ok(Some(Resolved {
                value,
                origin: Origin::Page { name: page.name.clone() },
            }));
        }
    }

    tracing::debug!(key, "dataKey not found in any scope");
    Ok(None)
}

fn lookup_list_scopes(cx: &ConsumerContext, path: &DataPath) -> ResolveResult<Option<Resolved>> {
    for (depth, scope) in cx.scopes().enumerate() {
        let record = scope.record();

        if scope.iterator_var() == path.first() {
            let value = match path.rest() {
                Some(rest) => prime(&record, &rest)?,
                None => Some(record.snapshot()),
            };
            // A matching variable shadows every outer scope, hit or miss
            return Ok(value.map(|value| Resolved { value, origin: Origin::ListItem { depth } }));
        }

        if depth == 0 {
            if let Some(value) = prime(&record, path)? {
                return Ok(Some(Resolved { value, origin: Origin::ListItem { depth } }));
            }
        }
    }
    Ok(None)
}

/// Read `path` from `record` and write the value back in place
fn prime(record: &Record, path: &DataPath) -> ResolveResult<Option<Value>> {
    let Some(value) = record.lookup(path) else {
        return Ok(None);
    };
    record.write(path, value.clone())?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::MemoryStore;
    use serde_json::json;
    use trellis_data::Viewport;
    use trellis_tree::InstanceRegistry;

    fn context(root: Value) -> ConsumerContext {
        let store = Rc::new(MemoryStore::new(root, Viewport::new(375.0, 667.0)));
        let cache = Rc::new(RefCell::new(InstanceRegistry::new()));
        ConsumerContext::new(store, cache)
    }

    #[test]
    fn test_list_scope_first() {
        let record = Record::new(json!({ "seconds": 42 }));
        let cx = context(json!({ "itemObject": { "seconds": 1 } }))
            .enter_list_item(0, "itemObject", record);

        let found = lookup(&cx, "itemObject.seconds").unwrap().unwrap();
        assert_eq!(found.value, json!(42));
        assert_eq!(found.origin, Origin::ListItem { depth: 0 });
    }

    #[test]
    fn test_inner_variable_shadows_outer() {
        let outer = Record::new(json!({ "label": "outer" }));
        let inner = Record::new(json!({ "label": "inner" }));
        let cx = context(json!({}))
            .enter_list_item(0, "item", outer)
            .enter_list_item(0, "item", inner);

        let found = lookup(&cx, "item.label").unwrap().unwrap();
        assert_eq!(found.value, json!("inner"));
    }

    #[test]
    fn test_outer_variable_reachable_by_name() {
        let row = Record::new(json!({ "title": "row" }));
        let cell = Record::new(json!({ "title": "cell" }));
        let cx = context(json!({}))
            .enter_list_item(2, "row", row)
            .enter_list_item(0, "cell", cell);

        let found = lookup(&cx, "row.title").unwrap().unwrap();
        assert_eq!(found.value, json!("row"));
        assert_eq!(found.origin, Origin::ListItem { depth: 1 });
    }

    #[test]
    fn test_falls_back_to_global_then_page() {
        let cx = context(json!({ "clock": 5, "Home": { "alarm": 7 } })).with_root_page("Home");

        assert_eq!(lookup(&cx, "clock").unwrap().unwrap().origin, Origin::Global);

        let page_hit = lookup(&cx, "alarm").unwrap().unwrap();
        assert_eq!(page_hit.value, json!(7));
        assert_eq!(page_hit.origin, Origin::Page { name: "Home".into() });
    }

    #[test]
    fn test_object_value_kept_whole() {
        let cx = context(json!({ "timer": { "seconds": 3, "label": "egg" } }));
        let found = lookup(&cx, "timer").unwrap().unwrap();
        assert_eq!(found.value, json!({ "seconds": 3, "label": "egg" }));
    }

    #[test]
    fn test_missing_everywhere() {
        let cx = context(json!({})).with_root_page("Home");
        assert_eq!(lookup(&cx, "nothing.here").unwrap(), None);
        assert!(lookup(&cx, "").is_err());
    }
}

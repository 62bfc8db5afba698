//! Consumer Context
//!
//! Everything a resolution step may consult, threaded explicitly through
//! every call: the data store, the instance cache, the enclosing page and
//! the chain of enclosing list items.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use trellis_data::{Record, Viewport};
use trellis_tree::{InstanceCache, InstanceId};

use crate::DataStore;

/// Enclosing page
#[derive(Debug, Clone, PartialEq)]
pub struct PageScope {
    /// Page name, keys the page's data under the global root
    pub name: String,
    pub viewport: Viewport,
    /// Nesting depth, 1 for a page resolved at top level
    pub depth: usize,
    /// Page instance, `None` for a host-provided root page
    pub instance: Option<InstanceId>,
}

impl PageScope {
    /// Scope for a root page owned by the host
    pub fn root(name: &str, viewport: Viewport) -> Self {
        Self {
            name: name.to_string(),
            viewport,
            depth: 0,
            instance: None,
        }
    }
}

/// One enclosing list item
pub struct ListScope {
    index: Cell<usize>,
    iterator_var: String,
    record: RefCell<Record>,
    parent: Option<Rc<ListScope>>,
}

impl ListScope {
    /// Current position of the item in its list
    pub fn index(&self) -> usize {
        self.index.get()
    }

    pub(crate) fn set_index(&self, index: usize) {
        self.index.set(index);
    }

    pub fn iterator_var(&self) -> &str {
        &self.iterator_var
    }

    /// Currently bound record
    pub fn record(&self) -> Record {
        self.record.borrow().clone()
    }

    /// Next enclosing list item
    pub fn parent(&self) -> Option<&Rc<ListScope>> {
        self.parent.as_ref()
    }

    /// Swap the bound record; descendants resolved later see the new one
    pub(crate) fn rebind(&self, record: Record) {
        *self.record.borrow_mut() = record;
    }
}

impl fmt::Debug for ListScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListScope")
            .field("index", &self.index.get())
            .field("iterator_var", &self.iterator_var)
            .field("record", &self.record)
            .field("nested", &self.parent.is_some())
            .finish()
    }
}

/// Bundle of collaborators and scopes for one resolution step
#[derive(Clone)]
pub struct ConsumerContext {
    store: Rc<dyn DataStore>,
    cache: Rc<RefCell<dyn InstanceCache>>,
    page: Option<PageScope>,
    scope: Option<Rc<ListScope>>,
}

impl ConsumerContext {
    pub fn new(store: Rc<dyn DataStore>, cache: Rc<RefCell<dyn InstanceCache>>) -> Self {
        Self {
            store,
            cache,
            page: None,
            scope: None,
        }
    }

    /// Same collaborators, resolving inside a host-owned root page
    pub fn with_root_page(mut self, name: &str) -> Self {
        let viewport = self.store.root_viewport();
        self.page = Some(PageScope::root(name, viewport));
        self
    }

    pub fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    /// Enclosing page, if any
    pub fn page(&self) -> Option<&PageScope> {
        self.page.as_ref()
    }

    /// Viewport of the enclosing page, or the store's root viewport
    pub fn viewport(&self) -> Viewport {
        match &self.page {
            Some(page) => page.viewport,
            None => self.store.root_viewport(),
        }
    }

    /// Nearest enclosing list item
    pub fn list_scope(&self) -> Option<&Rc<ListScope>> {
        self.scope.as_ref()
    }

    /// Enclosing list items, innermost first
    pub fn scopes(&self) -> impl Iterator<Item = &ListScope> + '_ {
        std::iter::successors(self.scope.as_deref(), |scope| scope.parent.as_deref())
    }

    /// Context for a new list item nested in this one
    pub fn enter_list_item(&self, index: usize, iterator_var: &str, record: Record) -> Self {
        self.with_scope(self.item_scope(index, iterator_var, record))
    }

    /// List scope for a new item, chained to this context's scope
    pub(crate) fn item_scope(&self, index: usize, iterator_var: &str, record: Record) -> Rc<ListScope> {
        Rc::new(ListScope {
            index: Cell::new(index),
            iterator_var: iterator_var.to_string(),
            record: RefCell::new(record),
            parent: self.scope.clone(),
        })
    }

    pub(crate) fn with_scope(&self, scope: Rc<ListScope>) -> Self {
        Self {
            store: Rc::clone(&self.store),
            cache: Rc::clone(&self.cache),
            page: self.page.clone(),
            scope: Some(scope),
        }
    }

    /// Context for the inside of a page sandbox; list scopes do not cross it
    pub fn enter_page(&self, page: PageScope) -> Self {
        Self {
            store: Rc::clone(&self.store),
            cache: Rc::clone(&self.cache),
            page: Some(page),
            scope: None,
        }
    }

    /// Register a new instance in the cache
    pub fn register(&self, id: InstanceId) {
        self.cache.borrow_mut().insert(id);
    }

    /// Evict an instance from the cache
    pub fn evict(&self, id: InstanceId) -> bool {
        self.cache.borrow_mut().remove(id)
    }

    /// Whether the cache still holds an instance
    pub fn is_cached(&self, id: InstanceId) -> bool {
        self.cache.borrow().contains(id)
    }
}

impl fmt::Debug for ConsumerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerContext")
            .field("page", &self.page)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde_json::json;
    use trellis_tree::InstanceRegistry;

    fn context() -> ConsumerContext {
        let store = Rc::new(MemoryStore::new(json!({}), Viewport::new(375.0, 667.0)));
        let cache = Rc::new(RefCell::new(InstanceRegistry::new()));
        ConsumerContext::new(store, cache)
    }

    #[test]
    fn test_scopes_innermost_first() {
        let outer = Record::new(json!({ "name": "outer" }));
        let inner = Record::new(json!({ "name": "inner" }));
        let cx = context()
            .enter_list_item(0, "row", outer)
            .enter_list_item(3, "cell", inner.clone());

        let vars: Vec<&str> = cx.scopes().map(ListScope::iterator_var).collect();
        assert_eq!(vars, vec!["cell", "row"]);
        assert!(cx.list_scope().unwrap().record().same(&inner));
        assert_eq!(cx.list_scope().unwrap().index(), 3);
    }

    #[test]
    fn test_page_clears_list_scope() {
        let cx = context().enter_list_item(0, "row", Record::new(json!({})));
        let page = cx.enter_page(PageScope {
            name: "Cereal".into(),
            viewport: Viewport::new(100.0, 200.0),
            depth: 1,
            instance: None,
        });

        assert!(page.list_scope().is_none());
        assert_eq!(page.viewport(), Viewport::new(100.0, 200.0));
        assert_eq!(cx.viewport(), Viewport::new(375.0, 667.0));
    }

    #[test]
    fn test_root_page_uses_store_viewport() {
        let cx = context().with_root_page("Home");
        let page = cx.page().unwrap();
        assert_eq!(page.name, "Home");
        assert_eq!(page.depth, 0);
        assert_eq!(page.viewport, Viewport::new(375.0, 667.0));
    }
}

//! Resolver
//!
//! Builds instances from descriptors and dispatches each one to the
//! expansion for its type. Also owns the state that outlives a single
//! `resolve` call: list binders, the pending-stamp work queue, deferred
//! page announcements and the diagnostics sink.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use trellis_data::Record;
use trellis_tree::{
    ComponentKind, Descriptor, InstanceEvent, InstanceId, InstanceTree, ListSource, PagePhase,
};

use crate::list::{ListBinder, ListEntry};
use crate::scheduler::DeferredTask;
use crate::{
    extract_blueprint, lookup, reconcile, ColorFormatter, ConsumerContext, CssColor,
    DeferredQueue, Diagnostic, ListDiff, ListPatch, RecordMatch, ResolveError, ResolveResult,
    ResolverConfig,
};

/// Outcome of delivering one list data event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// New item stamped
    Inserted(InstanceId),
    /// Existing item rebound to a new record
    Rebound(InstanceId),
    /// Item torn down
    Removed(InstanceId),
    /// Event rejected; see diagnostics
    Ignored,
}

/// Records waiting to be stamped into a freshly bound list
#[derive(Debug)]
struct PendingStamp {
    list: InstanceId,
    records: Vec<Record>,
}

/// Descriptor tree resolver
pub struct Resolver {
    config: ResolverConfig,
    color: Box<dyn ColorFormatter>,
    lists: HashMap<InstanceId, ListBinder>,
    pending: VecDeque<PendingStamp>,
    deferred: DeferredQueue,
    diagnostics: Vec<Diagnostic>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            color: Box::new(CssColor),
            lists: HashMap::new(),
            pending: VecDeque::new(),
            deferred: DeferredQueue::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Replace the color formatter used for text segments
    pub fn with_color_formatter(mut self, formatter: impl ColorFormatter + 'static) -> Self {
        self.color = Box::new(formatter);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub(crate) fn color(&self) -> &dyn ColorFormatter {
        self.color.as_ref()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `descriptor` into a new subtree, appended to `parent` when
    /// given.
    ///
    /// Problems inside the subtree are recorded as diagnostics and never
    /// fail the call; only a descriptor that cannot produce an instance at
    /// all is returned as an error.
    pub fn resolve(
        &mut self,
        tree: &mut InstanceTree,
        descriptor: impl Into<Rc<Descriptor>>,
        parent: Option<InstanceId>,
        cx: &ConsumerContext,
    ) -> ResolveResult<InstanceId> {
        let result = self.build(tree, descriptor.into(), cx).and_then(|id| match parent {
            Some(parent) => match tree.append_child(parent, id) {
                Ok(_) => Ok(id),
                Err(err) => {
                    self.teardown(tree, id, cx)?;
                    Err(err.into())
                }
            },
            None => Ok(id),
        });

        self.drain_pending(tree);
        result.inspect_err(|err| self.report(parent, err.clone()))
    }

    /// Build a detached instance and everything below it.
    ///
    /// On error nothing built for `desc` stays in the tree or the cache.
    pub(crate) fn build(
        &mut self,
        tree: &mut InstanceTree,
        desc: Rc<Descriptor>,
        cx: &ConsumerContext,
    ) -> ResolveResult<InstanceId> {
        self.check(&desc, cx)?;

        let id = tree.create(Rc::clone(&desc));
        cx.register(id);
        tracing::trace!(instance = %id, kind = desc.kind.as_str(), "created");

        if let Err(err) = self.expand(tree, id, &desc, cx) {
            self.teardown(tree, id, cx)?;
            return Err(err);
        }
        Ok(id)
    }

    fn check(&self, desc: &Descriptor, cx: &ConsumerContext) -> ResolveResult<()> {
        if desc.kind.is_list() && desc.iterator_var.as_deref().is_none_or(str::is_empty) {
            return Err(ResolveError::MissingIteratorVar { kind: desc.kind.as_str().to_string() });
        }
        if desc.kind == ComponentKind::Page {
            self.check_page(desc, cx)?;
        }
        Ok(())
    }

    fn expand(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        desc: &Descriptor,
        cx: &ConsumerContext,
    ) -> ResolveResult<()> {
        if let Some(text) = &desc.text {
            tree.edit(id, "text", Value::from(text.as_str()))?;
        }
        if let Some(content_type) = &desc.content_type {
            tree.edit(id, "contentType", Value::from(content_type.as_str()))?;
        }

        match &desc.kind {
            ComponentKind::List | ComponentKind::ChatList => self.bind_list(id, desc, cx),
            ComponentKind::ScrollView => self.expand_scroll(tree, id, desc, cx),
            ComponentKind::Page => self.expand_page(tree, id, desc, cx),
            ComponentKind::Label => self.expand_label(tree, id, desc, cx),
            ComponentKind::Timer => {
                self.resolve_timer(tree, id, desc, cx)?;
                self.resolve_children(tree, id, &desc.children, cx).map(drop)
            }
            _ => self.resolve_children(tree, id, &desc.children, cx).map(drop),
        }
    }

    /// Build and append each child in order.
    ///
    /// A child that fails is reported and skipped. Returns the children
    /// that were attached.
    pub(crate) fn resolve_children(
        &mut self,
        tree: &mut InstanceTree,
        parent: InstanceId,
        children: &[Rc<Descriptor>],
        cx: &ConsumerContext,
    ) -> ResolveResult<Vec<InstanceId>> {
        let mut attached = Vec::with_capacity(children.len());
        for child in children {
            match self.build(tree, Rc::clone(child), cx) {
                Ok(id) => {
                    tree.append_child(parent, id)?;
                    attached.push(id);
                }
                Err(err) => self.report(Some(parent), err),
            }
        }
        Ok(attached)
    }

    fn resolve_timer(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        desc: &Descriptor,
        cx: &ConsumerContext,
    ) -> ResolveResult<()> {
        let Some(key) = desc.data_key.as_deref() else {
            return Ok(());
        };

        match lookup(cx, key) {
            Ok(Some(found)) => {
                tracing::debug!(instance = %id, key, origin = ?found.origin, "timer value resolved");
                tree.edit(id, "value", found.value)?;
            }
            Ok(None) => self.report(Some(id), ResolveError::MissingData { key: key.to_string() }),
            Err(err) => self.report(Some(id), err),
        }
        Ok(())
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Attach binder state to a list instance and queue its initial records
    fn bind_list(&mut self, id: InstanceId, desc: &Descriptor, cx: &ConsumerContext) -> ResolveResult<()> {
        let iterator_var = desc.iterator_var.as_deref().unwrap_or_default();
        let binder = ListBinder::new(extract_blueprint(desc), iterator_var, cx.clone());
        self.lists.insert(id, binder);

        let records = match &desc.list_object {
            None => Vec::new(),
            Some(ListSource::Inline(rows)) => rows.iter().cloned().map(Record::new).collect(),
            Some(ListSource::Key(key)) => match self.list_source(key, cx) {
                Some(records) => records,
                None => {
                    self.report(Some(id), ResolveError::MissingListSource { key: key.clone() });
                    Vec::new()
                }
            },
        };

        tracing::debug!(list = %id, iterator_var, records = records.len(), "list bound");
        if !records.is_empty() {
            self.pending.push_back(PendingStamp { list: id, records });
        }
        Ok(())
    }

    /// Records behind a key-bound list: the store's list first, then an
    /// array found through the lookup chain
    fn list_source(&mut self, key: &str, cx: &ConsumerContext) -> Option<Vec<Record>> {
        if let Some(records) = cx.store().list(key) {
            return Some(records);
        }
        match lookup(cx, key) {
            Ok(Some(found)) => match found.value {
                Value::Array(rows) => Some(rows.into_iter().map(Record::new).collect()),
                _ => None,
            },
            Ok(None) => None,
            Err(err) => {
                self.report(None, err);
                None
            }
        }
    }

    /// Stamp every queued record, including stamps queued by nested lists
    /// while draining.
    fn drain_pending(&mut self, tree: &mut InstanceTree) {
        while let Some(stamp) = self.pending.pop_front() {
            for record in stamp.records {
                let Some(binder) = self.lists.get(&stamp.list) else {
                    break;
                };
                let diff = ListDiff::Added { index: binder.len(), record };
                if let Err(err) = self.apply(tree, stamp.list, &diff) {
                    self.report(Some(stamp.list), err);
                }
            }
        }
    }

    fn apply(
        &mut self,
        tree: &mut InstanceTree,
        list: InstanceId,
        diff: &ListDiff,
    ) -> ResolveResult<Reconciled> {
        let binder = self.lists.get(&list).ok_or(ResolveError::UnknownList(list))?;
        let matcher = match &self.config.record_key {
            Some(key) => RecordMatch::Key(key),
            None => RecordMatch::Identity,
        };
        let patch = reconcile(&binder.records(), diff, self.config.index_policy, matcher)?;

        match patch {
            ListPatch::Insert { index, record } => {
                self.insert_item(tree, list, index, record).map(Reconciled::Inserted)
            }
            ListPatch::Rebind { index, record } => {
                self.rebind_item(tree, list, index, record).map(Reconciled::Rebound)
            }
            ListPatch::Detach { index, .. } => {
                self.detach_item(tree, list, index).map(Reconciled::Removed)
            }
        }
    }

    fn insert_item(
        &mut self,
        tree: &mut InstanceTree,
        list: InstanceId,
        index: usize,
        record: Record,
    ) -> ResolveResult<InstanceId> {
        let binder = self.lists.get(&list).ok_or(ResolveError::UnknownList(list))?;
        let blueprint = binder.blueprint.clone().ok_or(ResolveError::MissingBlueprint)?;
        let iterator_var = binder.iterator_var.clone();
        let scope = binder.context.item_scope(index, &iterator_var, record.clone());
        let item_cx = binder.context.with_scope(Rc::clone(&scope));

        let item = self.build(tree, blueprint, &item_cx)?;
        tree.edit(item, &iterator_var, record)?;
        if let Err(err) = tree.insert_child(list, index, item) {
            self.teardown(tree, item, &item_cx)?;
            return Err(err.into());
        }

        let binder = self.lists.get_mut(&list).ok_or(ResolveError::UnknownList(list))?;
        binder.insert(index, ListEntry { item, scope });
        tracing::debug!(list = %list, item = %item, index, "item stamped");
        Ok(item)
    }

    fn rebind_item(
        &mut self,
        tree: &mut InstanceTree,
        list: InstanceId,
        index: usize,
        record: Record,
    ) -> ResolveResult<InstanceId> {
        let binder = self.lists.get(&list).ok_or(ResolveError::UnknownList(list))?;
        let entry = binder.entry(index).ok_or(ResolveError::IndexOutOfRange {
            op: "updated",
            index,
            len: binder.len(),
        })?;

        let item = entry.item;
        tree.edit(item, &binder.iterator_var, record.clone())?;
        entry.scope.rebind(record.clone());
        tree.emit(&InstanceEvent::item_updated(item, index, record));
        Ok(item)
    }

    fn detach_item(
        &mut self,
        tree: &mut InstanceTree,
        list: InstanceId,
        index: usize,
    ) -> ResolveResult<InstanceId> {
        let binder = self.lists.get_mut(&list).ok_or(ResolveError::UnknownList(list))?;
        if index >= binder.len() {
            return Err(ResolveError::IndexOutOfRange { op: "removed", index, len: binder.len() });
        }
        let entry = binder.remove(index);
        let cx = binder.context.clone();

        let record = entry.scope.record();
        let removed = self.teardown(tree, entry.item, &cx)?;
        tracing::debug!(list = %list, item = %entry.item, index, evicted = removed.len(), "item removed");
        tree.emit(&InstanceEvent::item_removed(list, entry.item, index, record));
        Ok(entry.item)
    }

    /// Free `id` and its descendants, evict them from the cache and forget
    /// any list or page state they carried.
    ///
    /// When `id` is an item of a bound list its entry leaves the binder too.
    fn teardown(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        cx: &ConsumerContext,
    ) -> ResolveResult<Vec<InstanceId>> {
        let parent = tree.parent(id);
        let removed = tree.remove_subtree(id)?;
        if let Some(binder) = parent.and_then(|list| self.lists.get_mut(&list)) {
            binder.forget(id);
        }

        let gone: HashSet<InstanceId> = removed.iter().copied().collect();
        for node in &removed {
            cx.evict(*node);
            self.lists.remove(node);
        }
        self.pending.retain(|stamp| !gone.contains(&stamp.list));
        self.deferred.retain(|task| match task {
            DeferredTask::AnnouncePage(page) => !gone.contains(page),
        });
        Ok(removed)
    }

    // =========================================================================
    // Runtime events
    // =========================================================================

    /// Apply one `data-added`, `data-updated` or `data-removed` event to the
    /// list it targets.
    ///
    /// The event is also emitted on the list for external listeners.
    /// Rejected events are reported and leave the tree untouched.
    pub fn deliver(&mut self, tree: &mut InstanceTree, event: InstanceEvent) -> Reconciled {
        let outcome = match self.deliver_one(tree, &event) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report(Some(event.target), err);
                Reconciled::Ignored
            }
        };
        self.drain_pending(tree);
        outcome
    }

    fn deliver_one(&mut self, tree: &mut InstanceTree, event: &InstanceEvent) -> ResolveResult<Reconciled> {
        let diff = ListDiff::from_event(event)?;
        if !self.lists.contains_key(&event.target) {
            return Err(ResolveError::UnknownList(event.target));
        }
        tree.emit(event);
        self.apply(tree, event.target, &diff)
    }

    /// Deliver `data-added`
    pub fn add_record(
        &mut self,
        tree: &mut InstanceTree,
        list: InstanceId,
        index: usize,
        record: Record,
    ) -> Reconciled {
        self.deliver(tree, InstanceEvent::data_added(list, index, record))
    }

    /// Deliver `data-updated`
    pub fn update_record(
        &mut self,
        tree: &mut InstanceTree,
        list: InstanceId,
        index: usize,
        record: Record,
    ) -> Reconciled {
        self.deliver(tree, InstanceEvent::data_updated(list, index, record))
    }

    /// Deliver `data-removed`
    pub fn remove_record(&mut self, tree: &mut InstanceTree, list: InstanceId, record: Record) -> Reconciled {
        self.deliver(tree, InstanceEvent::data_removed(list, record))
    }

    /// Detach and evict an arbitrary subtree, returning how many instances
    /// were freed
    pub fn destroy(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        cx: &ConsumerContext,
    ) -> ResolveResult<usize> {
        let removed = self.teardown(tree, id, cx)?;
        tracing::debug!(instance = %id, freed = removed.len(), "subtree destroyed");
        Ok(removed.len())
    }

    // =========================================================================
    // Deferred work
    // =========================================================================

    pub(crate) fn defer(&mut self, task: DeferredTask) {
        self.deferred.defer(task);
    }

    /// Whether deferred work is waiting for the next turn
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Run one scheduler turn: announce every page resolved before this
    /// call. Returns the number of `subtree-resolved` events delivered.
    pub fn run_deferred(&mut self, tree: &mut InstanceTree) -> usize {
        let mut announced = 0;
        for task in self.deferred.take_turn() {
            match task {
                DeferredTask::AnnouncePage(page) => {
                    let Some(slot) = tree.get_mut(page).and_then(|p| p.page_mut()) else {
                        tracing::debug!(page = %page, "page gone before announcement");
                        continue;
                    };
                    slot.phase = PagePhase::Announced;
                    tree.emit(&InstanceEvent::subtree_resolved(page));
                    announced += 1;
                }
            }
        }
        announced
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Items of a bound list, in order
    pub fn list_items(&self, list: InstanceId) -> Option<Vec<InstanceId>> {
        self.lists.get(&list).map(ListBinder::items)
    }

    /// Records bound to a list's items, in order
    pub fn bound_records(&self, list: InstanceId) -> Option<Vec<Record>> {
        self.lists.get(&list).map(ListBinder::records)
    }

    /// Whether `id` has live list binder state
    pub fn is_bound_list(&self, id: InstanceId) -> bool {
        self.lists.contains_key(&id)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain recorded diagnostics
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn report(&mut self, instance: Option<InstanceId>, error: ResolveError) {
        let diagnostic = Diagnostic::new(instance, error);
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("lists", &self.lists.len())
            .field("pending", &self.pending.len())
            .field("deferred", &self.deferred.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::{MemoryStore, Severity};
    use serde_json::json;
    use trellis_data::Viewport;
    use trellis_tree::InstanceRegistry;

    fn setup(root: Value) -> (InstanceTree, Resolver, ConsumerContext) {
        let store = Rc::new(MemoryStore::new(root, Viewport::new(375.0, 667.0)));
        let cache = Rc::new(RefCell::new(InstanceRegistry::new()));
        let cx = ConsumerContext::new(store, cache);
        (InstanceTree::new(), Resolver::default(), cx)
    }

    #[test]
    fn test_generic_container_keeps_unknown_type() {
        let (mut tree, mut resolver, cx) = setup(json!({}));
        let desc = Descriptor::new("carousel").with_child(Descriptor::new("view"));

        let id = resolver.resolve(&mut tree, desc, None, &cx).unwrap();
        let instance = tree.get(id).unwrap();
        assert_eq!(instance.kind().as_str(), "carousel");
        assert_eq!(tree.children(id).len(), 1);
        assert!(cx.is_cached(id));
    }

    #[test]
    fn test_list_without_iterator_var_isolated() {
        let (mut tree, mut resolver, cx) = setup(json!({}));
        let broken = Descriptor::new("list").with_child(Descriptor::new("listItem"));
        let desc = Descriptor::new("view")
            .with_child(broken)
            .with_child(Descriptor::new("label").with_text("still here"));

        let root = resolver.resolve(&mut tree, desc, None, &cx).unwrap();
        let children = tree.children(root);
        assert_eq!(children.len(), 1);
        assert_eq!(tree.get(children[0]).unwrap().text(), Some("still here"));

        let diagnostics = resolver.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].error, ResolveError::MissingIteratorVar { kind: "list".into() });
        assert_eq!(diagnostics[0].instance, Some(root));
    }

    #[test]
    fn test_top_level_failure_returned() {
        let (mut tree, mut resolver, cx) = setup(json!({}));
        let err = resolver.resolve(&mut tree, Descriptor::new("page"), None, &cx).unwrap_err();

        assert_eq!(err, ResolveError::MissingPagePath);
        assert!(tree.is_empty());
        assert_eq!(resolver.diagnostics().len(), 1);
    }

    #[test]
    fn test_timer_missing_data() {
        let (mut tree, mut resolver, cx) = setup(json!({}));
        let timer = resolver
            .resolve(&mut tree, Descriptor::new("timer").with_data_key("clock"), None, &cx)
            .unwrap();

        assert!(tree.get_prop(timer, "value").is_none());
        assert_eq!(resolver.diagnostics()[0].error, ResolveError::MissingData { key: "clock".into() });
        assert_eq!(resolver.diagnostics()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_scroll_children_relative() {
        let (mut tree, mut resolver, cx) = setup(json!({}));
        let desc = Descriptor::new("scrollView")
            .with_child(Descriptor::new("view").with_style("position", "absolute"))
            .with_child(Descriptor::new("label"));

        let scroll = resolver.resolve(&mut tree, desc, None, &cx).unwrap();
        for &child in tree.children(scroll) {
            assert_eq!(tree.get(child).unwrap().style().get("position"), Some(&json!("relative")));
        }
        assert_eq!(tree.children(scroll).len(), 2);
    }

    #[test]
    fn test_unknown_list_reported() {
        let (mut tree, mut resolver, cx) = setup(json!({}));
        let view = resolver.resolve(&mut tree, Descriptor::new("view"), None, &cx).unwrap();

        let outcome = resolver.add_record(&mut tree, view, 0, Record::new(json!({})));
        assert_eq!(outcome, Reconciled::Ignored);
        assert_eq!(resolver.diagnostics()[0].error, ResolveError::UnknownList(view));
    }

    #[test]
    fn test_content_type_prop() {
        let (mut tree, mut resolver, cx) = setup(json!({}));
        let mut desc = Descriptor::new("chatItem");
        desc.content_type = Some("image".into());

        let id = resolver.resolve(&mut tree, desc, None, &cx).unwrap();
        assert_eq!(tree.get_prop(id, "contentType").unwrap().to_value(), json!("image"));
    }
}

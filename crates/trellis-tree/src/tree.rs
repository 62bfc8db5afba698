//! Instance Tree (arena-based allocation)
//!
//! Instances live in a slot vector addressed by [`InstanceId`]. Freed
//! slots stay empty so ids are never reused within one tree.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::events::Listener;
use crate::{
    Descriptor, EventKind, Handler, Instance, InstanceEvent, InstanceId, PropValue, TreeError,
    TreeResult,
};

/// Arena of live component instances
#[derive(Default)]
pub struct InstanceTree {
    slots: Vec<Option<Instance>>,
    live: usize,
    listeners: HashMap<(InstanceId, EventKind), Vec<Listener>>,
}

impl InstanceTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached instance for a descriptor
    pub fn create(&mut self, descriptor: Rc<Descriptor>) -> InstanceId {
        let id = InstanceId(self.slots.len() as u32);
        self.slots.push(Some(Instance::new(descriptor)));
        self.live += 1;
        id
    }

    /// Get an instance by ID
    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Get a mutable instance by ID
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    fn require(&self, id: InstanceId) -> TreeResult<&Instance> {
        self.get(id).ok_or(TreeError::NotFound(id))
    }

    fn require_mut(&mut self, id: InstanceId) -> TreeResult<&mut Instance> {
        self.get_mut(id).ok_or(TreeError::NotFound(id))
    }

    /// Whether the instance is still allocated
    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Children of an instance (empty if unknown)
    pub fn children(&self, id: InstanceId) -> &[InstanceId] {
        self.get(id).map(Instance::children).unwrap_or(&[])
    }

    /// Parent of an instance
    pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
        self.get(id)?.parent
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: InstanceId, child: InstanceId) -> TreeResult<InstanceId> {
        let index = self.require(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` among `parent`'s children.
    ///
    /// A child that already has a parent is detached from it first.
    pub fn insert_child(
        &mut self,
        parent: InstanceId,
        index: usize,
        child: InstanceId,
    ) -> TreeResult<InstanceId> {
        self.require(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::HierarchyRequest { parent, child });
        }

        if let Some(old_parent) = self.require(child)?.parent {
            self.remove_child(old_parent, child)?;
        }

        let siblings = &mut self.require_mut(parent)?.children;
        if index > siblings.len() {
            return Err(TreeError::IndexOutOfRange { parent, index, len: siblings.len() });
        }
        siblings.insert(index, child);
        self.require_mut(child)?.parent = Some(parent);
        Ok(child)
    }

    /// Detach `child` from `parent` (the instance stays allocated)
    pub fn remove_child(&mut self, parent: InstanceId, child: InstanceId) -> TreeResult<InstanceId> {
        let siblings = &mut self.require_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        siblings.remove(position);

        if let Some(instance) = self.get_mut(child) {
            instance.parent = None;
        }
        Ok(child)
    }

    /// Detach every child of `parent`, returning them in order
    pub fn clear_children(&mut self, parent: InstanceId) -> TreeResult<Vec<InstanceId>> {
        let children = std::mem::take(&mut self.require_mut(parent)?.children);
        for &child in &children {
            if let Some(instance) = self.get_mut(child) {
                instance.parent = None;
            }
        }
        Ok(children)
    }

    /// Move `child` under `parent` (appended), or detach it with `None`
    pub fn set_parent(&mut self, child: InstanceId, parent: Option<InstanceId>) -> TreeResult<()> {
        match parent {
            Some(parent) => self.append_child(parent, child).map(|_| ()),
            None => match self.require(child)?.parent {
                Some(old) => self.remove_child(old, child).map(|_| ()),
                None => Ok(()),
            },
        }
    }

    fn is_ancestor_or_self(&self, ancestor: InstanceId, mut node: InstanceId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// `id` and all of its descendants, pre-order
    pub fn descendants(&self, id: InstanceId) -> Vec<InstanceId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(instance) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(instance.children.iter().rev().copied());
        }
        out
    }

    /// Detach `id` from its parent and free it with every descendant.
    ///
    /// Returns the freed ids, pre-order. Listeners on freed instances are
    /// dropped.
    pub fn remove_subtree(&mut self, id: InstanceId) -> TreeResult<Vec<InstanceId>> {
        if let Some(parent) = self.require(id)?.parent {
            self.remove_child(parent, id)?;
        }

        let removed = self.descendants(id);
        for &node in &removed {
            if let Some(slot) = self.slots.get_mut(node.index()) {
                if slot.take().is_some() {
                    self.live -= 1;
                }
            }
        }
        let gone: HashSet<InstanceId> = removed.iter().copied().collect();
        self.listeners.retain(|(target, _), _| !gone.contains(target));
        Ok(removed)
    }

    /// Set a property on an instance
    pub fn edit(
        &mut self,
        id: InstanceId,
        key: &str,
        value: impl Into<PropValue>,
    ) -> TreeResult<Option<PropValue>> {
        Ok(self.require_mut(id)?.edit(key, value))
    }

    /// Read a property of an instance
    pub fn get_prop(&self, id: InstanceId, key: &str) -> Option<&PropValue> {
        self.get(id)?.get(key)
    }

    /// Set a style entry on an instance
    pub fn set_style(&mut self, id: InstanceId, key: &str, value: impl Into<Value>) -> TreeResult<()> {
        self.require_mut(id)?.set_style(key, value);
        Ok(())
    }

    /// Register a listener.
    ///
    /// A listener registered with an id replaces the earlier listener with
    /// the same id for that instance and event.
    pub fn on(&mut self, id: InstanceId, kind: EventKind, handler: Handler, handler_id: Option<&str>) {
        let listeners = self.listeners.entry((id, kind)).or_default();
        if let Some(handler_id) = handler_id {
            listeners.retain(|l| l.id.as_deref() != Some(handler_id));
        }
        listeners.push(Listener {
            id: handler_id.map(str::to_string),
            handler,
        });
    }

    /// Remove the listener registered under `handler_id`
    pub fn off(&mut self, id: InstanceId, kind: EventKind, handler_id: &str) -> bool {
        let Some(listeners) = self.listeners.get_mut(&(id, kind)) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| l.id.as_deref() != Some(handler_id));
        let removed = before != listeners.len();
        if listeners.is_empty() {
            self.listeners.remove(&(id, kind));
        }
        removed
    }

    /// Number of instance and event pairs with at least one listener
    pub fn listened_targets(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver an event to the listeners of its target.
    ///
    /// Returns the number of handlers called.
    pub fn emit(&self, event: &InstanceEvent) -> usize {
        let handlers: Vec<Handler> = match self.listeners.get(&(event.target, event.kind)) {
            Some(listeners) => listeners.iter().map(|l| Rc::clone(&l.handler)).collect(),
            None => return 0,
        };

        tracing::trace!(target_id = %event.target, event = event.kind.as_str(), "emit");
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Number of listeners for an instance and event
    pub fn listener_count(&self, id: InstanceId, kind: EventKind) -> usize {
        self.listeners.get(&(id, kind)).map_or(0, Vec::len)
    }
}

impl fmt::Debug for InstanceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceTree")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

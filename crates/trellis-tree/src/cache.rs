//! Instance Cache
//!
//! Process-wide registry of live instances. Every instance the resolver
//! builds is inserted; every instance torn down is removed.

use std::collections::HashSet;

use crate::InstanceId;

/// Registry of live instances
pub trait InstanceCache {
    /// Register a freshly built instance
    fn insert(&mut self, id: InstanceId);

    /// Evict an instance; returns whether it was registered
    fn remove(&mut self, id: InstanceId) -> bool;

    /// Check whether an instance is registered
    fn contains(&self, id: InstanceId) -> bool;

    /// Number of registered instances
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default hash-set backed cache
#[derive(Debug, Default, Clone)]
pub struct InstanceRegistry {
    live: HashSet<InstanceId>,
    evicted: u64,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total evictions since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl InstanceCache for InstanceRegistry {
    fn insert(&mut self, id: InstanceId) {
        self.live.insert(id);
    }

    fn remove(&mut self, id: InstanceId) -> bool {
        let removed = self.live.remove(&id);
        if removed {
            self.evicted += 1;
        }
        removed
    }

    fn contains(&self, id: InstanceId) -> bool {
        self.live.contains(&id)
    }

    fn len(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_eviction() {
        let mut cache = InstanceRegistry::new();
        cache.insert(InstanceId(1));
        cache.insert(InstanceId(2));

        assert!(cache.remove(InstanceId(1)));
        assert!(!cache.remove(InstanceId(1)));
        assert!(!cache.contains(InstanceId(1)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.evicted(), 1);
    }
}

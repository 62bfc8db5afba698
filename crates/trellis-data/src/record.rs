//! Data Records
//!
//! A record is one element of a bound array. The tree only ever holds
//! handles to it; two handles are "the same record" when they point at the
//! same allocation, regardless of the values inside.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::{DataPath, DataResult};

/// Shared handle to one bound data value
#[derive(Clone)]
pub struct Record(Rc<RefCell<Value>>);

impl Record {
    /// Wrap a value in a fresh record
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Identity comparison
    #[inline]
    pub fn same(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Compare the field `key` of both records.
    ///
    /// Records missing the field never match.
    pub fn same_key(&self, other: &Record, key: &str) -> bool {
        if self.same(other) {
            return true;
        }
        let ours = self.0.borrow();
        let theirs = other.0.borrow();
        match (ours.get(key), theirs.get(key)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Borrow the current value
    pub fn value(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    /// Clone of the current value
    pub fn snapshot(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Replace the whole value, returning the old one
    pub fn replace(&self, value: Value) -> Value {
        self.0.replace(value)
    }

    /// Look up a path inside the record
    pub fn lookup(&self, path: &DataPath) -> Option<Value> {
        path.get(&self.0.borrow()).cloned()
    }

    /// Write a value at a path inside the record
    pub fn write(&self, path: &DataPath, value: Value) -> DataResult<()> {
        path.set(&mut self.0.borrow_mut(), value)
    }

    /// Number of handles sharing this record
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(value) => f.debug_tuple("Record").field(&*value).finish(),
            Err(_) => f.write_str("Record(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_not_equality() {
        let a = Record::new(json!({ "name": "a" }));
        let copy = Record::new(json!({ "name": "a" }));
        let alias = a.clone();

        assert!(a.same(&alias));
        assert!(!a.same(&copy));
    }

    #[test]
    fn test_same_key() {
        let a = Record::new(json!({ "id": 7, "name": "a" }));
        let copy = Record::new(json!({ "id": 7, "name": "changed" }));
        let other = Record::new(json!({ "id": 8 }));

        assert!(a.same_key(&copy, "id"));
        assert!(!a.same_key(&other, "id"));
        assert!(!a.same_key(&copy, "missing"));
    }

    #[test]
    fn test_write_is_visible_through_aliases() {
        let a = Record::new(json!({ "seconds": 1 }));
        let alias = a.clone();
        let path = DataPath::parse("seconds").unwrap();

        a.write(&path, json!(42)).unwrap();
        assert_eq!(alias.lookup(&path), Some(json!(42)));
    }
}

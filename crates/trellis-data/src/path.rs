//! Data Paths
//!
//! Dot-separated keys (`itemObject.seconds`, `rows.0.title`) into JSON
//! values. Numeric segments index arrays.

use std::fmt;

use serde_json::{Map, Value};

use crate::{DataError, DataResult};

/// Parsed dot-path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// Parse a dot-separated path
    pub fn parse(raw: &str) -> DataResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DataError::EmptyPath);
        }

        let mut segments = Vec::new();
        for segment in raw.split('.') {
            if segment.is_empty() {
                return Err(DataError::EmptySegment { path: raw.to_string() });
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// First segment
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// Path without its first segment, `None` for single-segment paths
    pub fn rest(&self) -> Option<DataPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self { segments: self.segments[1..].to_vec() })
    }

    /// Path prefixed with one more segment
    pub fn prefixed(&self, segment: &str) -> DataPath {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(segment.to_string());
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// All segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; parsing rejects empty paths
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Look the path up inside `value`
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `new` at the path inside `value`.
    ///
    /// Missing object keys along the way are created as empty objects.
    /// Array segments must address an existing element.
    pub fn set(&self, value: &mut Value, new: Value) -> DataResult<()> {
        let (last, parents) = match self.segments.split_last() {
            Some(split) => split,
            None => return Err(DataError::EmptyPath),
        };

        let mut current = value;
        for segment in parents {
            current = descend_mut(current, segment)?;
        }

        match current {
            Value::Object(map) => {
                map.insert(last.clone(), new);
                Ok(())
            }
            Value::Array(items) => {
                let index = parse_index(last)?;
                let slot = items.get_mut(index).ok_or_else(|| DataError::IndexOutOfBounds {
                    segment: last.clone(),
                    index,
                })?;
                *slot = new;
                Ok(())
            }
            _ => Err(DataError::NotAContainer { segment: last.clone() }),
        }
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

fn descend_mut<'a>(current: &'a mut Value, segment: &str) -> DataResult<&'a mut Value> {
    match current {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index = parse_index(segment)?;
            items.get_mut(index).ok_or_else(|| DataError::IndexOutOfBounds {
                segment: segment.to_string(),
                index,
            })
        }
        _ => Err(DataError::NotAContainer { segment: segment.to_string() }),
    }
}

fn parse_index(segment: &str) -> DataResult<usize> {
    segment
        .parse::<usize>()
        .map_err(|_| DataError::NotAContainer { segment: segment.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(DataPath::parse(""), Err(DataError::EmptyPath));
        assert!(matches!(DataPath::parse("a..b"), Err(DataError::EmptySegment { .. })));
    }

    #[test]
    fn test_get_nested_and_indexed() {
        let value = json!({ "rows": [{ "title": "first" }, { "title": "second" }] });
        let path = DataPath::parse("rows.1.title").unwrap();
        assert_eq!(path.get(&value), Some(&json!("second")));

        let missing = DataPath::parse("rows.5.title").unwrap();
        assert_eq!(missing.get(&value), None);
    }

    #[test]
    fn test_rest_and_prefixed() {
        let path = DataPath::parse("itemObject.seconds").unwrap();
        assert_eq!(path.first(), "itemObject");
        assert_eq!(path.rest().unwrap().to_string(), "seconds");
        assert!(DataPath::parse("seconds").unwrap().rest().is_none());
        assert_eq!(path.prefixed("home").to_string(), "home.itemObject.seconds");
    }

    #[test]
    fn test_set_creates_missing_objects() {
        let mut value = json!({});
        DataPath::parse("a.b").unwrap().set(&mut value, json!(3)).unwrap();
        assert_eq!(value, json!({ "a": { "b": 3 } }));
    }

    #[test]
    fn test_set_into_scalar_fails() {
        let mut value = json!({ "a": 1 });
        let err = DataPath::parse("a.b").unwrap().set(&mut value, json!(3));
        assert!(matches!(err, Err(DataError::NotAContainer { .. })));
    }
}

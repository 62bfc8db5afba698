//! Resolver Configuration

use serde::{Deserialize, Serialize};

/// What to do with a `data-added` index past the end of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexPolicy {
    /// Report the event and leave the list untouched
    #[default]
    Reject,
    /// Append the record at the end
    Clamp,
}

/// Resolver configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Handling of sparse or out-of-order `data-added` indices
    pub index_policy: IndexPolicy,

    /// Record field used as a stable identifier when matching removals.
    /// `None` matches by record identity.
    pub record_key: Option<String>,

    /// Maximum page-in-page nesting depth
    pub max_page_depth: usize,

    /// `type` of a textBoard segment that marks a line break
    pub break_marker: String,

    /// `display` style given to textBoard segment labels
    pub segment_display: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            index_policy: IndexPolicy::Reject,
            record_key: None,
            max_page_depth: 16,
            break_marker: "br".to_string(),
            segment_display: "inline-block".to_string(),
        }
    }
}

impl ResolverConfig {
    /// Load from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ResolverConfig::from_json(r#"{ "indexPolicy": "clamp", "recordKey": "id" }"#).unwrap();

        assert_eq!(config.index_policy, IndexPolicy::Clamp);
        assert_eq!(config.record_key.as_deref(), Some("id"));
        assert_eq!(config.max_page_depth, 16);
        assert_eq!(config.break_marker, "br");
    }
}

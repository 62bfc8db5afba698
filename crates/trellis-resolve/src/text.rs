//! Text Segment Expander
//!
//! A label's `textBoard` becomes a run of inline label children with line
//! breaks between them.

use std::rc::Rc;

use serde_json::Value;
use trellis_tree::{ComponentKind, Descriptor, InstanceId, InstanceTree};

use crate::{ColorFormatter, ConsumerContext, ResolveError, ResolveResult, Resolver, ResolverConfig};

/// JSON type name, for diagnostics
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_break(segment: &Value, marker: &str) -> bool {
    match segment {
        Value::String(s) => s == "\n",
        Value::Object(map) => map.get("type").and_then(Value::as_str) == Some(marker),
        _ => false,
    }
}

/// Descriptor for one segment, `None` when the segment is malformed
pub(crate) fn segment_descriptor(
    segment: &Value,
    config: &ResolverConfig,
    color: &dyn ColorFormatter,
) -> Option<Descriptor> {
    if is_break(segment, &config.break_marker) {
        return Some(Descriptor::new(ComponentKind::LineBreak));
    }

    let map = segment.as_object()?;
    let text = map.get("text").and_then(Value::as_str).unwrap_or_default();
    let mut label = Descriptor::new(ComponentKind::Label)
        .with_style("display", config.segment_display.as_str())
        .with_text(text);

    if let Some(raw) = map.get("color") {
        match color.format(raw) {
            Some(formatted) => label = label.with_style("color", formatted),
            None => tracing::debug!(color = %raw, "segment color not understood"),
        }
    }
    Some(label)
}

impl Resolver {
    /// Expand the text board, then resolve any static children after it
    pub(crate) fn expand_label(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        desc: &Descriptor,
        cx: &ConsumerContext,
    ) -> ResolveResult<()> {
        self.expand_board(tree, id, desc, cx)?;
        self.resolve_children(tree, id, &desc.children, cx).map(drop)
    }

    fn expand_board(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        desc: &Descriptor,
        cx: &ConsumerContext,
    ) -> ResolveResult<()> {
        let Some(board) = &desc.text_board else {
            return Ok(());
        };
        if desc.text.is_some() {
            self.report(Some(id), ResolveError::ConflictingText);
            return Ok(());
        }

        let Some(segments) = board.as_array() else {
            let found = json_kind(board).to_string();
            self.report(Some(id), ResolveError::MalformedTextBoard { found });
            return Ok(());
        };

        for (index, segment) in segments.iter().enumerate() {
            let Some(child) = segment_descriptor(segment, self.config(), self.color()) else {
                self.report(Some(id), ResolveError::MalformedSegment { index });
                continue;
            };
            let child = self.build(tree, Rc::new(child), cx)?;
            tree.append_child(id, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CssColor;
    use serde_json::json;

    #[test]
    fn test_break_markers() {
        let config = ResolverConfig::default();
        for segment in [json!({ "type": "br" }), json!("\n")] {
            let desc = segment_descriptor(&segment, &config, &CssColor).unwrap();
            assert_eq!(desc.kind, ComponentKind::LineBreak);
        }
    }

    #[test]
    fn test_custom_break_marker() {
        let config = ResolverConfig { break_marker: "newline".into(), ..Default::default() };
        let desc = segment_descriptor(&json!({ "type": "newline" }), &config, &CssColor).unwrap();
        assert_eq!(desc.kind, ComponentKind::LineBreak);

        let desc = segment_descriptor(&json!({ "type": "br" }), &config, &CssColor).unwrap();
        assert_eq!(desc.kind, ComponentKind::Label);
    }

    #[test]
    fn test_segment_label() {
        let config = ResolverConfig::default();
        let desc = segment_descriptor(&json!({ "text": "Hi", "color": [255, 0, 0] }), &config, &CssColor).unwrap();

        assert_eq!(desc.kind, ComponentKind::Label);
        assert_eq!(desc.text.as_deref(), Some("Hi"));
        assert_eq!(desc.style.get("display"), Some(&json!("inline-block")));
        assert_eq!(desc.style.get("color"), Some(&json!("rgb(255, 0, 0)")));
    }

    #[test]
    fn test_segment_defaults_to_empty_text() {
        let desc = segment_descriptor(&json!({}), &ResolverConfig::default(), &CssColor).unwrap();
        assert_eq!(desc.text.as_deref(), Some(""));
        assert!(!desc.style.contains_key("color"));
    }

    #[test]
    fn test_malformed_segments() {
        let config = ResolverConfig::default();
        assert!(segment_descriptor(&json!(3), &config, &CssColor).is_none());
        assert!(segment_descriptor(&json!("plain"), &config, &CssColor).is_none());
        assert_eq!(json_kind(&json!({})), "object");
    }
}

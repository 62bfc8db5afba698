//! Page Sandbox
//!
//! A page instance embeds another page specification with its own viewport
//! and data scope. Its `subtree-resolved` notification is deferred to a
//! later scheduler turn so listeners attached right after resolution still
//! observe it.

use trellis_data::{parse_px, Axis, Viewport};
use trellis_tree::{Descriptor, InstanceId, InstanceTree, PagePhase, PageSlot, Style, TreeError};

use crate::context::PageScope;
use crate::scheduler::DeferredTask;
use crate::{ConsumerContext, ResolveError, ResolveResult, Resolver};

/// Viewport of a page inside `enclosing`.
///
/// Each axis inherits from `enclosing` unless the style sets it. Style
/// values that are not pixel lengths are returned as errors and the axis
/// inherits.
pub fn page_viewport(style: &Style, enclosing: Viewport, path: &str) -> (Viewport, Vec<ResolveError>) {
    let mut viewport = enclosing;
    let mut errors = Vec::new();

    for axis in Axis::ALL {
        let Some(raw) = style.get(axis.as_str()) else {
            continue;
        };
        match parse_px(raw) {
            Ok(px) => viewport.set_axis(axis, px),
            Err(source) => errors.push(ResolveError::InvalidViewport {
                path: path.to_string(),
                axis: axis.as_str(),
                source,
            }),
        }
    }
    (viewport, errors)
}

/// Nesting depth a page resolved in `cx` would have
fn depth_in(cx: &ConsumerContext) -> usize {
    cx.page().map_or(0, |page| page.depth) + 1
}

impl Resolver {
    /// Reject a page descriptor before any instance is created for it
    pub(crate) fn check_page(&self, desc: &Descriptor, cx: &ConsumerContext) -> ResolveResult<()> {
        let path = match desc.path.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => return Err(ResolveError::MissingPagePath),
        };

        let max = self.config().max_page_depth;
        if depth_in(cx) > max {
            return Err(ResolveError::PageDepthExceeded { path: path.to_string(), max });
        }
        Ok(())
    }

    pub(crate) fn expand_page(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        desc: &Descriptor,
        cx: &ConsumerContext,
    ) -> ResolveResult<()> {
        let path = desc.path.as_deref().ok_or(ResolveError::MissingPagePath)?;

        let (viewport, problems) = page_viewport(&desc.style, cx.viewport(), path);
        for problem in problems {
            self.report(Some(id), problem);
        }

        tree.get_mut(id).ok_or(TreeError::NotFound(id))?.set_page(PageSlot {
            path: path.to_string(),
            viewport,
            found: false,
            phase: PagePhase::Resolving,
        });

        let found = match cx.store().fetch_page(path) {
            Some(spec) => {
                let name = if spec.name.is_empty() { path } else { spec.name.as_str() };
                let inner = cx.enter_page(PageScope {
                    name: name.to_string(),
                    viewport,
                    depth: depth_in(cx),
                    instance: Some(id),
                });
                let children = self.resolve_children(tree, id, &spec.components, &inner)?;
                tracing::info!(
                    page = %id,
                    path,
                    width = viewport.width,
                    height = viewport.height,
                    children = children.len(),
                    "page resolved"
                );
                true
            }
            None => {
                self.report(Some(id), ResolveError::PageNotFound { path: path.to_string() });
                false
            }
        };

        if let Some(slot) = tree.get_mut(id).and_then(|page| page.page_mut()) {
            slot.found = found;
            slot.phase = PagePhase::ResolvedNotAnnounced;
        }
        self.defer(DeferredTask::AnnouncePage(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_data::DataError;

    fn style(entries: &[(&str, serde_json::Value)]) -> Style {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_inherits_both_axes() {
        let enclosing = Viewport::new(375.0, 667.0);
        let (viewport, errors) = page_viewport(&Style::new(), enclosing, "Cereal");
        assert_eq!(viewport, enclosing);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_axes_independent() {
        let enclosing = Viewport::new(375.0, 667.0);
        let (viewport, _) = page_viewport(&style(&[("height", json!("200px"))]), enclosing, "Cereal");
        assert_eq!(viewport, Viewport::new(375.0, 200.0));

        let (viewport, _) = page_viewport(&style(&[("width", json!(120))]), enclosing, "Cereal");
        assert_eq!(viewport, Viewport::new(120.0, 667.0));
    }

    #[test]
    fn test_invalid_length_inherits() {
        let enclosing = Viewport::new(375.0, 667.0);
        let (viewport, errors) =
            page_viewport(&style(&[("width", json!("wide")), ("height", json!("50"))]), enclosing, "Cereal");

        assert_eq!(viewport, Viewport::new(375.0, 50.0));
        assert_eq!(
            errors,
            vec![ResolveError::InvalidViewport {
                path: "Cereal".into(),
                axis: "width",
                source: DataError::InvalidLength { raw: "wide".into() },
            }]
        );
    }
}

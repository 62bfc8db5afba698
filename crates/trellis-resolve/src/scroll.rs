//! Scroll Container Expansion

use trellis_tree::{Descriptor, InstanceId, InstanceTree};

use crate::{ConsumerContext, ResolveResult, Resolver};

impl Resolver {
    /// Resolve every static child of a scroll container and pin it to
    /// `position: relative` so it scrolls with the content.
    pub(crate) fn expand_scroll(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        desc: &Descriptor,
        cx: &ConsumerContext,
    ) -> ResolveResult<()> {
        for child in self.resolve_children(tree, id, &desc.children, cx)? {
            tree.set_style(child, "position", "relative")?;
        }
        Ok(())
    }
}

//! Blueprint Extractor
//!
//! The template every item of a list is stamped from.

use std::rc::Rc;

use trellis_tree::{ComponentKind, Descriptor};

/// Derive the item template of a list descriptor.
///
/// Plain lists use their first child. Chat lists use their first `chatItem`
/// child, retyped as a generic `listItem`. `None` when no child qualifies.
pub fn extract_blueprint(list: &Descriptor) -> Option<Rc<Descriptor>> {
    match list.kind {
        ComponentKind::ChatList => {
            let chat_item = list.children.iter().find(|c| c.kind == ComponentKind::ChatItem)?;
            let mut blueprint = Descriptor::clone(chat_item);
            blueprint.kind = ComponentKind::ListItem;
            Some(Rc::new(blueprint))
        }
        _ => list.children.first().cloned(),
    }
}

//! Node resolution: from a context selection to the nodes a field reads

use crate::schema::{Accessor, FieldDescriptor, How};
use crate::selection::Selection;

/// Reader forced on fields narrowed to a text node
static TEXT_NODE_CONTENT: How = How::Builtin(Accessor::Text);

/// Scope of a field: its selector queried inside `context`, or `context` itself
pub(crate) fn scope<'a>(context: &Selection<'a>, field: &FieldDescriptor) -> Selection<'a> {
    match field.selector.as_deref() {
        Some(selector) => context.find(selector),
        None => context.clone(),
    }
}

/// Selection narrowed by `eq`, `texteq` and `closest`, plus the reader to use on it
pub(crate) struct Narrowed<'a, 'f> {
    pub selection: Selection<'a>,
    pub how: &'f How,
}

/// Apply index, text-node and ancestor narrowing, in that order
pub(crate) fn narrow<'a, 'f>(scope: Selection<'a>, field: &'f FieldDescriptor) -> Narrowed<'a, 'f> {
    let mut selection = scope;
    let mut how = &field.how;

    if let Some(index) = field.eq {
        selection = selection.eq(index);
    }

    if let Some(index) = field.texteq {
        selection = selection.text_child(index);
        how = &TEXT_NODE_CONTENT;
    }

    if let Some(closest) = field.closest.as_deref() {
        selection = selection.closest(closest);
    }

    Narrowed { selection, how }
}

//! Scalar value extraction

use serde_json::Value;

use crate::schema::{Accessor, FieldDescriptor, How};
use crate::selection::Selection;

/// Read, trim and convert the value of a resolved scalar field
///
/// Missing values come back as an empty string; this never fails.
pub(crate) fn extract_value(
    selection: &Selection<'_>,
    how: &How,
    field: &FieldDescriptor,
) -> Value {
    let value = match read(selection, how) {
        Value::Null => Value::String(String::new()),
        Value::String(text) if field.trim_value => Value::String(text.trim().to_string()),
        value => value,
    };

    match &field.convert {
        Some(convert) => convert.apply(value, selection),
        None => value,
    }
}

fn read(selection: &Selection<'_>, how: &How) -> Value {
    let raw = match how {
        How::Custom(reader) => return reader(selection),
        How::Attribute(name) => selection.attr(name),
        How::Builtin(Accessor::Text) => Some(selection.text()),
        How::Builtin(Accessor::Html) => selection.html(),
        How::Builtin(Accessor::OuterHtml) => selection.outer_html(),
        How::Builtin(Accessor::Val) => selection.val(),
    };

    raw.map(Value::String).unwrap_or(Value::Null)
}

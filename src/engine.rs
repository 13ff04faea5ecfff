//! Schema-driven extraction
//!
//! Walks a [`Schema`] against a document, resolving every field to a scalar,
//! a nested object or a list, and assembles the result in field declaration
//! order.

use scraper::Html;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{Result, ScrapeError};
use crate::resolve::{narrow, scope};
use crate::schema::{FieldDescriptor, Schema};
use crate::selection::Selection;
use crate::value::extract_value;

/// Field name to extracted value, in schema declaration order
pub type ExtractionResult = Map<String, Value>;

/// Parse `html` and extract `schema` from it
pub fn scrape_html(html: &str, schema: &Schema) -> Result<ExtractionResult> {
    let document = Html::parse_document(html);
    scrape_document(&document, schema)
}

/// Extract `schema` from an already parsed document
pub fn scrape_document(document: &Html, schema: &Schema) -> Result<ExtractionResult> {
    extract(schema, &Selection::document(document), true)
}

/// Extract every field of `schema` within `context`
///
/// At the root (`is_root`) each field must select its own scope with a
/// selector or list item; nested fields may inherit the context instead.
pub fn extract(schema: &Schema, context: &Selection<'_>, is_root: bool) -> Result<ExtractionResult> {
    let mut record = Map::new();

    for (name, def) in schema.iter() {
        let field = def.normalize(name);

        if is_root && !field.is_scoped() {
            return Err(ScrapeError::NoElementSelected {
                field: field.name.clone(),
                descriptor: Box::new(field),
            });
        }

        trace!(field = %field.name, "extracting field");
        let value = extract_field(&field, context)?;
        record.insert(field.name, value);
    }

    Ok(record)
}

fn extract_field(field: &FieldDescriptor, context: &Selection<'_>) -> Result<Value> {
    let scope = scope(context, field);

    if let Some(list_item) = field.list_item.as_deref() {
        return extract_list(field, &scope.find(list_item));
    }

    let narrowed = narrow(scope, field);

    if !field.data.is_empty() {
        let record = extract(&field.data, &narrowed.selection, false)?;
        return Ok(Value::Object(record));
    }

    Ok(extract_value(&narrowed.selection, narrowed.how, field))
}

/// One entry per item; an empty sub-schema yields bare scalars
fn extract_list(field: &FieldDescriptor, items: &Selection<'_>) -> Result<Value> {
    debug!(field = %field.name, items = items.len(), "extracting list");

    let scalar_item = FieldDescriptor::default();
    let mut values = Vec::with_capacity(items.len());

    for item in items.items() {
        let value = if field.data.is_empty() {
            extract_value(&item, &scalar_item.how, &scalar_item)
        } else {
            Value::Object(extract(&field.data, &item, false)?)
        };

        values.push(match &field.convert {
            Some(convert) => convert.apply(value, &item),
            None => value,
        });
    }

    Ok(Value::Array(values))
}

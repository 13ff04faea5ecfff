//! Extraction schemas and field normalization
//!
//! A [`Schema`] maps field names to raw [`FieldDef`]s, either a bare selector
//! string or a [`FieldOptions`] object. Before a field is evaluated it is
//! normalized into a [`FieldDescriptor`] with every default filled in.
//!
//! Schemas can be built in code, where closures may be attached through
//! [`FieldOptions::how_with`] and [`FieldOptions::convert_with`], or
//! deserialized from JSON:
//!
//! ```json
//! {
//!   "title": "h1",
//!   "avatar": { "selector": ".profile img", "attr": "src" },
//!   "articles": {
//!     "listItem": ".article",
//!     "data": { "title": "a.title", "price": { "selector": ".price", "convert": "parse_price" } }
//!   }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ScrapeError;
use crate::selection::Selection;
use crate::transform::Transform;

/// Custom reader producing a raw value from a resolved selection
pub type Reader = Arc<dyn Fn(&Selection<'_>) -> Value + Send + Sync>;

/// Custom conversion of an extracted value, given the selection it came from
pub type Converter = Arc<dyn Fn(Value, &Selection<'_>) -> Value + Send + Sync>;

/// Built-in content accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Accessor {
    #[default]
    Text,
    Html,
    OuterHtml,
    Val,
}

/// How a scalar field reads its value
#[derive(Clone)]
pub enum How {
    Builtin(Accessor),
    Attribute(String),
    Custom(Reader),
}

impl Default for How {
    fn default() -> Self {
        How::Builtin(Accessor::Text)
    }
}

impl fmt::Debug for How {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            How::Builtin(accessor) => f.debug_tuple("Builtin").field(accessor).finish(),
            How::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            How::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

impl<'de> Deserialize<'de> for How {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Accessor::deserialize(deserializer).map(How::Builtin)
    }
}

/// Final conversion applied to a scalar or list item value
#[derive(Clone)]
pub enum Convert {
    Named(Transform),
    Custom(Converter),
}

impl Convert {
    pub fn apply(&self, value: Value, selection: &Selection<'_>) -> Value {
        match self {
            Convert::Named(transform) => transform.apply(value),
            Convert::Custom(convert) => convert(value, selection),
        }
    }
}

impl fmt::Debug for Convert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convert::Named(transform) => f.debug_tuple("Named").field(transform).finish(),
            Convert::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

impl<'de> Deserialize<'de> for Convert {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Transform::deserialize(deserializer).map(Convert::Named)
    }
}

/// Field options as written by the caller; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldOptions {
    /// Selector evaluated inside the current context
    #[serde(default)]
    pub selector: Option<String>,
    /// Selector marking repeated items; turns the field into a list
    #[serde(default)]
    pub list_item: Option<String>,
    /// Sub-schema for nested objects and list items
    #[serde(default)]
    pub data: Option<Schema>,
    #[serde(default)]
    pub how: Option<How>,
    /// Attribute to read; overrides `how`
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub trim_value: Option<bool>,
    /// Ancestor selector the resolved node is narrowed to
    #[serde(default)]
    pub closest: Option<String>,
    /// 0-based index among the matched elements
    #[serde(default)]
    pub eq: Option<usize>,
    /// 0-based index among the direct text children
    #[serde(default)]
    pub texteq: Option<usize>,
    #[serde(default)]
    pub convert: Option<Convert>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn list_item(mut self, list_item: impl Into<String>) -> Self {
        self.list_item = Some(list_item.into());
        self
    }

    pub fn data(mut self, data: Schema) -> Self {
        self.data = Some(data);
        self
    }

    pub fn how(mut self, accessor: Accessor) -> Self {
        self.how = Some(How::Builtin(accessor));
        self
    }

    pub fn how_with<F>(mut self, reader: F) -> Self
    where
        F: Fn(&Selection<'_>) -> Value + Send + Sync + 'static,
    {
        self.how = Some(How::Custom(Arc::new(reader)));
        self
    }

    pub fn attr(mut self, attr: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self
    }

    pub fn trim_value(mut self, trim_value: bool) -> Self {
        self.trim_value = Some(trim_value);
        self
    }

    pub fn closest(mut self, closest: impl Into<String>) -> Self {
        self.closest = Some(closest.into());
        self
    }

    pub fn eq(mut self, index: usize) -> Self {
        self.eq = Some(index);
        self
    }

    pub fn texteq(mut self, index: usize) -> Self {
        self.texteq = Some(index);
        self
    }

    pub fn convert(mut self, transform: Transform) -> Self {
        self.convert = Some(Convert::Named(transform));
        self
    }

    pub fn convert_with<F>(mut self, convert: F) -> Self
    where
        F: Fn(Value, &Selection<'_>) -> Value + Send + Sync + 'static,
    {
        self.convert = Some(Convert::Custom(Arc::new(convert)));
        self
    }
}

/// Raw field definition: selector shorthand or full options
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldDef {
    Selector(String),
    Options(Box<FieldOptions>),
}

impl From<&str> for FieldDef {
    fn from(selector: &str) -> Self {
        FieldDef::Selector(selector.to_string())
    }
}

impl From<String> for FieldDef {
    fn from(selector: String) -> Self {
        FieldDef::Selector(selector)
    }
}

impl From<FieldOptions> for FieldDef {
    fn from(options: FieldOptions) -> Self {
        FieldDef::Options(Box::new(options))
    }
}

impl FieldDef {
    /// Fill in defaults, producing a fresh descriptor for field `name`
    ///
    /// `attr` always replaces `how` with an attribute reader; otherwise an
    /// explicit `how` wins over the `text` default. Empty selector strings
    /// count as absent.
    pub fn normalize(&self, name: &str) -> FieldDescriptor {
        let options = match self {
            FieldDef::Selector(selector) => {
                return FieldDescriptor {
                    name: name.to_string(),
                    selector: non_empty(Some(selector)),
                    ..FieldDescriptor::default()
                };
            }
            FieldDef::Options(options) => options,
        };

        let attr = non_empty(options.attr.as_ref());
        let how = match &attr {
            Some(attr) => How::Attribute(attr.clone()),
            None => options.how.clone().unwrap_or_default(),
        };

        FieldDescriptor {
            name: name.to_string(),
            selector: non_empty(options.selector.as_ref()),
            list_item: non_empty(options.list_item.as_ref()),
            data: options.data.clone().unwrap_or_default(),
            how,
            attr,
            trim_value: options.trim_value.unwrap_or(true),
            closest: non_empty(options.closest.as_ref()),
            eq: options.eq,
            texteq: options.texteq,
            convert: options.convert.clone(),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

/// Canonical field with all defaults applied
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub selector: Option<String>,
    pub list_item: Option<String>,
    pub data: Schema,
    pub how: How,
    pub attr: Option<String>,
    pub trim_value: bool,
    pub closest: Option<String>,
    pub eq: Option<usize>,
    pub texteq: Option<usize>,
    pub convert: Option<Convert>,
}

impl Default for FieldDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            selector: None,
            list_item: None,
            data: Schema::new(),
            how: How::default(),
            attr: None,
            trim_value: true,
            closest: None,
            eq: None,
            texteq: None,
            convert: None,
        }
    }
}

impl FieldDescriptor {
    /// Whether the field selects its own scope instead of inheriting one
    pub fn is_scoped(&self) -> bool {
        self.selector.is_some() || self.list_item.is_some()
    }
}

/// Ordered mapping of field names to field definitions
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldDef)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schema from JSON, keeping field declaration order
    pub fn from_json(json: &str) -> Result<Self, ScrapeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder form of [`Schema::insert`]
    pub fn field(mut self, name: impl Into<String>, def: impl Into<FieldDef>) -> Self {
        self.insert(name, def);
        self
    }

    /// Add a field; redefining a name replaces it in its original position
    pub fn insert(&mut self, name: impl Into<String>, def: impl Into<FieldDef>) {
        let name = name.into();
        let def = def.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = def,
            None => self.fields.push((name, def)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, def)| def)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N, D> FromIterator<(N, D)> for Schema
where
    N: Into<String>,
    D: Into<FieldDef>,
{
    fn from_iter<I: IntoIterator<Item = (N, D)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (name, def) in iter {
            schema.insert(name, def);
        }
        schema
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field definitions")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Schema, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut schema = Schema::new();
                while let Some((name, def)) = access.next_entry::<String, FieldDef>()? {
                    schema.insert(name, def);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_shorthand() {
        let field = FieldDef::from("h1.title").normalize("title");

        assert_eq!(field.name, "title");
        assert_eq!(field.selector.as_deref(), Some("h1.title"));
        assert!(matches!(field.how, How::Builtin(Accessor::Text)));
        assert!(field.trim_value);
        assert!(field.data.is_empty());
        assert!(field.closest.is_none());
        assert!(field.convert.is_none());
    }

    #[test]
    fn test_attr_overrides_explicit_how() {
        let def = FieldDef::from(
            FieldOptions::new()
                .selector("img")
                .how(Accessor::Html)
                .attr("src"),
        );

        match def.normalize("src").how {
            How::Attribute(name) => assert_eq!(name, "src"),
            other => panic!("expected attribute reader, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_how_wins_over_default() {
        let def = FieldDef::from(FieldOptions::new().selector("div").how(Accessor::Html));
        assert!(matches!(def.normalize("body").how, How::Builtin(Accessor::Html)));
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let def = FieldDef::from(
            FieldOptions::new()
                .selector("")
                .list_item("")
                .closest("")
                .attr(""),
        );
        let field = def.normalize("empty");

        assert!(!field.is_scoped());
        assert!(field.closest.is_none());
        assert!(matches!(field.how, How::Builtin(Accessor::Text)));
    }

    #[test]
    fn test_normalize_leaves_definition_untouched() {
        let options = FieldOptions::new().list_item("li");
        let def = FieldDef::from(options);
        let _ = def.normalize("items");

        match &def {
            FieldDef::Options(options) => assert!(options.data.is_none()),
            FieldDef::Selector(_) => unreachable!(),
        }
    }

    #[test]
    fn test_json_schema_keeps_order() {
        let schema = Schema::from_json(
            r#"{
                "zeta": "h1",
                "alpha": { "selector": "img", "attr": "src", "trimValue": false },
                "items": {
                    "listItem": "li",
                    "data": { "name": "span", "price": { "selector": ".price", "convert": "parse_price" } }
                }
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "items"]);

        let alpha = schema.get("alpha").unwrap().normalize("alpha");
        assert!(!alpha.trim_value);
        assert!(matches!(alpha.how, How::Attribute(ref name) if name == "src"));

        let items = schema.get("items").unwrap().normalize("items");
        assert_eq!(items.list_item.as_deref(), Some("li"));
        assert_eq!(items.data.len(), 2);
        let price = items.data.get("price").unwrap().normalize("price");
        assert!(matches!(
            price.convert,
            Some(Convert::Named(Transform::ParsePrice))
        ));
    }

    #[test]
    fn test_json_schema_rejects_unknown_keys() {
        let err = Schema::from_json(r#"{ "title": { "selektor": "h1" } }"#).unwrap_err();
        assert_eq!(err.code(), "INVALID_SCHEMA");
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let schema = Schema::new()
            .field("a", "h1")
            .field("b", "h2")
            .field("a", "h3");

        let fields: Vec<(&str, String)> = schema
            .iter()
            .map(|(name, def)| (name, def.normalize(name).selector.unwrap_or_default()))
            .collect();
        assert_eq!(fields, vec![("a", "h3".to_string()), ("b", "h2".to_string())]);
    }
}

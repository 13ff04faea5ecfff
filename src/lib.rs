//! Schema-driven structured data extraction from HTML
//!
//! Describe the data you want with a [`Schema`] of CSS selectors and get it
//! back as JSON, without writing traversal code:
//! - Scalar fields read text, markup, form values or attributes
//! - Nested objects group fields under a shared scope
//! - Lists repeat a sub-schema (or a bare value) for every matched item
//! - Index, text-node and ancestor narrowing pick the exact node to read
//!
//! Missing matches degrade to empty values; the only hard failure is a
//! root-level field that selects nothing at all.

pub mod engine;
pub mod error;
pub mod ffi;
pub mod fetch;
mod resolve;
pub mod schema;
pub mod selection;
pub mod transform;
mod value;

pub use engine::{extract, scrape_document, scrape_html, ExtractionResult};
pub use error::{Result, ScrapeError};
pub use ffi::*;
pub use fetch::{scrape, scrape_with, FetchOptions, ResponseMeta, ScrapeOutput};
pub use schema::{Accessor, Convert, FieldDef, FieldDescriptor, FieldOptions, How, Schema};
pub use selection::{Node, Selection};
pub use transform::Transform;

//! Error types

use thiserror::Error;

use crate::schema::FieldDescriptor;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A root-level field has neither a selector nor a list item selector
    #[error(
        "There is no element selected for the '{field}' field. Please provide a selector, \
         list item or use nested object structure."
    )]
    NoElementSelected {
        field: String,
        descriptor: Box<FieldDescriptor>,
    },

    #[error("Failed to parse schema JSON: {0}")]
    InvalidSchema(#[from] serde_json::Error),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("Failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: ureq::Error,
    },
}

impl ScrapeError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ScrapeError::NoElementSelected { .. } => "NO_ELEMENT_SELECTED",
            ScrapeError::InvalidSchema(_) => "INVALID_SCHEMA",
            ScrapeError::InvalidUrl { .. } => "INVALID_URL",
            ScrapeError::Fetch { .. } => "FETCH_FAILED",
            ScrapeError::Body { .. } => "BODY_UNREADABLE",
        }
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

//! Fetch a page and scrape it in one step
//!
//! The extraction itself never touches the network; this module only adds a
//! blocking GET in front of it and hands back the document, response details
//! and raw body alongside the extracted data.

use std::time::Duration;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::engine::{scrape_document, ExtractionResult};
use crate::error::{Result, ScrapeError};
use crate::schema::Schema;

/// HTTP settings for [`scrape`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("scrape_schema/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}

/// Transport details of the fetched page
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

/// Extracted data bundled with the document it came from
#[derive(Debug)]
pub struct ScrapeOutput {
    pub data: ExtractionResult,
    pub document: Html,
    pub response: ResponseMeta,
    pub body: String,
}

/// Build a blocking agent from `options`
pub fn agent(options: &FetchOptions) -> ureq::Agent {
    ureq::Agent::new_with_config(
        ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(options.timeout_secs)))
            .user_agent(options.user_agent.as_str())
            .build(),
    )
}

/// Fetch `url` with default options and extract `schema` from it
pub fn scrape(url: &str, schema: &Schema) -> Result<ScrapeOutput> {
    scrape_with(&agent(&FetchOptions::default()), url, schema)
}

/// Fetch `url` with `agent` and extract `schema` from it
pub fn scrape_with(agent: &ureq::Agent, url: &str, schema: &Schema) -> Result<ScrapeOutput> {
    let parsed = Url::parse(url).map_err(|source| ScrapeError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let response = agent.get(parsed.as_str()).call().map_err(|source| {
        warn!(url, error = %source, "fetch failed");
        ScrapeError::Fetch {
            url: url.to_string(),
            source,
        }
    })?;

    let meta = ResponseMeta {
        url: parsed.to_string(),
        status: response.status().as_u16(),
        headers: response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
    };

    let body = response
        .into_body()
        .read_to_string()
        .map_err(|source| ScrapeError::Body {
            url: url.to_string(),
            source,
        })?;
    debug!(url, status = meta.status, bytes = body.len(), "fetched page");

    let document = Html::parse_document(&body);
    let data = scrape_document(&document, schema)?;

    Ok(ScrapeOutput {
        data,
        document,
        response: meta,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options: FetchOptions = serde_json::from_str(r#"{ "timeoutSecs": 5 }"#).unwrap();
        assert_eq!(options.timeout_secs, 5);
        assert!(options.user_agent.starts_with("scrape_schema/"));
    }

    #[test]
    fn test_invalid_url_fails_before_fetching() {
        let schema = Schema::new().field("title", "h1");
        let err = scrape("not a url", &schema).unwrap_err();
        assert_eq!(err.code(), "INVALID_URL");
    }
}

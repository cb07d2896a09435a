//! Wikipedia article text via the MediaWiki action API
//!
//! Titles are looked up exactly: redirects are followed, but no search
//! suggestion is ever substituted for the requested title.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use tripex_core::{Result, SourceConfig, TextSource, TripexError};

/// Text source backed by a MediaWiki `api.php` endpoint
pub struct WikipediaSource {
    client: Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<Query>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct Query {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(default)]
    disambiguation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Link {
    title: String,
}

impl WikipediaSource {
    /// Create a source for the given `api.php` URL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TripexError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.wikipedia_url.clone(),
        })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Page> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| TripexError::Transport(format!("Wikipedia request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TripexError::Transport(format!(
                "Wikipedia returned {status}"
            )));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| TripexError::Transport(format!("Unexpected Wikipedia response: {e}")))?;

        if let Some(error) = body.error {
            return Err(TripexError::Transport(format!(
                "Wikipedia API error {}: {}",
                error.code, error.info
            )));
        }

        body.query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| TripexError::Transport("Wikipedia response has no pages".to_string()))
    }

    /// Titles linked from a disambiguation page
    async fn disambiguation_options(&self, title: &str) -> Vec<String> {
        let params = [
            ("prop", "links"),
            ("plnamespace", "0"),
            ("pllimit", "max"),
            ("titles", title),
        ];
        match self.query(&params).await {
            Ok(page) => page.links.into_iter().map(|l| l.title).collect(),
            Err(e) => {
                tracing::warn!(title, error = %e, "could not list disambiguation options");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl TextSource for WikipediaSource {
    async fn fetch(&self, title: &str) -> Result<String> {
        tracing::debug!(title, "fetching wikipedia article");

        let params = [
            ("prop", "extracts|pageprops"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
        ];
        let page = self.query(&params).await?;

        if page.missing || page.invalid {
            return Err(TripexError::NotFound(title.to_string()));
        }

        let is_disambiguation = page
            .pageprops
            .as_ref()
            .is_some_and(|p| p.disambiguation.is_some());
        if is_disambiguation {
            let options = self.disambiguation_options(&page.title).await;
            return Err(TripexError::AmbiguousTitle {
                title: title.to_string(),
                options,
            });
        }

        let text = page.extract.unwrap_or_default();
        tracing::info!(title, resolved = %page.title, chars = text.len(), "fetched article");
        Ok(text)
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}

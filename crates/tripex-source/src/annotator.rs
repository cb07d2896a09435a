//! Client for an external annotation service
//!
//! The service takes `{"text": ...}` on `POST /annotate` and answers with
//! token JSON (see [`Document::from_token_json`]).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use tripex_core::{AnnotatorConfig, Annotator, Document, Result, TripexError};

/// Annotator that delegates to an HTTP service
pub struct HttpAnnotator {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    text: &'a str,
}

impl HttpAnnotator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &AnnotatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TripexError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }
}

#[async_trait]
impl Annotator for HttpAnnotator {
    async fn annotate(&self, text: &str) -> Result<Document> {
        let url = format!("{}/annotate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&AnnotateRequest { text })
            .send()
            .await
            .map_err(|e| TripexError::Transport(format!("Annotator request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TripexError::Transport(format!(
                "Annotator error ({status}): {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TripexError::Transport(format!("Annotator response: {e}")))?;

        let doc = Document::from_token_json(&body)?;
        tracing::debug!(tokens = doc.len(), "annotated text");
        Ok(doc)
    }

    fn name(&self) -> &str {
        "http"
    }
}

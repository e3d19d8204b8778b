pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ProviderSettings;
use crate::error::{Error, Result};

/// Static description of a provider + model pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub provider: &'static str,
    pub model: String,
    pub dimensions: usize,
    /// The provider takes any number of texts in one `generate_embeddings` call.
    pub supports_unlimited_batch: bool,
}

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + fmt::Display {
    /// One vector per input text, in input order.
    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Pure lookup, no network access.
    fn model_info(&self) -> ModelInfo;
}

/// Reject an empty list or any blank text.
pub fn validate_texts(texts: &[String]) -> Result<()> {
    if texts.is_empty() {
        return Err(Error::Validation("text list cannot be empty".to_string()));
    }
    if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(Error::Validation(format!("text {i} cannot be empty")));
    }
    Ok(())
}

/// First entry whose fragment appears in `model` wins.
pub(crate) fn dimensions_for(model: &str, known: &[(&str, usize)], default: usize) -> usize {
    known
        .iter()
        .find(|(fragment, _)| model.contains(fragment))
        .map_or(default, |(_, dims)| *dims)
}

/// Connection state shared by the HTTP providers: credentials, model, the
/// endpoint root, and a client built on first use.
pub(crate) struct HttpBackend {
    label: &'static str,
    api_key: Secret<String>,
    model: String,
    base_url: String,
    client: OnceLock<reqwest::Client>,
}

impl HttpBackend {
    pub(crate) fn new(
        label: &'static str,
        settings: ProviderSettings,
        default_base_url: &str,
    ) -> Self {
        Self {
            label,
            api_key: settings.api_key,
            model: settings.model,
            base_url: settings
                .base_url
                .unwrap_or_else(|| default_base_url.to_string()),
            client: OnceLock::new(),
        }
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    fn client(&self) -> &reqwest::Client {
        self.client.get_or_init(build_http_client)
    }

    /// `path` must start with `/`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client().post(self.url(path))
    }

    /// Send, reject non-2xx statuses, and decode the JSON body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::provider(self.label, e))?;
        let response = check_status(self.label, response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::provider(self.label, e))
    }

    pub(crate) fn model_info(
        &self,
        known: &[(&str, usize)],
        default_dimensions: usize,
        supports_unlimited_batch: bool,
    ) -> ModelInfo {
        ModelInfo {
            provider: self.label,
            model: self.model.clone(),
            dimensions: dimensions_for(&self.model, known, default_dimensions),
            supports_unlimited_batch,
        }
    }
}

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to build HTTP client with timeouts, using default");
            reqwest::Client::default()
        })
}

/// Turn a non-2xx response into a provider error carrying the body.
async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::provider(provider, format!("API error {status}: {body}")))
}

pub(crate) fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(50).collect();
    if out.len() < text.len() {
        out.push_str("...");
    }
    out
}

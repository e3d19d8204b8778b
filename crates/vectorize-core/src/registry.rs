//! Name → provider factory.
//!
//! The registry is a plain value built once at startup and passed by
//! reference to whoever needs to construct providers.

use serde::Serialize;

use crate::config::{ProviderSettings, Settings};
use crate::embedding::anthropic::AnthropicEmbedding;
use crate::embedding::gemini::GeminiEmbedding;
use crate::embedding::openai::OpenAiEmbedding;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};

pub type Constructor = fn(ProviderSettings) -> Box<dyn EmbeddingProvider>;

pub struct ProviderEntry {
    pub name: &'static str,
    pub implementation: &'static str,
    pub description: &'static str,
    pub constructor: Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescription {
    pub name: &'static str,
    pub implementation: &'static str,
    pub description: &'static str,
}

pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    pub fn new(entries: Vec<ProviderEntry>) -> Self {
        Self { entries }
    }

    /// The OpenAI, Gemini and Anthropic providers, in that order.
    pub fn builtin() -> Self {
        Self::new(vec![
            ProviderEntry {
                name: "openai",
                implementation: "OpenAiEmbedding",
                description: "OpenAI embeddings API; embeds any number of texts per call.",
                constructor: |s| Box::new(OpenAiEmbedding::new(s)),
            },
            ProviderEntry {
                name: "gemini",
                implementation: "GeminiEmbedding",
                description: "Google Gemini embedContent API; one request per text.",
                constructor: |s| Box::new(GeminiEmbedding::new(s)),
            },
            ProviderEntry {
                name: "anthropic",
                implementation: "AnthropicEmbedding",
                description: "Anthropic embeddings API; one request per text.",
                constructor: |s| Box::new(AnthropicEmbedding::new(s)),
            },
        ])
    }

    pub fn list_supported(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn describe(&self, name: &str) -> Result<ProviderDescription> {
        let entry = self.lookup(name)?;
        Ok(ProviderDescription {
            name: entry.name,
            implementation: entry.implementation,
            description: entry.description,
        })
    }

    /// Build the named provider with credentials and model from `settings`.
    pub fn create(&self, name: &str, settings: &Settings) -> Result<Box<dyn EmbeddingProvider>> {
        let entry = self.lookup(name)?;

        let api_key = settings.api_key_for(entry.name).ok_or_else(|| {
            Error::Configuration(format!(
                "API key for {} not found in configuration ({}_API_KEY)",
                entry.name,
                entry.name.to_uppercase()
            ))
        })?;
        let model = settings.model_for(entry.name).ok_or_else(|| {
            Error::Configuration(format!(
                "model for {} not found in configuration ({}_EMBEDDING_MODEL)",
                entry.name,
                entry.name.to_uppercase()
            ))
        })?;

        let mut provider_settings = ProviderSettings::new(entry.name, api_key, model);
        if let Some(url) = settings.base_url_for(entry.name) {
            provider_settings = provider_settings.with_base_url(url);
        }

        let provider = (entry.constructor)(provider_settings);
        tracing::debug!(provider = entry.name, "created {provider}");
        Ok(provider)
    }

    fn lookup(&self, name: &str) -> Result<&ProviderEntry> {
        let wanted = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name == wanted)
            .ok_or_else(|| Error::UnsupportedProvider {
                name: wanted,
                supported: self.list_supported().into_iter().map(String::from).collect(),
            })
    }
}

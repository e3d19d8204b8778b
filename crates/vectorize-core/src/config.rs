use std::collections::BTreeMap;
use std::fmt;

use secrecy::Secret;

use crate::error::{Error, Result};

pub const PROVIDER_KEY: &str = "AI_PROVIDER";
pub const BATCH_SIZE_KEY: &str = "BATCH_SIZE";
pub const DEFAULT_PROVIDER: &str = "openai";

const API_KEY_SUFFIX: &str = "API_KEY";
const MODEL_SUFFIX: &str = "EMBEDDING_MODEL";
const BASE_URL_SUFFIX: &str = "BASE_URL";

const DEFAULTS: &[(&str, &str)] = &[
    (PROVIDER_KEY, DEFAULT_PROVIDER),
    ("OPENAI_EMBEDDING_MODEL", "text-embedding-ada-002"),
    ("GEMINI_EMBEDDING_MODEL", "embedding-001"),
    ("ANTHROPIC_EMBEDDING_MODEL", "text-embedding-3-small"),
    (BATCH_SIZE_KEY, "0"),
];

/// Run settings keyed the way they appear in the environment
/// (`AI_PROVIDER`, `<PROVIDER>_API_KEY`, `<PROVIDER>_EMBEDDING_MODEL`, ...).
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

/// API keys are shown as `[REDACTED]`.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if key.ends_with(API_KEY_SUFFIX) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            values: DEFAULTS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

impl Settings {
    /// Read recognized keys from the process environment on top of the defaults.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars().filter(|(k, _)| is_recognized(k)))
    }

    /// Build settings from explicit pairs on top of the defaults.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut settings = Self::default();
        for (k, v) in vars {
            settings.set(k, v);
        }
        settings
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn provider_name(&self) -> &str {
        self.get(PROVIDER_KEY).unwrap_or(DEFAULT_PROVIDER)
    }

    pub fn set_provider(&mut self, name: &str) {
        self.set(PROVIDER_KEY, name);
    }

    /// `0` means no explicit limit.
    pub fn batch_size(&self) -> Result<usize> {
        let raw = self.get(BATCH_SIZE_KEY).unwrap_or("0").trim();
        raw.parse::<usize>().map_err(|_| {
            Error::Configuration(format!(
                "{BATCH_SIZE_KEY} must be a non-negative integer, got '{raw}'"
            ))
        })
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.set(BATCH_SIZE_KEY, batch_size.to_string());
    }

    pub fn api_key_for(&self, provider: &str) -> Option<&str> {
        self.non_blank(&provider_key(provider, API_KEY_SUFFIX))
    }

    pub fn model_for(&self, provider: &str) -> Option<&str> {
        self.non_blank(&provider_key(provider, MODEL_SUFFIX))
    }

    pub fn set_model_for(&mut self, provider: &str, model: &str) {
        self.set(provider_key(provider, MODEL_SUFFIX), model);
    }

    pub fn base_url_for(&self, provider: &str) -> Option<&str> {
        self.non_blank(&provider_key(provider, BASE_URL_SUFFIX))
    }

    fn non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }
}

fn provider_key(provider: &str, suffix: &str) -> String {
    format!("{}_{suffix}", provider.to_uppercase())
}

fn is_recognized(key: &str) -> bool {
    key == PROVIDER_KEY
        || key == BATCH_SIZE_KEY
        || [API_KEY_SUFFIX, MODEL_SUFFIX, BASE_URL_SUFFIX]
            .iter()
            .any(|suffix| key.ends_with(&format!("_{suffix}")))
}

/// Everything a provider needs to talk to its backend. Immutable once built.
#[derive(Debug)]
pub struct ProviderSettings {
    pub name: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn new(name: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: Secret::new(api_key.into()),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ProviderSettings;
use crate::embedding::{EmbeddingProvider, HttpBackend, ModelInfo, validate_texts};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const LABEL: &str = "OpenAI";

/// Hard cap on `input` entries per request to `/v1/embeddings`.
const MAX_INPUTS_PER_REQUEST: usize = 2048;

const KNOWN_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-large", 3072),
    ("text-embedding-3-small", 1536),
    ("text-embedding-ada-002", 1536),
];

/// OpenAI embeddings. Accepts any number of texts per call.
pub struct OpenAiEmbedding {
    backend: HttpBackend,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Place each item at its `index`. Every slot in `0..expected` must be
/// filled exactly once.
fn order_by_index(data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::provider(
            LABEL,
            format!("expected {expected} embeddings, got {}", data.len()),
        ));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            Error::provider(
                LABEL,
                format!("embedding index {} out of range for {expected} inputs", item.index),
            )
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(Error::provider(
                LABEL,
                format!("duplicate embedding index {}", item.index),
            ));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| Error::provider(LABEL, format!("missing embedding for index {i}")))
        })
        .collect()
}

impl OpenAiEmbedding {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            backend: HttpBackend::new(LABEL, settings, DEFAULT_BASE_URL),
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = self
            .backend
            .post("/v1/embeddings")
            .bearer_auth(self.backend.api_key())
            .json(&EmbeddingRequest {
                model: self.backend.model(),
                input: texts,
            });
        let resp: EmbeddingResponse = self.backend.send(request).await?;
        order_by_index(resp.data, texts.len())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        validate_texts(texts)?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for part in texts.chunks(MAX_INPUTS_PER_REQUEST) {
            tracing::debug!(
                count = part.len(),
                model = %self.backend.model(),
                "requesting OpenAI embeddings"
            );
            embeddings.extend(self.request(part).await?);
        }
        Ok(embeddings)
    }

    fn model_info(&self) -> ModelInfo {
        self.backend.model_info(KNOWN_MODELS, 1536, true)
    }
}

impl fmt::Display for OpenAiEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenAiEmbedding(model={})", self.backend.model())
    }
}

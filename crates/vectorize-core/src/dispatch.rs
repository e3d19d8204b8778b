use crate::embedding::{EmbeddingProvider, ModelInfo, validate_texts};
use crate::error::{Error, Result};
use crate::record::Record;

/// Chunk size used when the provider can't take everything at once and the
/// caller didn't ask for a specific size.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPlan {
    /// Every text in a single `generate_embeddings` call.
    Single,
    /// Consecutive chunks of this many texts, one call each.
    Chunked(usize),
}

impl BatchPlan {
    /// `requested == 0` means no explicit limit.
    pub fn for_model(info: &ModelInfo, requested: usize) -> Self {
        if info.supports_unlimited_batch && requested == 0 {
            BatchPlan::Single
        } else if requested > 0 {
            BatchPlan::Chunked(requested)
        } else {
            BatchPlan::Chunked(DEFAULT_BATCH_SIZE)
        }
    }

    pub fn batch_count(&self, len: usize) -> usize {
        match self {
            BatchPlan::Single => usize::from(len > 0),
            BatchPlan::Chunked(size) => len.div_ceil(*size),
        }
    }
}

/// Embed every record's content and return copies carrying `embedding`,
/// in input order. The first failure aborts the run with no partial output.
pub async fn process(
    provider: &dyn EmbeddingProvider,
    records: &[Record],
    requested_batch_size: usize,
) -> Result<Vec<Record>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = records.iter().map(|r| r.content().to_string()).collect();
    validate_texts(&texts)?;

    let plan = BatchPlan::for_model(&provider.model_info(), requested_batch_size);
    let mut result = Vec::with_capacity(records.len());

    match plan {
        BatchPlan::Single => {
            tracing::info!("Processing all {} items at once", records.len());
            embed_into(provider, records, &texts, &mut result).await?;
        }
        BatchPlan::Chunked(size) => {
            let total = plan.batch_count(records.len());
            for (i, (batch, batch_texts)) in records.chunks(size).zip(texts.chunks(size)).enumerate() {
                tracing::info!("Processing batch {}/{} ({} items)", i + 1, total, batch.len());
                embed_into(provider, batch, batch_texts, &mut result).await?;
            }
        }
    }

    Ok(result)
}

async fn embed_into(
    provider: &dyn EmbeddingProvider,
    records: &[Record],
    texts: &[String],
    out: &mut Vec<Record>,
) -> Result<()> {
    let embeddings = provider.generate_embeddings(texts).await?;
    if embeddings.len() != records.len() {
        return Err(Error::provider(
            provider.model_info().provider,
            format!(
                "returned {} embeddings for {} texts",
                embeddings.len(),
                records.len()
            ),
        ));
    }
    out.extend(
        records
            .iter()
            .zip(embeddings)
            .map(|(record, embedding)| record.with_embedding(embedding)),
    );
    Ok(())
}

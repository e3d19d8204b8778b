use std::path::PathBuf;

use crate::dispatch;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::record::{load_records, save_records};

/// One load → embed → save run. Paths are used as given; callers resolve
/// bare names with [`crate::record::resolve_data_path`] first.
#[derive(Debug, Clone)]
pub struct EmbedJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// `0` means no explicit limit.
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub output: PathBuf,
}

pub async fn run(provider: &dyn EmbeddingProvider, job: &EmbedJob) -> Result<RunSummary> {
    tracing::info!(input = %job.input.display(), "Loading input data");
    let records = load_records(&job.input)?;
    tracing::info!("Loaded {} items", records.len());

    let embedded = dispatch::process(provider, &records, job.batch_size).await?;
    tracing::info!("Embeddings generated for {} items", embedded.len());

    save_records(&embedded, &job.output)?;
    tracing::info!(output = %job.output.display(), "Data saved");

    Ok(RunSummary {
        records: embedded.len(),
        output: job.output.clone(),
    })
}

//! Batching behaviour of `dispatch::process` against an in-memory provider
//! that records every batch it is handed.

use std::fmt;
use std::sync::Mutex;

use serde_json::json;

use vectorize_core::dispatch::{self, DEFAULT_BATCH_SIZE};
use vectorize_core::embedding::{EmbeddingProvider, ModelInfo};
use vectorize_core::error::{Error, Result};
use vectorize_core::record::{Record, parse_records};

struct RecordingProvider {
    unlimited: bool,
    fail_on_call: Option<usize>,
    short_response: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingProvider {
    fn new(unlimited: bool) -> Self {
        Self {
            unlimited,
            fail_on_call: None,
            short_response: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

fn fake_embedding(text: &str) -> Vec<f32> {
    vec![text.len() as f32, f32::from(text.as_bytes()[0])]
}

#[async_trait::async_trait]
impl EmbeddingProvider for RecordingProvider {
    async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(texts.to_vec());
            calls.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(Error::provider("Recording", "quota exceeded"));
        }
        let mut out: Vec<Vec<f32>> = texts.iter().map(|t| fake_embedding(t)).collect();
        if self.short_response {
            out.pop();
        }
        Ok(out)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "Recording",
            model: "fake".to_string(),
            dimensions: 2,
            supports_unlimited_batch: self.unlimited,
        }
    }
}

impl fmt::Display for RecordingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordingProvider(unlimited={})", self.unlimited)
    }
}

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record::new(format!("text {i}"), format!("doc-{i}")))
        .collect()
}

#[tokio::test]
async fn test_unlimited_provider_gets_one_call() {
    let provider = RecordingProvider::new(true);
    let input = records(1234);

    let output = dispatch::process(&provider, &input, 0).await.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1234);
    assert_eq!(output.len(), input.len());
}

#[tokio::test]
async fn test_explicit_batch_size_chunks() {
    for unlimited in [true, false] {
        let provider = RecordingProvider::new(unlimited);
        let input = records(23);

        let output = dispatch::process(&provider, &input, 5).await.unwrap();

        let sizes: Vec<usize> = provider.calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
        assert_eq!(output.len(), 23);
    }
}

#[tokio::test]
async fn test_limited_provider_defaults_to_hundred() {
    let provider = RecordingProvider::new(false);
    let input = records(250);

    dispatch::process(&provider, &input, 0).await.unwrap();

    let sizes: Vec<usize> = provider.calls().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![DEFAULT_BATCH_SIZE, DEFAULT_BATCH_SIZE, 50]);
}

#[tokio::test]
async fn test_chunks_are_consecutive_and_ordered() {
    let provider = RecordingProvider::new(false);
    let input = records(7);

    dispatch::process(&provider, &input, 3).await.unwrap();

    let flattened: Vec<String> = provider.calls().into_iter().flatten().collect();
    let expected: Vec<String> = input.iter().map(|r| r.content().to_string()).collect();
    assert_eq!(flattened, expected);
}

#[tokio::test]
async fn test_embeddings_align_with_records() {
    let provider = RecordingProvider::new(false);
    let input = records(12);

    let output = dispatch::process(&provider, &input, 4).await.unwrap();

    for (original, embedded) in input.iter().zip(&output) {
        assert_eq!(embedded.content(), original.content());
        assert_eq!(embedded.origin(), original.origin());
        assert_eq!(embedded.embedding(), Some(fake_embedding(original.content()).as_slice()));
    }
    assert!(input.iter().all(|r| r.embedding().is_none()));
}

#[tokio::test]
async fn test_two_record_scenario() {
    let provider = RecordingProvider::new(true);
    let input = parse_records(json!([
        {"content": "a", "origin": "x"},
        {"content": "b", "origin": "y"}
    ]))
    .unwrap();

    let output = dispatch::process(&provider, &input, 0).await.unwrap();

    assert_eq!(provider.calls(), vec![vec!["a".to_string(), "b".to_string()]]);
    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        json!([
            {"content": "a", "origin": "x", "embedding": [1.0, 97.0]},
            {"content": "b", "origin": "y", "embedding": [1.0, 98.0]}
        ])
    );
}

#[tokio::test]
async fn test_extra_fields_pass_through() {
    let provider = RecordingProvider::new(true);
    let input = parse_records(json!([
        {"content": "a", "origin": "x", "page": 4, "meta": {"lang": "pt"}}
    ]))
    .unwrap();

    let output = dispatch::process(&provider, &input, 0).await.unwrap();

    assert_eq!(output[0].get("page"), Some(&json!(4)));
    assert_eq!(output[0].get("meta"), Some(&json!({"lang": "pt"})));
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    let provider = RecordingProvider::new(true);
    let output = dispatch::process(&provider, &[], 0).await.unwrap();
    assert!(output.is_empty());
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_blank_content_rejected_before_any_call() {
    let provider = RecordingProvider::new(false);
    let mut input = records(150);
    input[120] = Record::new("   ", "doc-120");

    let err = dispatch::process(&provider, &input, 0).await.unwrap_err();

    assert!(matches!(err, Error::Validation(_)), "got {err}");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_provider_failure_aborts_run() {
    let provider = RecordingProvider::new(false).failing_on(2);
    let input = records(10);

    let err = dispatch::process(&provider, &input, 3).await.unwrap_err();

    assert!(matches!(err, Error::Provider { .. }), "got {err}");
    // No third chunk after the second one failed.
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn test_count_mismatch_is_provider_error() {
    let mut provider = RecordingProvider::new(true);
    provider.short_response = true;

    let err = dispatch::process(&provider, &records(3), 0).await.unwrap_err();

    assert!(matches!(err, Error::Provider { .. }), "got {err}");
    assert!(err.to_string().contains("returned 2 embeddings for 3 texts"), "got {err}");
}

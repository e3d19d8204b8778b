//! Integration test: load → embed → save through the OpenAI provider
//! against a mock server, plus save/load stability of the output format.

use std::fs;

use serde_json::{Value, json};

use vectorize_core::config::Settings;
use vectorize_core::error::Error;
use vectorize_core::pipeline::{self, EmbedJob};
use vectorize_core::record::{load_records, save_records};
use vectorize_core::registry::ProviderRegistry;

const INPUT: &str = r#"[
  {"content": "Rust is a systems language", "origin": "intro.md", "section": 1},
  {"content": "Ownership prevents data races", "origin": "ownership.md"}
]"#;

async fn openai_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/v1/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [
                    {"index": 0, "embedding": [0.25, -0.5]},
                    {"index": 1, "embedding": [0.75, 1.0]}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await
}

fn registry_settings(url: &str) -> Settings {
    Settings::from_vars([("OPENAI_API_KEY", "sk-test"), ("OPENAI_BASE_URL", url)])
}

#[tokio::test]
async fn test_full_run_writes_augmented_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("chunks.json");
    let output = dir.path().join("out").join("embedded.json");
    fs::write(&input, INPUT).unwrap();

    let mut server = mockito::Server::new_async().await;
    let mock = openai_mock(&mut server).await;

    let provider = ProviderRegistry::builtin()
        .create("openai", &registry_settings(&server.url()))
        .unwrap();
    let summary = pipeline::run(
        provider.as_ref(),
        &EmbedJob {
            input: input.clone(),
            output: output.clone(),
            batch_size: 0,
        },
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(summary.records, 2);
    assert_eq!(summary.output, output);

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        written,
        json!([
            {"content": "Rust is a systems language", "origin": "intro.md", "section": 1, "embedding": [0.25, -0.5]},
            {"content": "Ownership prevents data races", "origin": "ownership.md", "embedding": [0.75, 1.0]}
        ])
    );
}

#[tokio::test]
async fn test_output_reloads_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("chunks.json");
    let output = dir.path().join("embedded.json");
    fs::write(&input, INPUT).unwrap();

    let mut server = mockito::Server::new_async().await;
    let _mock = openai_mock(&mut server).await;
    let provider = ProviderRegistry::builtin()
        .create("openai", &registry_settings(&server.url()))
        .unwrap();
    pipeline::run(
        provider.as_ref(),
        &EmbedJob {
            input,
            output: output.clone(),
            batch_size: 0,
        },
    )
    .await
    .unwrap();

    let first = load_records(&output).unwrap();
    let copy = dir.path().join("copy.json");
    save_records(&first, &copy).unwrap();
    let second = load_records(&copy).unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&output).unwrap(), fs::read_to_string(&copy).unwrap());
}

#[tokio::test]
async fn test_failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("chunks.json");
    let output = dir.path().join("embedded.json");
    fs::write(&input, INPUT).unwrap();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/embeddings")
        .with_status(500)
        .with_body("upstream unavailable")
        .create_async()
        .await;
    let provider = ProviderRegistry::builtin()
        .create("openai", &registry_settings(&server.url()))
        .unwrap();

    let err = pipeline::run(
        provider.as_ref(),
        &EmbedJob {
            input,
            output: output.clone(),
            batch_size: 0,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Provider { .. }), "got {err}");
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ProviderRegistry::builtin()
        .create("openai", &registry_settings("http://127.0.0.1:9"))
        .unwrap();

    let err = pipeline::run(
        provider.as_ref(),
        &EmbedJob {
            input: dir.path().join("missing.json"),
            output: dir.path().join("out.json"),
            batch_size: 0,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Io(_)), "got {err}");
}

#[test]
fn test_bundled_sample_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../files/sample_input.json");
    let records = load_records(std::path::Path::new(path)).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| !r.content().trim().is_empty() && r.embedding().is_none()));
}

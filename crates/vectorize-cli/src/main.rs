use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vectorize_core::config::Settings;
use vectorize_core::error::Result;
use vectorize_core::pipeline::{self, EmbedJob};
use vectorize_core::record::{DEFAULT_OUTPUT_FILE, load_records, resolve_data_path};
use vectorize_core::registry::ProviderRegistry;

#[derive(Parser)]
#[command(name = "vectorize", about = "Convert JSON text chunks to embeddings")]
struct Cli {
    /// Input JSON file (bare names are looked up under files/)
    #[arg(required_unless_present = "list_providers")]
    input_file: Option<PathBuf>,

    /// Output JSON file [default: output.json]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Embedding provider (overrides AI_PROVIDER)
    #[arg(long)]
    provider: Option<String>,

    /// Embedding model (overrides <PROVIDER>_EMBEDDING_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Batch size, 0 = no limit (overrides BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<usize>,

    /// List supported providers and exit
    #[arg(long)]
    list_providers: bool,

    /// Validate the input file without generating embeddings
    #[arg(long)]
    check: bool,

    /// Output logs as JSON instead of human-readable
    #[arg(long)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vectorize=info"));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn list_providers(registry: &ProviderRegistry) -> Result<()> {
    println!("Supported providers:");
    for name in registry.list_supported() {
        let info = registry.describe(name)?;
        println!("  - {} ({}): {}", info.name, info.implementation, info.description);
    }
    println!();
    println!("Tip: with openai, BATCH_SIZE=0 sends every text in a single call");
    Ok(())
}

async fn run(cli: Cli, registry: &ProviderRegistry) -> Result<()> {
    let mut settings = Settings::from_env();
    if let Some(ref name) = cli.provider {
        settings.set_provider(name);
    }
    if let Some(batch_size) = cli.batch_size {
        settings.set_batch_size(batch_size);
    }
    let provider_name = settings.provider_name().to_string();
    if let Some(ref model) = cli.model {
        settings.set_model_for(&provider_name, model);
    }

    // Guaranteed by clap unless --list-providers was given.
    let Some(input_file) = cli.input_file else {
        return Ok(());
    };
    let input = resolve_data_path(input_file);

    if cli.check {
        let records = load_records(&input)?;
        println!("{} is valid with {} items", input.display(), records.len());
        return Ok(());
    }

    let output = resolve_data_path(cli.output.unwrap_or_else(|| DEFAULT_OUTPUT_FILE.into()));
    let batch_size = settings.batch_size()?;

    let batch_label = match batch_size {
        0 => "no limit".to_string(),
        n => n.to_string(),
    };
    tracing::info!(
        provider = %provider_name,
        model = settings.model_for(&provider_name).unwrap_or("<unset>"),
        batch_size = %batch_label,
        input = %input.display(),
        output = %output.display(),
        "Configuration"
    );

    let provider = registry.create(&provider_name, &settings)?;
    let info = provider.model_info();
    tracing::info!(
        provider = info.provider,
        model = %info.model,
        dimensions = info.dimensions,
        unlimited_batch = info.supports_unlimited_batch,
        "Using {provider}"
    );

    let summary = pipeline::run(
        provider.as_ref(),
        &EmbedJob {
            input,
            output,
            batch_size,
        },
    )
    .await?;

    println!(
        "Processing completed successfully! {} items saved to {}",
        summary.records,
        summary.output.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let registry = ProviderRegistry::builtin();

    let result = if cli.list_providers {
        list_providers(&registry)
    } else {
        run(cli, &registry).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

use clap::Parser;
use palms_ingest::utils::error::ErrorSeverity;
use palms_ingest::utils::{logger, validation::Validate};
use palms_ingest::{
    CliConfig, IngestLimits, LocalFileSource, MemberIngestPipeline, UploadMeta,
};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting palms-ingest CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(3);
    }

    let limits = match &config.limits {
        Some(path) => match IngestLimits::from_toml_file(path) {
            Ok(limits) => limits,
            Err(e) => {
                tracing::error!("❌ Failed to load limits from '{}': {}", path, e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(3);
            }
        },
        None => IngestLimits::default(),
    };

    let input = Path::new(&config.input);
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.input.clone());
    let base_path = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());

    let declared_size = match std::fs::metadata(input) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            tracing::error!("❌ Cannot stat '{}': {}", config.input, e);
            eprintln!("❌ Cannot read '{}': {}", config.input, e);
            std::process::exit(1);
        }
    };

    let meta = UploadMeta::new(file_name, declared_size, config.mime_type.clone());
    let source = LocalFileSource::new(base_path);
    let pipeline = MemberIngestPipeline::new(limits);

    match pipeline.ingest(&meta, &source).await {
        Ok(names) => {
            tracing::info!("✅ Extracted {} member names", names.len());
            if config.json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in &names {
                    println!("{name}");
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Ingestion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

//! Fingerprint command - print the cache record for a source tree

use crate::cli::args::{FingerprintArgs, RecordFormat};
use crate::config::Config;
use crate::error::{JavelinError, JavelinResult};
use crate::orchestration::{BuildOrchestrator, OrchestratorConfig, SystemExecutor};

/// Execute the fingerprint command
pub async fn execute(args: FingerprintArgs, config: &Config) -> JavelinResult<()> {
    let mut config = config.clone();
    if let Some(version) = args.toolchain_version {
        config.build.toolchain_version = Some(version);
    }

    let root = std::path::absolute(&args.source)
        .map_err(|e| JavelinError::io(format!("resolving {}", args.source.display()), e))?;

    let orchestrator =
        BuildOrchestrator::new(SystemExecutor::default(), OrchestratorConfig::from_config(&config));
    let record = orchestrator.current_record(&root).await?;

    match args.format {
        RecordFormat::Toml => print!("{}", record.to_toml()?),
        RecordFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }

    Ok(())
}

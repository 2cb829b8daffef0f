//! Javelin - cached builds for Java applications
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use javelin::cli::{Cli, Commands};
use javelin::config::ConfigManager;
use javelin::error::JavelinResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> JavelinResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("javelin=warn"),
        1 => EnvFilter::new("javelin=info"),
        _ => EnvFilter::new("javelin=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Build(args) => javelin::cli::commands::build(args, &config).await,
        Commands::Fingerprint(args) => javelin::cli::commands::fingerprint(args, &config).await,
        Commands::Cache(args) => javelin::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            javelin::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

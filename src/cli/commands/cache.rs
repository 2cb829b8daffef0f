//! Cache command - inspect or clear the build cache

use crate::cache::BuildCache;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::{Config, ConfigManager};
use crate::error::JavelinResult;
use console::style;
use std::path::PathBuf;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> JavelinResult<()> {
    match args.action {
        CacheAction::Show { cache_dir } => show(&cache_for(cache_dir, config)).await,
        CacheAction::Clear { cache_dir } => clear(&mut cache_for(cache_dir, config)).await,
    }
}

fn cache_for(dir: Option<PathBuf>, config: &Config) -> BuildCache {
    BuildCache::new(
        dir.or_else(|| config.cache.dir.clone())
            .unwrap_or_else(ConfigManager::default_cache_dir),
    )
}

async fn show(cache: &BuildCache) -> JavelinResult<()> {
    println!("Cache: {}", cache.dir().display());

    let Some(metadata) = cache.read_metadata().await? else {
        println!("No cached build.");
        return Ok(());
    };

    let record = &metadata.record;
    let root = record
        .sources
        .entries()
        .first()
        .map(|e| e.path.display().to_string())
        .unwrap_or_default();

    println!();
    println!(
        "  {} {}",
        style("•").cyan(),
        cache.cached_artifact_path().display()
    );
    println!("    {:<10} {}", "stored", metadata.stored_at.format("%Y-%m-%d %H:%M"));
    println!("    {:<10} {} bytes", "size", metadata.artifact_size);
    println!("    {:<10} {}", "sha256", metadata.artifact_sha256);
    println!("    {:<10} {}", "toolchain", record.toolchain_version);
    println!("    {:<10} {}", "source", root);
    println!("    {:<10} {}", "entries", record.sources.len());

    Ok(())
}

async fn clear(cache: &mut BuildCache) -> JavelinResult<()> {
    if cache.clear().await? {
        println!(
            "{} cleared cached build in {}",
            style("✓").green(),
            cache.dir().display()
        );
    } else {
        println!("No cached build in {}", cache.dir().display());
    }
    Ok(())
}

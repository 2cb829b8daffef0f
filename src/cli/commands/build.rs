//! Build command - run one cached build

use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::{JavelinError, JavelinResult};
use crate::orchestration::plan::split_arguments;
use crate::orchestration::{
    BuildOrchestrator, BuildPlan, BuildRequest, BuildTool, OrchestratorConfig, SystemExecutor,
};
use console::style;
use std::time::Duration;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> JavelinResult<()> {
    let mut config = config.clone();
    apply_overrides(&args, &mut config);

    let source = std::path::absolute(&args.source)
        .map_err(|e| JavelinError::io(format!("resolving {}", args.source.display()), e))?;
    if !source.is_dir() {
        return Err(JavelinError::PathNotFound(source));
    }

    let tool: BuildTool = match args.tool {
        Some(tool) => tool.into(),
        None => BuildTool::detect(&source).ok_or_else(|| {
            JavelinError::User(format!(
                "No build.gradle, build.gradle.kts or pom.xml in {}; pass --tool",
                source.display()
            ))
        })?,
    };
    debug!("Using {}", tool);

    let mut plan = BuildPlan::resolve(tool, &source, None, &config.build);
    if let Some(executable) = args.executable {
        plan.executable = executable;
    }

    let executor = SystemExecutor::new(config.build.timeout_secs.map(Duration::from_secs));
    let mut orchestrator =
        BuildOrchestrator::new(executor, OrchestratorConfig::from_config(&config));
    let outcome = orchestrator
        .run(&BuildRequest {
            source_root: source.clone(),
            plan,
        })
        .await?;

    if outcome.cache_hit {
        println!(
            "{} cache hit, {} restored from {}",
            style("✓").green(),
            source.display(),
            outcome.artifact.display()
        );
    } else {
        let built = outcome.resolved.as_deref().unwrap_or(&outcome.artifact);
        println!(
            "{} built {}, cached in {}",
            style("✓").green(),
            built.display(),
            orchestrator.cache().dir().display()
        );
    }

    Ok(())
}

/// Fold command-line and environment overrides into `config`
fn apply_overrides(args: &BuildArgs, config: &mut Config) {
    if let Some(arguments) = &args.arguments {
        config.build.arguments = Some(split_arguments(arguments));
    }
    if let Some(artifact) = &args.built_artifact {
        config.build.built_artifact = Some(artifact.clone());
    }
    if let Some(module) = &args.built_module {
        config.build.built_module = Some(module.clone());
    }
    if let Some(timeout) = args.timeout {
        config.build.timeout_secs = Some(timeout);
    }
    if let Some(version) = &args.toolchain_version {
        config.build.toolchain_version = Some(version.clone());
    }
    if let Some(dir) = &args.cache_dir {
        config.cache.dir = Some(dir.clone());
    }
}

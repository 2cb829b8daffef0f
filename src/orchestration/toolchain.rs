//! Toolchain version probing
//!
//! The toolchain version is part of the cache key, so a JDK upgrade
//! forces a rebuild even when no source file changed.

use crate::error::{JavelinError, JavelinResult};
use crate::orchestration::executor::{format_command, Executor};
use std::path::Path;
use tracing::debug;

/// Where the toolchain version comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainSource {
    /// Run this command (program + args) and parse its output
    Probe(Vec<String>),
    /// Use this version string as-is
    Fixed(String),
}

impl Default for ToolchainSource {
    fn default() -> Self {
        Self::Probe(default_probe())
    }
}

/// `javac -version`
pub fn default_probe() -> Vec<String> {
    vec!["javac".to_string(), "-version".to_string()]
}

impl ToolchainSource {
    /// Determine the version, probing in `dir` if needed
    pub async fn version(&self, executor: &dyn Executor, dir: &Path) -> JavelinResult<String> {
        let probe = match self {
            Self::Fixed(version) => return Ok(version.clone()),
            Self::Probe(probe) => probe,
        };

        let Some((program, args)) = probe.split_first() else {
            return Err(JavelinError::ToolchainProbe {
                command: String::new(),
                reason: "empty probe command".to_string(),
            });
        };

        let output = executor
            .output(Path::new(program), dir, args)
            .await
            .map_err(|e| JavelinError::ToolchainProbe {
                command: format_command(Path::new(program), args),
                reason: e.to_string(),
            })?;

        let version = parse_version(&output);
        debug!("Toolchain version: {}", version);
        Ok(version)
    }
}

/// Extract the version from `javac -version` style output.
///
/// `javac 17.0.2` yields `17.0.2`, a bare `17.0.2` yields itself, and
/// anything else is `unknown`.
pub fn parse_version(output: &str) -> String {
    let fields: Vec<&str> = output.trim().split(' ').collect();
    match fields.as_slice() {
        [_, version] => (*version).to_string(),
        [version] => (*version).to_string(),
        _ => "unknown".to_string(),
    }
}

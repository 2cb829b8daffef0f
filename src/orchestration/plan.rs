//! Build plans
//!
//! A [`BuildPlan`] is everything the orchestrator needs to know about
//! the build tool: which executable to run, with which arguments, and
//! where the output lands. Tool defaults are overridden by
//! [`BuildConfig`].

use crate::config::schema::BuildConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported build tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    Gradle,
    Maven,
}

impl BuildTool {
    /// Detect the build tool from marker files in `root`
    pub fn detect(root: &Path) -> Option<Self> {
        if ["build.gradle", "build.gradle.kts"]
            .iter()
            .any(|f| root.join(f).exists())
        {
            Some(Self::Gradle)
        } else if root.join("pom.xml").exists() {
            Some(Self::Maven)
        } else {
            None
        }
    }

    /// Arguments used when none are configured
    pub fn default_arguments(&self) -> Vec<String> {
        let args: &[&str] = match self {
            Self::Gradle => &["-x", "test", "build"],
            Self::Maven => &["-Dmaven.test.skip=true", "package"],
        };
        args.iter().map(|a| a.to_string()).collect()
    }

    /// Output glob, relative to the application root
    pub fn default_artifact_glob(&self) -> &'static str {
        match self {
            Self::Gradle => "build/libs/*.[jw]ar",
            Self::Maven => "target/*.[jw]ar",
        }
    }

    /// Wrapper script name in the application root
    pub fn wrapper(&self) -> &'static str {
        match self {
            Self::Gradle => "gradlew",
            Self::Maven => "mvnw",
        }
    }

    /// Command name of the tool's distribution
    pub fn distribution_command(&self) -> &'static str {
        match self {
            Self::Gradle => "gradle",
            Self::Maven => "mvn",
        }
    }

    /// Executable to run: the wrapper if present, then `distribution`,
    /// then the bare command name resolved through `PATH`
    pub fn executable(&self, root: &Path, distribution: Option<&Path>) -> PathBuf {
        let wrapper = root.join(self.wrapper());
        if wrapper.is_file() {
            return wrapper;
        }
        distribution
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(self.distribution_command()))
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gradle => "gradle",
            Self::Maven => "maven",
        };
        write!(f, "{}", name)
    }
}

/// Concrete build invocation and output location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Build tool executable
    pub executable: PathBuf,

    /// Arguments passed to the executable
    pub arguments: Vec<String>,

    /// Output glob relative to the application root
    pub artifact_glob: String,
}

impl BuildPlan {
    /// Combine tool defaults with configured overrides.
    ///
    /// `built_artifact` replaces the glob verbatim; otherwise
    /// `built_module` is prefixed to the tool's default glob.
    pub fn resolve(
        tool: BuildTool,
        root: &Path,
        distribution: Option<&Path>,
        config: &BuildConfig,
    ) -> Self {
        let arguments = config
            .arguments
            .clone()
            .unwrap_or_else(|| tool.default_arguments());

        let artifact_glob = match (&config.built_artifact, &config.built_module) {
            (Some(artifact), _) => artifact.clone(),
            (None, Some(module)) => format!(
                "{}/{}",
                module.trim_end_matches('/'),
                tool.default_artifact_glob()
            ),
            (None, None) => tool.default_artifact_glob().to_string(),
        };

        Self {
            executable: tool.executable(root, distribution),
            arguments,
            artifact_glob,
        }
    }
}

/// Split a whitespace-separated argument override
pub fn split_arguments(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

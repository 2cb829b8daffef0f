//! Configuration schema for Javelin
//!
//! Configuration is stored at `~/.config/javelin/config.toml`

use crate::orchestration::toolchain::default_probe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Build invocation settings
    pub build: BuildConfig,

    /// Build cache settings
    pub cache: CacheConfig,

    /// Source tree fingerprinting
    pub fingerprint: FingerprintConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Build invocation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Replaces the build tool's default arguments
    pub arguments: Option<Vec<String>>,

    /// Glob locating the built artifact, replacing the tool default
    pub built_artifact: Option<String>,

    /// Module subdirectory prefixed to the default artifact glob
    pub built_module: Option<String>,

    /// Kill the build after this many seconds
    pub timeout_secs: Option<u64>,

    /// Command printing the toolchain version
    pub toolchain_probe: Vec<String>,

    /// Fixed toolchain version; skips the probe
    pub toolchain_version: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            arguments: None,
            built_artifact: None,
            built_module: None,
            timeout_secs: None,
            toolchain_probe: default_probe(),
            toolchain_version: None,
        }
    }
}

/// Build cache settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Cache directory (default: `<user cache dir>/javelin`)
    pub dir: Option<PathBuf>,
}

/// Fingerprint settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FingerprintConfig {
    /// Maximum files hashed at once (default: available parallelism)
    pub concurrency: Option<usize>,
}

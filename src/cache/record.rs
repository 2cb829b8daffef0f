//! Cache key records
//!
//! A [`CacheRecord`] pairs the toolchain version with the source tree
//! fingerprint. It carries no timestamps so that the same tree always
//! serializes to the same bytes.

use crate::error::{JavelinError, JavelinResult};
use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cache key: toolchain version plus source fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Opaque toolchain version string (e.g. `17.0.2`)
    #[serde(rename = "java-version")]
    pub toolchain_version: String,

    /// Path-sorted source fingerprint
    pub sources: Fingerprint,
}

impl CacheRecord {
    pub fn new(toolchain_version: impl Into<String>, sources: Fingerprint) -> Self {
        Self {
            toolchain_version: toolchain_version.into(),
            sources,
        }
    }

    /// Whether `other` describes the same toolchain and the same tree.
    ///
    /// Fingerprints compare element-wise in order: same length, and the
    /// same path, mode and hash at every position.
    pub fn matches(&self, other: &CacheRecord) -> bool {
        self.toolchain_version == other.toolchain_version
            && self.sources.len() == other.sources.len()
            && self
                .sources
                .entries()
                .iter()
                .zip(other.sources.entries())
                .all(|(a, b)| a == b)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> JavelinResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// On-disk metadata stored next to the cached artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheMetadata {
    /// When the artifact was stored
    pub stored_at: DateTime<Utc>,

    /// Size of the artifact blob in bytes
    pub artifact_size: u64,

    /// SHA-256 of the artifact blob
    pub artifact_sha256: String,

    /// Cache key the artifact was built from
    pub record: CacheRecord,
}

impl CacheMetadata {
    /// Parse metadata read from `path`
    pub fn parse(content: &str, path: &Path) -> JavelinResult<Self> {
        toml::from_str(content).map_err(|e| JavelinError::CacheRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> JavelinResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

//! Javelin configuration
//!
//! Settings come from a single TOML file. A missing file means defaults;
//! a file that does not parse is a `ConfigInvalid` error naming the path.
//! The file is only ever read; command-line flags and `BP_*` variables
//! are folded in by the commands that use them.

pub mod schema;

pub use schema::Config;

use crate::error::{JavelinError, JavelinResult};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Locates and reads the configuration file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user config file
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Manager for an explicit config file, as given by `--config`
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/javelin/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("javelin")
            .join("config.toml")
    }

    /// Where build results are cached unless `[cache] dir` says otherwise
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("javelin")
    }

    /// Read the config file, falling back to defaults when it is absent
    pub async fn load(&self) -> JavelinResult<Config> {
        let path = &self.config_path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(JavelinError::io(
                    format!("reading config from {}", path.display()),
                    e,
                ))
            }
        };

        parse(path, &content)
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(path: &Path, content: &str) -> JavelinResult<Config> {
    let config = toml::from_str(content).map_err(|e| JavelinError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("absent.toml"));

        assert_eq!(manager.load().await.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn reads_hand_written_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[build]\nbuilt-artifact = \"target/app.war\"\n\n[fingerprint]\nconcurrency = 2\n",
        )
        .unwrap();

        let config = ConfigManager::with_path(path).load().await.unwrap();
        assert_eq!(config.build.built_artifact.as_deref(), Some("target/app.war"));
        assert_eq!(config.fingerprint.concurrency, Some(2));
        assert_eq!(config.cache, Config::default().cache);
    }

    #[tokio::test]
    async fn malformed_file_names_its_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[build\narguments = 3").unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        match err {
            JavelinError::ConfigInvalid { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn directory_in_place_of_file_is_io_error() {
        let temp = TempDir::new().unwrap();

        let err = ConfigManager::with_path(temp.path().to_path_buf())
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, JavelinError::Io { .. }));
    }

    #[test]
    fn default_locations_are_namespaced() {
        assert!(ConfigManager::default_cache_dir().ends_with("javelin"));
        assert!(ConfigManager::default_config_path().ends_with("javelin/config.toml"));
    }
}

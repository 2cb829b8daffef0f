//! Error types for Javelin
//!
//! All modules use `JavelinResult<T>` as their return type.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for Javelin operations
pub type JavelinResult<T> = Result<T, JavelinError>;

/// All errors that can occur in Javelin
#[derive(Error, Debug)]
pub enum JavelinError {
    // Fingerprint errors
    #[error("Failed to fingerprint {path}: {source}")]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache errors
    #[error("Unreadable cache metadata {path}: {reason}")]
    CacheRead { path: PathBuf, reason: String },

    #[error("Failed to write build cache: {context}")]
    CacheWrite {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Build errors
    #[error("Failed to start build command: {command}")]
    BuildSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build command failed: {command}, exit code: {}", display_code(.code))]
    BuildFailed { command: String, code: Option<i32> },

    #[error("Build command cancelled after {}s: {command}", .timeout.as_secs())]
    BuildTimedOut { command: String, timeout: Duration },

    #[error("Toolchain version probe failed: {command}: {reason}")]
    ToolchainProbe { command: String, reason: String },

    // Artifact errors
    #[error(
        "unable to find built artifact (executable JAR or WAR) in {pattern}, candidates: [{}]",
        display_paths(.candidates)
    )]
    AmbiguousArtifact {
        pattern: String,
        candidates: Vec<PathBuf>,
    },

    #[error("Unable to inspect archive {path}: {reason}")]
    ArtifactInspect { path: PathBuf, reason: String },

    #[error("Invalid artifact pattern {pattern}: {reason}")]
    InvalidGlob { pattern: String, reason: String },

    // Replacement errors
    #[error("Failed to replace application contents: {context}")]
    Replacement {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to expand archive {path}: {reason}")]
    ReplacementArchive { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl JavelinError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache write error with context
    pub fn cache_write(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::CacheWrite {
            context: context.into(),
            source,
        }
    }

    /// Create a replacement error with context
    pub fn replacement(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Replacement {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::AmbiguousArtifact { .. } => {
                Some("Set BP_BUILT_ARTIFACT to a pattern matching exactly one artifact")
            }
            Self::CacheRead { .. } => Some("Run `javelin cache clear` to discard the cached build"),
            Self::BuildSpawn { .. } => Some("Check that the build tool or its wrapper is executable"),
            Self::BuildTimedOut { .. } => Some("Raise build.timeout-secs or remove it to wait indefinitely"),
            Self::Replacement { .. } | Self::ReplacementArchive { .. } => {
                Some("The source tree was left unchanged; rerun after fixing the cause")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_artifact_lists_candidates() {
        let err = JavelinError::AmbiguousArtifact {
            pattern: "*.[jw]ar".to_string(),
            candidates: vec![PathBuf::from("/app/a.jar"), PathBuf::from("/app/b.war")],
        };
        assert_eq!(
            err.to_string(),
            "unable to find built artifact (executable JAR or WAR) in *.[jw]ar, candidates: [/app/a.jar /app/b.war]"
        );
    }

    #[test]
    fn ambiguous_artifact_empty_candidates() {
        let err = JavelinError::AmbiguousArtifact {
            pattern: "target/*.jar".to_string(),
            candidates: vec![],
        };
        assert!(err.to_string().ends_with("candidates: []"));
    }

    #[test]
    fn build_failed_display() {
        let err = JavelinError::BuildFailed {
            command: "gradlew build".to_string(),
            code: Some(1),
        };
        assert!(err.to_string().contains("exit code: 1"));

        let err = JavelinError::BuildFailed {
            command: "gradlew build".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("exit code: signal"));
    }

    #[test]
    fn error_hint() {
        let err = JavelinError::AmbiguousArtifact {
            pattern: "*.jar".to_string(),
            candidates: vec![],
        };
        assert!(err.hint().unwrap().contains("BP_BUILT_ARTIFACT"));
        assert_eq!(JavelinError::Internal("x".to_string()).hint(), None);
    }
}

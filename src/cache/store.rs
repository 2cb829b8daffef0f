//! Build result cache
//!
//! Persists the last successfully built artifact together with the
//! [`CacheRecord`] it was built from. The cache directory holds exactly
//! two files:
//!
//! | File | Contents |
//! |------|----------|
//! | `application.zip` | Artifact blob |
//! | `application.toml` | [`CacheMetadata`] |
//!
//! Writes remove the old metadata first, then replace the blob, then
//! write the new metadata, each via temp file + rename. A crash at any
//! point leaves either no metadata (a miss) or metadata describing the
//! blob on disk.

use crate::cache::record::{CacheMetadata, CacheRecord};
use crate::error::{JavelinError, JavelinResult};
use crate::fingerprint::sha256_file;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const ARTIFACT_FILE: &str = "application.zip";
const METADATA_FILE: &str = "application.toml";

/// Cache of the last built artifact and the record it was built from
#[derive(Debug)]
pub struct BuildCache {
    dir: PathBuf,
    stored: Option<CacheRecord>,
}

impl BuildCache {
    /// Create a cache rooted at `dir` (created lazily on first store)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stored: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable path of the cached artifact blob
    pub fn cached_artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    /// Path of the metadata file
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Load the persisted record.
    ///
    /// Missing, malformed or inconsistent metadata all count as "no record";
    /// the latter two are logged and the next store overwrites them.
    pub async fn load(&mut self) -> Option<&CacheRecord> {
        self.stored = match self.read_metadata().await {
            Ok(metadata) => metadata.map(|m| m.record),
            Err(e) => {
                warn!("{}; treating as cache miss", e);
                None
            }
        };
        self.stored.as_ref()
    }

    /// Whether `current` matches the loaded record
    pub fn is_hit(&self, current: &CacheRecord) -> bool {
        self.stored
            .as_ref()
            .is_some_and(|stored| stored.matches(current))
    }

    /// Read and validate the metadata file without touching loaded state
    pub async fn read_metadata(&self) -> JavelinResult<Option<CacheMetadata>> {
        let path = self.metadata_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache metadata at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(JavelinError::CacheRead {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        let metadata = CacheMetadata::parse(&content, &path)?;

        let artifact = self.cached_artifact_path();
        let size = fs::metadata(&artifact)
            .await
            .map(|m| m.len())
            .map_err(|e| JavelinError::CacheRead {
                path: artifact.clone(),
                reason: e.to_string(),
            })?;
        if size != metadata.artifact_size {
            return Err(JavelinError::CacheRead {
                path: artifact,
                reason: format!(
                    "artifact is {} bytes, metadata expects {}",
                    size, metadata.artifact_size
                ),
            });
        }

        Ok(Some(metadata))
    }

    /// Copy `artifact` into the cache and persist `record` as the new baseline
    pub async fn store(&mut self, record: CacheRecord, artifact: &Path) -> JavelinResult<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            JavelinError::cache_write(format!("creating {}", self.dir.display()), e)
        })?;

        // Invalidate first so a crash mid-store reads as a miss
        let metadata_path = self.metadata_path();
        match fs::remove_file(&metadata_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(JavelinError::cache_write(
                    format!("removing {}", metadata_path.display()),
                    e,
                ))
            }
        }
        self.stored = None;

        let blob = self.cached_artifact_path();
        let blob_tmp = temp_sibling(&blob);
        debug!("Copying {} to {}", artifact.display(), blob.display());
        let artifact_size = match fs::copy(artifact, &blob_tmp).await {
            Ok(size) => size,
            Err(e) => {
                remove_best_effort(&blob_tmp).await;
                return Err(JavelinError::cache_write(
                    format!("copying {}", artifact.display()),
                    e,
                ));
            }
        };

        let hash_path = blob_tmp.clone();
        let artifact_sha256 = tokio::task::spawn_blocking(move || sha256_file(&hash_path))
            .await
            .map_err(|e| JavelinError::Internal(format!("artifact hash task failed: {}", e)))?;
        let artifact_sha256 = match artifact_sha256 {
            Ok(hash) => hash,
            Err(e) => {
                remove_best_effort(&blob_tmp).await;
                return Err(JavelinError::cache_write("hashing cached artifact", e));
            }
        };

        if let Err(e) = fs::rename(&blob_tmp, &blob).await {
            remove_best_effort(&blob_tmp).await;
            return Err(JavelinError::cache_write(
                format!("moving artifact into {}", blob.display()),
                e,
            ));
        }

        let metadata = CacheMetadata {
            stored_at: Utc::now(),
            artifact_size,
            artifact_sha256,
            record,
        };
        let content = metadata.to_toml()?;
        let metadata_tmp = temp_sibling(&metadata_path);
        let written = match fs::write(&metadata_tmp, content).await {
            Ok(()) => fs::rename(&metadata_tmp, &metadata_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            remove_best_effort(&metadata_tmp).await;
            return Err(JavelinError::cache_write(
                format!("writing {}", metadata_path.display()),
                e,
            ));
        }

        info!(
            "Cached {} ({} bytes) in {}",
            artifact.display(),
            artifact_size,
            self.dir.display()
        );
        self.stored = Some(metadata.record);
        Ok(())
    }

    /// Remove the cached artifact and metadata. Returns whether anything existed.
    pub async fn clear(&mut self) -> JavelinResult<bool> {
        let mut removed = false;
        for path in [self.metadata_path(), self.cached_artifact_path()] {
            match fs::remove_file(&path).await {
                Ok(()) => removed = true,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(JavelinError::io(format!("removing {}", path.display()), e))
                }
            }
        }
        self.stored = None;
        Ok(removed)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

async fn remove_best_effort(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{FileFingerprint, Fingerprint};
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn entry(path: &str, hash: &str) -> FileFingerprint {
        FileFingerprint {
            path: PathBuf::from(path),
            mode: "-rw-r--r--".to_string(),
            content_hash: hash.to_string(),
        }
    }

    fn record(version: &str, entries: Vec<FileFingerprint>) -> CacheRecord {
        CacheRecord::new(version, Fingerprint::new(entries))
    }

    fn baseline() -> CacheRecord {
        record(
            "17.0.2",
            vec![
                FileFingerprint::directory(PathBuf::from("/app"), "drwxr-xr-x".to_string()),
                entry("/app/Main.java", &"1".repeat(64)),
                entry("/app/pom.xml", &"2".repeat(64)),
            ],
        )
    }

    async fn stored_cache(dir: &TempDir) -> BuildCache {
        let artifact = dir.path().join("app.jar");
        stdfs::write(&artifact, b"PK fake jar").unwrap();

        let mut cache = BuildCache::new(dir.path().join("cache"));
        cache.store(baseline(), &artifact).await.unwrap();
        cache
    }

    #[tokio::test]
    async fn load_without_metadata_is_none() {
        let dir = TempDir::new().unwrap();
        let mut cache = BuildCache::new(dir.path().join("cache"));

        assert!(cache.load().await.is_none());
        assert!(!cache.is_hit(&baseline()));
    }

    #[tokio::test]
    async fn store_then_load_roundtrips() {
        let dir = TempDir::new().unwrap();
        stored_cache(&dir).await;

        let mut fresh = BuildCache::new(dir.path().join("cache"));
        assert_eq!(fresh.load().await, Some(&baseline()));
        assert!(fresh.is_hit(&baseline()));
        assert_eq!(
            stdfs::read(fresh.cached_artifact_path()).unwrap(),
            b"PK fake jar"
        );
    }

    #[tokio::test]
    async fn store_records_artifact_digest() {
        let dir = TempDir::new().unwrap();
        let cache = stored_cache(&dir).await;

        let metadata = cache.read_metadata().await.unwrap().unwrap();
        assert_eq!(metadata.artifact_size, 11);
        assert_eq!(
            metadata.artifact_sha256,
            sha256_file(&dir.path().join("app.jar")).unwrap()
        );
    }

    #[tokio::test]
    async fn mismatches_are_misses() {
        let dir = TempDir::new().unwrap();
        let mut cache = stored_cache(&dir).await;
        cache.load().await;

        // Toolchain upgrade
        let mut upgraded = baseline();
        upgraded.toolchain_version = "21.0.1".to_string();
        assert!(!cache.is_hit(&upgraded));

        // Changed content
        let changed = record(
            "17.0.2",
            vec![
                FileFingerprint::directory(PathBuf::from("/app"), "drwxr-xr-x".to_string()),
                entry("/app/Main.java", &"9".repeat(64)),
                entry("/app/pom.xml", &"2".repeat(64)),
            ],
        );
        assert!(!cache.is_hit(&changed));

        // Changed mode
        let mut chmod = baseline();
        let mut entries = chmod.sources.entries().to_vec();
        entries[1].mode = "-rwxr-xr-x".to_string();
        chmod.sources = Fingerprint::new(entries);
        assert!(!cache.is_hit(&chmod));

        // Added file
        let mut added = baseline().sources.entries().to_vec();
        added.push(entry("/app/README.md", &"3".repeat(64)));
        assert!(!cache.is_hit(&record("17.0.2", added)));

        // Removed file
        let mut removed = baseline().sources.entries().to_vec();
        removed.pop();
        assert!(!cache.is_hit(&record("17.0.2", removed)));

        assert!(cache.is_hit(&baseline()));
    }

    #[tokio::test]
    async fn corrupt_metadata_is_forced_miss() {
        let dir = TempDir::new().unwrap();
        let cache = stored_cache(&dir).await;
        stdfs::write(cache.metadata_path(), "not = [valid").unwrap();

        let mut fresh = BuildCache::new(dir.path().join("cache"));
        assert!(fresh.load().await.is_none());
        assert!(!fresh.is_hit(&baseline()));
    }

    #[tokio::test]
    async fn missing_blob_is_forced_miss() {
        let dir = TempDir::new().unwrap();
        let cache = stored_cache(&dir).await;
        stdfs::remove_file(cache.cached_artifact_path()).unwrap();

        let mut fresh = BuildCache::new(dir.path().join("cache"));
        assert!(fresh.load().await.is_none());
    }

    #[tokio::test]
    async fn truncated_blob_is_forced_miss() {
        let dir = TempDir::new().unwrap();
        let cache = stored_cache(&dir).await;
        stdfs::write(cache.cached_artifact_path(), b"PK").unwrap();

        let mut fresh = BuildCache::new(dir.path().join("cache"));
        assert!(fresh.load().await.is_none());
    }

    #[tokio::test]
    async fn store_replaces_previous_entry() {
        let dir = TempDir::new().unwrap();
        let mut cache = stored_cache(&dir).await;

        let newer = dir.path().join("app-2.jar");
        stdfs::write(&newer, b"PK newer jar contents").unwrap();
        let mut next = baseline();
        next.toolchain_version = "21.0.1".to_string();
        cache.store(next.clone(), &newer).await.unwrap();

        let mut fresh = BuildCache::new(dir.path().join("cache"));
        assert_eq!(fresh.load().await, Some(&next));
        assert_eq!(
            stdfs::read(fresh.cached_artifact_path()).unwrap(),
            b"PK newer jar contents"
        );

        let leftovers: Vec<_> = stdfs::read_dir(dir.path().join("cache"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 2);
    }

    #[tokio::test]
    async fn failed_store_leaves_no_record() {
        let dir = TempDir::new().unwrap();
        let mut cache = stored_cache(&dir).await;

        let err = cache
            .store(baseline(), &dir.path().join("missing.jar"))
            .await
            .unwrap_err();
        assert!(matches!(err, JavelinError::CacheWrite { .. }));

        let mut fresh = BuildCache::new(dir.path().join("cache"));
        assert!(fresh.load().await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_entry() {
        let dir = TempDir::new().unwrap();
        let mut cache = stored_cache(&dir).await;

        assert!(cache.clear().await.unwrap());
        assert!(!cache.cached_artifact_path().exists());
        assert!(!cache.metadata_path().exists());
        assert!(!cache.clear().await.unwrap());
    }
}

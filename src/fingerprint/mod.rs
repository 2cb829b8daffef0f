//! Source tree fingerprinting
//!
//! Walks an application root and records every entry's path, symbolic
//! mode and content hash. The sorted result is the cache key material
//! for [`crate::cache::BuildCache`].
//!
//! The walk runs on a blocking thread and streams entries back over a
//! channel. Each file is hashed on its own blocking task, bounded by a
//! semaphore, and results fan back in through a `JoinSet`. Completion
//! order never leaks into the result: entries are sorted by path once
//! every hash is collected.

pub mod mode;

pub use mode::mode_string;

use crate::error::{JavelinError, JavelinResult};
use crate::orchestration::replace::is_scratch;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::debug;
use walkdir::WalkDir;

/// Identity of a single filesystem entry for cache-key purposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    /// Absolute path of the entry
    pub path: PathBuf,

    /// Symbolic mode string (e.g. `-rw-r--r--`)
    pub mode: String,

    /// Lowercase hex SHA-256 of the contents; empty for directories
    #[serde(rename = "sha256")]
    pub content_hash: String,
}

impl FileFingerprint {
    /// Fingerprint for a directory (never carries a hash)
    pub fn directory(path: PathBuf, mode: String) -> Self {
        Self {
            path,
            mode,
            content_hash: String::new(),
        }
    }
}

/// Path-sorted collection of [`FileFingerprint`]s
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(Vec<FileFingerprint>);

impl Fingerprint {
    /// Build a fingerprint, sorting entries by path
    pub fn new(mut entries: Vec<FileFingerprint>) -> Self {
        entries.sort_by(|a, b| compare_paths(&a.path, &b.path));
        Self(entries)
    }

    pub fn entries(&self) -> &[FileFingerprint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Plain byte-wise ordering of paths.
///
/// Unlike `Path`'s component-wise `Ord`, `a-b` sorts before `a/b`.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    a.as_os_str()
        .as_encoded_bytes()
        .cmp(b.as_os_str().as_encoded_bytes())
}

/// What the walker found for a single entry
enum Discovered {
    /// Directories and special files: no content to hash
    Unhashed(FileFingerprint),
    /// Regular files and symlinks: hashed through to their contents
    File { path: PathBuf, mode: String },
    Failed(JavelinError),
}

/// Computes [`Fingerprint`]s of directory trees
#[derive(Debug, Clone)]
pub struct TreeFingerprinter {
    concurrency: usize,
}

impl TreeFingerprinter {
    /// Create a fingerprinter hashing at most `concurrency` files at once
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Fingerprint every entry under `root`, including `root` itself.
    ///
    /// Any I/O failure aborts the whole computation; outstanding hash
    /// tasks are aborted and partial results are discarded.
    pub async fn fingerprint(&self, root: &Path) -> JavelinResult<Fingerprint> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let walk_root = root.to_path_buf();
        let walker = tokio::task::spawn_blocking(move || walk(&walk_root, &tx));

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<JavelinResult<FileFingerprint>> = JoinSet::new();
        let mut entries = Vec::new();
        let mut walking = true;

        loop {
            tokio::select! {
                discovered = rx.recv(), if walking => match discovered {
                    Some(Discovered::Unhashed(entry)) => entries.push(entry),
                    Some(Discovered::File { path, mode }) => {
                        let permit = semaphore
                            .clone()
                            .acquire_owned()
                            .await
                            .map_err(|e| JavelinError::Internal(e.to_string()))?;
                        tasks.spawn_blocking(move || {
                            let _permit = permit;
                            let content_hash = hash_file(&path)?;
                            Ok(FileFingerprint { path, mode, content_hash })
                        });
                    }
                    Some(Discovered::Failed(err)) => {
                        tasks.abort_all();
                        return Err(err);
                    }
                    None => walking = false,
                },
                joined = tasks.join_next(), if !tasks.is_empty() => {
                    let result = joined
                        .ok_or_else(|| JavelinError::Internal("hash task set drained".to_string()))?
                        .map_err(|e| JavelinError::Internal(format!("hash task failed: {}", e)))
                        .and_then(|r| r);
                    match result {
                        Ok(entry) => entries.push(entry),
                        Err(err) => {
                            tasks.abort_all();
                            return Err(err);
                        }
                    }
                }
                else => break,
            }
        }

        walker
            .await
            .map_err(|e| JavelinError::Internal(format!("tree walk failed: {}", e)))?;

        debug!("Fingerprinted {} entries under {}", entries.len(), root.display());
        Ok(Fingerprint::new(entries))
    }
}

impl Default for TreeFingerprinter {
    fn default() -> Self {
        Self::new(default_concurrency())
    }
}

/// Worker bound used when none is configured
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Walk `root` without following links, streaming entries to `tx`.
/// Scratch directories left by an interrupted replacement are skipped.
/// Stops at the first error or when the receiver is gone.
fn walk(root: &Path, tx: &mpsc::UnboundedSender<Discovered>) {
    let entries = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() != 1 || !is_scratch(e.file_name()));
    for entry in entries {
        let discovered = match entry {
            Ok(entry) => classify(&entry),
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
                Discovered::Failed(JavelinError::Fingerprint { path, source })
            }
        };

        let failed = matches!(discovered, Discovered::Failed(_));
        if tx.send(discovered).is_err() || failed {
            return;
        }
    }
}

fn classify(entry: &walkdir::DirEntry) -> Discovered {
    let path = entry.path().to_path_buf();
    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(err) => {
            let source = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("unreadable metadata"));
            return Discovered::Failed(JavelinError::Fingerprint { path, source });
        }
    };

    let mode = mode_string(&metadata);
    let file_type = metadata.file_type();
    if file_type.is_file() || file_type.is_symlink() {
        Discovered::File { path, mode }
    } else {
        Discovered::Unhashed(FileFingerprint::directory(path, mode))
    }
}

/// SHA-256 of a file's contents, following symlinks.
///
/// A symlink to a directory hashes as empty; a broken symlink fails.
fn hash_file(path: &Path) -> JavelinResult<String> {
    let fingerprint_err = |source| JavelinError::Fingerprint {
        path: path.to_path_buf(),
        source,
    };

    let target = std::fs::metadata(path).map_err(fingerprint_err)?;
    if target.is_dir() {
        return Ok(String::new());
    }

    sha256_file(path).map_err(fingerprint_err)
}

/// Lowercase hex SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

//! Built artifact resolution
//!
//! Build tools often leave more than one archive behind (a plain JAR next
//! to a repackaged executable JAR, or a JAR next to a WAR). When a glob
//! matches more than one file, the deployable one is picked by content:
//! a `WEB-INF/` directory entry or a manifest `Main-Class`.

use crate::artifact::manifest::{Manifest, MANIFEST_PATH};
use crate::error::{JavelinError, JavelinResult};
use crate::fingerprint::compare_paths;
use globset::GlobBuilder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::ZipArchive;

/// Directory entry marking a web application archive
const WEB_INF: &str = "WEB-INF/";

const GLOB_META: &[char] = &['*', '?', '[', '{', '\\'];

/// Finds the single build output among glob candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactResolver;

impl ArtifactResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `pattern` (relative to `root`) to exactly one artifact.
    ///
    /// A single match is returned without opening it. Otherwise every
    /// candidate is inspected and the result must be the only
    /// interesting one.
    pub fn resolve(&self, root: &Path, pattern: &str) -> JavelinResult<PathBuf> {
        let mut candidates = self.candidates(root, pattern)?;
        debug!("Artifact candidates for {}: {:?}", pattern, candidates);

        if candidates.len() == 1 {
            return Ok(candidates.remove(0));
        }

        let mut interesting = Vec::new();
        for candidate in &candidates {
            if is_interesting(candidate)? {
                debug!("Interesting artifact: {}", candidate.display());
                interesting.push(candidate.clone());
            }
        }

        if interesting.len() == 1 {
            return Ok(interesting.remove(0));
        }

        Err(JavelinError::AmbiguousArtifact {
            pattern: pattern.to_string(),
            candidates,
        })
    }

    /// Files under `root` matching `pattern`, sorted by path
    pub fn candidates(&self, root: &Path, pattern: &str) -> JavelinResult<Vec<PathBuf>> {
        let pattern = pattern.trim_start_matches('/');
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| JavelinError::InvalidGlob {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?
            .compile_matcher();

        let (base, depth) = walk_bounds(pattern);
        let start = root.join(&base);
        if !start.is_dir() {
            debug!("Artifact directory {} does not exist", start.display());
            return Ok(Vec::new());
        }

        let mut walker = WalkDir::new(&start).min_depth(1).follow_links(true);
        if let Some(depth) = depth {
            walker = walker.max_depth(depth);
        }

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry while matching {}: {}", pattern, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if matcher.is_match(relative) {
                candidates.push(entry.path().to_path_buf());
            }
        }

        candidates.sort_by(|a, b| compare_paths(a, b));
        Ok(candidates)
    }
}

/// Literal directory prefix of `pattern` and how deep below it a match
/// can sit (`None` when `**` allows any depth).
fn walk_bounds(pattern: &str) -> (PathBuf, Option<usize>) {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    let dirs = components.len().saturating_sub(1);
    let literal = components[..dirs]
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();

    let base: PathBuf = components[..literal].iter().collect();
    let rest = &components[literal..];
    let depth = if rest.iter().any(|c| c.contains("**")) {
        None
    } else {
        Some(rest.len())
    };
    (base, depth)
}

/// Whether an archive carries a deployment marker
fn is_interesting(path: &Path) -> JavelinResult<bool> {
    let inspect_err = |reason: String| JavelinError::ArtifactInspect {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| inspect_err(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| inspect_err(e.to_string()))?;

    if archive.file_names().any(|name| name == WEB_INF) {
        return Ok(true);
    }

    let content = match archive.by_name(MANIFEST_PATH) {
        Ok(mut entry) => {
            let mut buf = Vec::new();
            entry
                .read_to_end(&mut buf)
                .map_err(|e| inspect_err(e.to_string()))?;
            buf
        }
        Err(ZipError::FileNotFound) => return Ok(false),
        Err(e) => return Err(inspect_err(e.to_string())),
    };

    Ok(Manifest::parse(&String::from_utf8_lossy(&content))
        .main_class()
        .is_some())
}

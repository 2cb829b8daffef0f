//! Atomic application tree replacement
//!
//! Replaces everything under the application root with the expanded
//! contents of an artifact archive. The archive is expanded into a
//! hidden staging directory inside the root first, so a corrupt archive
//! never touches the existing tree. Originals are then moved aside into
//! a trash directory and the staged entries moved in. Both directories
//! live in the root, keeping every rename on one filesystem.

use crate::error::{JavelinError, JavelinResult};
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zip::ZipArchive;

const STAGING_PREFIX: &str = ".javelin-staging-";
const TRASH_PREFIX: &str = ".javelin-trash-";

/// Replace all contents of `root` with the expansion of `archive`.
///
/// On error the root holds either its original contents or, if the
/// rollback itself failed, whatever could be restored (logged).
pub async fn replace_contents(root: &Path, archive: &Path) -> JavelinResult<()> {
    let root = root.to_path_buf();
    let archive = archive.to_path_buf();
    tokio::task::spawn_blocking(move || replace_blocking(&root, &archive))
        .await
        .map_err(|e| JavelinError::Internal(format!("replacement task failed: {}", e)))?
}

/// Whether `name` is a staging or trash directory left in a root
pub fn is_scratch(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with(STAGING_PREFIX) || name.starts_with(TRASH_PREFIX)
}

fn replace_blocking(root: &Path, archive: &Path) -> JavelinResult<()> {
    sweep_stale(root);

    let id = Uuid::new_v4().simple().to_string();
    let staging = root.join(format!("{}{}", STAGING_PREFIX, id));
    let trash = root.join(format!("{}{}", TRASH_PREFIX, id));

    fs::create_dir(&staging).map_err(|e| {
        JavelinError::replacement(format!("creating {}", staging.display()), e)
    })?;

    if let Err(e) = expand(archive, &staging) {
        remove_dir_best_effort(&staging);
        return Err(e);
    }
    debug!("Expanded {} into {}", archive.display(), staging.display());

    if let Err(e) = fs::create_dir(&trash) {
        remove_dir_best_effort(&staging);
        return Err(JavelinError::replacement(
            format!("creating {}", trash.display()),
            e,
        ));
    }

    let result = swap(root, &staging, &trash);
    remove_dir_best_effort(&staging);
    match &result {
        Ok(()) => {
            remove_dir_best_effort(&trash);
            info!("Replaced {} with {}", root.display(), archive.display());
        }
        // Anything still in trash is an original that could not be restored
        Err(_) => {
            if let Err(e) = fs::remove_dir(&trash) {
                warn!("Keeping {} after failed rollback: {}", trash.display(), e);
            }
        }
    }
    result
}

/// Remove staging directories left by an interrupted run. Stale trash
/// may hold originals and is only reported.
fn sweep_stale(root: &Path) {
    let Ok(read) = fs::read_dir(root) else {
        return;
    };
    for entry in read.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(STAGING_PREFIX) {
            debug!("Removing stale {}", entry.path().display());
            remove_dir_best_effort(&entry.path());
        } else if is_scratch(&name) {
            warn!("Found {} from an interrupted replacement", entry.path().display());
        }
    }
}

/// Move originals into `trash` and staged entries into `root`.
/// On failure every completed move is undone.
fn swap(root: &Path, staging: &Path, trash: &Path) -> JavelinResult<()> {
    let originals = list_entries(root, &[staging, trash])?;
    let mut moved = Vec::with_capacity(originals.len());
    for name in originals {
        if let Err(e) = fs::rename(root.join(&name), trash.join(&name)) {
            restore(trash, root, &moved);
            return Err(JavelinError::replacement(
                format!("moving {} aside", root.join(&name).display()),
                e,
            ));
        }
        moved.push(name);
    }

    let staged = match list_entries(staging, &[]) {
        Ok(staged) => staged,
        Err(e) => {
            restore(trash, root, &moved);
            return Err(e);
        }
    };
    let mut placed = Vec::with_capacity(staged.len());
    for name in staged {
        if let Err(e) = fs::rename(staging.join(&name), root.join(&name)) {
            restore(root, staging, &placed);
            restore(trash, root, &moved);
            return Err(JavelinError::replacement(
                format!("moving {} into place", root.join(&name).display()),
                e,
            ));
        }
        placed.push(name);
    }

    Ok(())
}

/// Move `names` from `from` back to `to`, logging failures
fn restore(from: &Path, to: &Path, names: &[OsString]) {
    for name in names.iter().rev() {
        let source = from.join(name);
        if let Err(e) = fs::rename(&source, to.join(name)) {
            warn!("Failed to restore {}: {}", source.display(), e);
        }
    }
}

fn list_entries(dir: &Path, exclude: &[&Path]) -> JavelinResult<Vec<OsString>> {
    let read = fs::read_dir(dir)
        .map_err(|e| JavelinError::replacement(format!("listing {}", dir.display()), e))?;

    let mut names = Vec::new();
    for entry in read {
        let entry = entry
            .map_err(|e| JavelinError::replacement(format!("listing {}", dir.display()), e))?;
        let path = entry.path();
        if exclude.iter().any(|p| *p == path) || is_scratch(&entry.file_name()) {
            continue;
        }
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

/// Expand `archive` into `dest`, rejecting entries that escape it
fn expand(archive: &Path, dest: &Path) -> JavelinResult<()> {
    let invalid = |reason: String| JavelinError::ReplacementArchive {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive)
        .map_err(|e| JavelinError::replacement(format!("opening {}", archive.display()), e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

    let mut dir_modes: Vec<(PathBuf, u32)> = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| invalid(e.to_string()))?;
        let target = match entry.enclosed_name() {
            Some(relative) => dest.join(relative),
            None => return Err(invalid(format!("entry {} escapes the root", entry.name()))),
        };

        if entry.is_dir() {
            create_dir_all(&target)?;
            if let Some(mode) = entry.unix_mode() {
                dir_modes.push((target, mode));
            }
            continue;
        }

        if let Some(parent) = target.parent() {
            create_dir_all(parent)?;
        }
        let mut out = File::create(&target)
            .map_err(|e| JavelinError::replacement(format!("creating {}", target.display()), e))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| invalid(format!("extracting {}: {}", entry.name(), e)))?;
        if let Some(mode) = entry.unix_mode() {
            apply_mode(&target, mode)?;
        }
    }

    // Deepest first, so a read-only parent doesn't block its children
    for (dir, mode) in dir_modes.iter().rev() {
        apply_mode(dir, *mode)?;
    }

    Ok(())
}

fn create_dir_all(path: &Path) -> JavelinResult<()> {
    fs::create_dir_all(path)
        .map_err(|e| JavelinError::replacement(format!("creating {}", path.display()), e))
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> JavelinResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)).map_err(|e| {
        JavelinError::replacement(format!("setting mode of {}", path.display()), e)
    })
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> JavelinResult<()> {
    Ok(())
}

fn remove_dir_best_effort(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

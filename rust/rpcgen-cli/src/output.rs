//! Writing generated files to disk.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rpcgen_codegen::{GeneratedFile, REMOTE_URL_PLACEHOLDER, link};

fn sibling(dir: &Path, suffix: &str) -> anyhow::Result<PathBuf> {
    let name = dir
        .file_name()
        .with_context(|| format!("{} has no directory name", dir.display()))?;
    let mut sibling = OsString::from(".");
    sibling.push(name);
    sibling.push(suffix);
    Ok(dir.with_file_name(sibling))
}

fn remove_if_present(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("removing {}", dir.display()))?;
    }
    Ok(())
}

fn write_all(root: &Path, files: &[GeneratedFile]) -> anyhow::Result<()> {
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, &file.content).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// Replaces `dir` with exactly `files`.
///
/// Everything is written to a staging sibling first; `dir` is only swapped
/// out once every file is on disk, so a failed run leaves the previous
/// output untouched and a successful one leaves no stale files.
pub fn replace_dir(dir: &Path, files: &[GeneratedFile]) -> anyhow::Result<()> {
    if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let staging = sibling(dir, ".rpcgen-staging")?;
    let backup = sibling(dir, ".rpcgen-old")?;
    remove_if_present(&staging)?;
    remove_if_present(&backup)?;

    fs::create_dir_all(&staging).with_context(|| format!("creating {}", staging.display()))?;
    if let Err(e) = write_all(&staging, files) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    if dir.exists() {
        fs::rename(dir, &backup)
            .with_context(|| format!("moving {} aside", dir.display()))?;
    }
    if let Err(e) = fs::rename(&staging, dir) {
        if backup.exists() {
            let _ = fs::rename(&backup, dir);
        }
        return Err(e).with_context(|| format!("moving output into {}", dir.display()));
    }
    remove_if_present(&backup)?;

    tracing::debug!(dir = %dir.display(), files = files.len(), "replaced output directory");
    Ok(())
}

/// Substitutes the URL placeholder in every file under `dir`. Returns the
/// files that changed.
pub fn link_dir(dir: &Path, url: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries =
            fs::read_dir(&current).with_context(|| format!("reading {}", current.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            // Generated files are always UTF-8; anything else is not ours.
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            if content.contains(REMOTE_URL_PLACEHOLDER) {
                fs::write(&path, link(&content, url))
                    .with_context(|| format!("writing {}", path.display()))?;
                changed.push(path);
            }
        }
    }
    changed.sort();
    Ok(changed)
}

use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Shallow-clone (depth 1) a git repository into `target`.
pub fn shallow_clone(url: &str, target: &Path) -> Result<()> {
    tracing::info!("Cloning {} into {}", url, target.display());

    let mut fetch = git2::FetchOptions::new();
    fetch.depth(1);
    git2::build::RepoBuilder::new()
        .fetch_options(fetch)
        .clone(url, target)
        .with_context(|| format!("Failed to clone {url}"))?;

    tracing::info!("Clone complete: {}", target.display());
    Ok(())
}

/// Copy the working tree at `src` to `dst`, leaving out `.git`.
/// Any previous content of `dst` is removed first.
pub fn copy_worktree(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() {
        std::fs::remove_dir_all(dst)
            .with_context(|| format!("Failed to clear {}", dst.display()))?;
    }
    std::fs::create_dir_all(dst)?;

    for entry in WalkDir::new(src)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry.context("Failed to walk cloned tree")?;
        let rel = entry.path().strip_prefix(src)?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let out = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&out)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &out)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

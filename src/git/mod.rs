//! Source materialization and file walking.

pub mod clone;
pub mod walk;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EngineError, Result};

pub use walk::{walk_files, SourceFile, WalkOutcome};

/// Where a project's files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Existing directory, walked in place
    Local(PathBuf),
    /// Anything else is handed to git
    Git(String),
}

impl Source {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let path = Path::new(raw);
        if path.is_dir() {
            Source::Local(path.to_path_buf())
        } else {
            Source::Git(raw.to_string())
        }
    }
}

/// Make the source available on disk and return the directory to walk.
///
/// Git sources are cloned into a temporary directory under a timeout and
/// only copied into `repos_dir/{project}` once the clone finished.
pub async fn materialize(
    source: &Source,
    project: &str,
    repos_dir: &Path,
    timeout_secs: u64,
) -> Result<PathBuf> {
    let url = match source {
        Source::Local(path) => return Ok(path.clone()),
        Source::Git(url) => url.clone(),
    };

    let clone_task = tokio::task::spawn_blocking(move || -> anyhow::Result<tempfile::TempDir> {
        let tmp = tempfile::tempdir()?;
        clone::shallow_clone(&url, tmp.path())?;
        Ok(tmp)
    });

    let tmp = match tokio::time::timeout(Duration::from_secs(timeout_secs), clone_task).await {
        Err(_) => {
            tracing::warn!("Clone for {project} timed out after {timeout_secs}s");
            return Err(EngineError::SourceFetchTimeout { secs: timeout_secs });
        }
        Ok(Err(join_err)) => return Err(EngineError::SourceFetchError(join_err.to_string())),
        Ok(Ok(Err(e))) => return Err(EngineError::SourceFetchError(format!("{e:#}"))),
        Ok(Ok(Ok(tmp))) => tmp,
    };

    let target = repos_dir.join(project);
    let copy_target = target.clone();
    tokio::task::spawn_blocking(move || clone::copy_worktree(tmp.path(), &copy_target))
        .await
        .map_err(|e| EngineError::SourceFetchError(e.to_string()))?
        .map_err(|e| EngineError::SourceFetchError(format!("{e:#}")))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_dir() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().to_string_lossy().to_string();
        assert_eq!(Source::parse(&raw), Source::Local(dir.path().to_path_buf()));
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(
            Source::parse("https://github.com/rust-lang/log.git"),
            Source::Git("https://github.com/rust-lang/log.git".to_string())
        );
    }

    #[tokio::test]
    async fn test_materialize_local_is_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let repos = tempfile::tempdir().unwrap();
        let source = Source::Local(dir.path().to_path_buf());

        let root = materialize(&source, "p", repos.path(), 5).await.unwrap();
        assert_eq!(root, dir.path());
        assert!(!repos.path().join("p").exists());
    }

    #[tokio::test]
    async fn test_materialize_bad_git_source_is_fetch_error() {
        let repos = tempfile::tempdir().unwrap();
        let source = Source::Git("/no/such/repository".to_string());

        let err = materialize(&source, "p", repos.path(), 30).await.unwrap_err();
        assert!(matches!(err, EngineError::SourceFetchError(_)));
        assert!(!repos.path().join("p").exists());
    }
}

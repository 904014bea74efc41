use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::config::IngestConfig;

/// A file picked up for ingestion.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the project root, `/`-separated
    pub relative_path: String,
    pub content: String,
    pub language: String,
    pub size_bytes: u64,
}

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<SourceFile>,
    /// Files that matched the extension filter but were too large or unreadable
    pub skipped: usize,
}

/// Walk `root` in sorted order and collect every indexable file.
pub fn walk_files(root: &Path, config: &IngestConfig) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let max_bytes = config.max_file_size_kb * 1024;

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e, config))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_allowed_extension(path, config) {
            continue;
        }

        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", path.display());
                outcome.skipped += 1;
                continue;
            }
        };
        if size_bytes > max_bytes {
            tracing::debug!("Skipping large file {} ({size_bytes} bytes)", path.display());
            outcome.skipped += 1;
            continue;
        }

        let content = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", path.display());
                outcome.skipped += 1;
                continue;
            }
        };

        outcome.files.push(SourceFile {
            relative_path: relative_path(root, path),
            content,
            language: detect_language(path).to_string(),
            size_bytes,
        });
    }

    outcome
}

/// `/`-joined path of `path` below `root`, independent of the host separator.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded(entry: &DirEntry, config: &IngestConfig) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    config.excluded_dirs.iter().any(|d| d == name.as_ref())
}

fn has_allowed_extension(path: &Path, config: &IngestConfig) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = ext.to_string_lossy().to_lowercase();
    config.allowed_extensions.iter().any(|e| *e == ext)
}

pub fn detect_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "rs" => "Rust",
        "py" => "Python",
        "js" | "mjs" | "cjs" => "JavaScript",
        "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "go" => "Go",
        "java" => "Java",
        "c" => "C",
        "cpp" | "cc" => "C++",
        "h" | "hpp" => "C/C++ Header",
        "cs" => "C#",
        "rb" => "Ruby",
        "php" => "PHP",
        "swift" => "Swift",
        "kt" | "kts" => "Kotlin",
        "json" => "JSON",
        "md" => "Markdown",
        _ => "Other",
    }
}

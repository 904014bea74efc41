//! Cheap structural facts about a project's file list.

use std::collections::HashMap;
use std::path::Path;

use crate::git::walk::detect_language;

const ENTRY_POINT_NAMES: &[&str] = &[
    "main.py",
    "app.py",
    "index.js",
    "server.js",
    "main.rs",
    "main.go",
];

/// File count per language, most common first. Unknown extensions are left out.
pub fn detect_languages<S: AsRef<str>>(files: &[S]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for file in files {
        let file: &str = file.as_ref();
        let lang = detect_language(Path::new(file));
        if lang != "Other" {
            *counts.entry(lang).or_default() += 1;
        }
    }

    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(lang, n)| (lang.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

pub fn detect_entry_points<S: AsRef<str>>(files: &[S]) -> Vec<String> {
    files
        .iter()
        .map(|f| -> &str { f.as_ref() })
        .filter(|f| {
            let name = f.rsplit('/').next().unwrap_or_default().to_lowercase();
            ENTRY_POINT_NAMES.contains(&name.as_str())
        })
        .map(str::to_string)
        .collect()
}

/// The `top_n` largest files by size, largest first.
pub fn detect_largest_files<'a>(
    files: impl IntoIterator<Item = (&'a str, u64)>,
    top_n: usize,
) -> Vec<String> {
    let mut sized: Vec<(&str, u64)> = files.into_iter().collect();
    sized.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sized
        .into_iter()
        .take(top_n)
        .map(|(path, _)| path.to_string())
        .collect()
}

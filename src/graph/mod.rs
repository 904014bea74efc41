//! Static dependency graph over a project's files.
//!
//! Each file contributes raw reference tokens (see [`extract`]). A token
//! resolves to every project path that contains it. Resolution is memoised
//! per distinct token, so a token shared by many files is matched against
//! the path list once.

pub mod extract;
pub mod impact;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use crate::error::Result;
use crate::git::SourceFile;
use crate::search::vector::write_atomic;

pub use extract::extract_references;
pub use impact::score;

/// `file_path -> reference tokens`
pub type DependencyMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

/// Either persisted shape. Older artifacts are plain maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyArtifact {
    Graph(DependencyGraph),
    Map(DependencyMap),
}

pub fn build_map(files: &[SourceFile]) -> DependencyMap {
    files
        .iter()
        .map(|f| {
            (
                f.relative_path.clone(),
                extract_references(&f.relative_path, &f.content),
            )
        })
        .collect()
}

pub fn build_graph(files: &[SourceFile]) -> DependencyGraph {
    let map = build_map(files);
    let nodes: Vec<String> = files.iter().map(|f| f.relative_path.clone()).collect();
    let mut resolver = Resolver::new(&nodes);
    let mut edges = Vec::new();

    for (source_idx, source) in nodes.iter().enumerate() {
        let Some(tokens) = map.get(source) else {
            continue;
        };
        let mut targets = BTreeSet::new();
        for token in tokens {
            targets.extend(resolver.resolve(token).iter().copied());
        }
        targets.remove(&source_idx);

        edges.extend(targets.into_iter().map(|t| Edge {
            source: source.clone(),
            target: nodes[t].clone(),
        }));
    }

    tracing::debug!(
        "Built dependency graph: {} nodes, {} edges, {} distinct tokens",
        nodes.len(),
        edges.len(),
        resolver.cache.len()
    );
    DependencyGraph { nodes, edges }
}

/// Memoised token → matching path indices.
struct Resolver<'a> {
    paths: &'a [String],
    cache: HashMap<String, Vec<usize>>,
}

impl<'a> Resolver<'a> {
    fn new(paths: &'a [String]) -> Self {
        Self {
            paths,
            cache: HashMap::new(),
        }
    }

    fn resolve(&mut self, token: &str) -> &[usize] {
        let paths = self.paths;
        self.cache.entry(token.to_string()).or_insert_with(|| {
            if token.is_empty() {
                return Vec::new();
            }
            paths
                .iter()
                .enumerate()
                .filter(|(_, p)| p.contains(token))
                .map(|(i, _)| i)
                .collect()
        })
    }
}

/// Per-project dependency artifacts under one directory.
#[derive(Debug, Clone)]
pub struct GraphStore {
    dir: PathBuf,
}

impl GraphStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, project: &str) -> PathBuf {
        self.dir.join(format!("{project}.json"))
    }

    /// Replace the project's artifact wholesale.
    pub fn persist(&self, project: &str, artifact: &DependencyArtifact) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        write_atomic(&self.path(project), &serde_json::to_vec(artifact)?)?;
        Ok(())
    }

    /// `None` when nothing was ever persisted for the project.
    pub fn load(&self, project: &str) -> Result<Option<DependencyArtifact>> {
        let path = self.path(project);
        if !path.exists() {
            return Ok(None);
        }
        let artifact = serde_json::from_slice(&std::fs::read(&path)?)?;
        Ok(Some(artifact))
    }
}

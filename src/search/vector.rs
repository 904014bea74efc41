use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::models::Chunk;

/// Exact nearest-neighbour index over fixed-dimension vectors.
///
/// `vectors[i]` always belongs to `metadata[i]`.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    metadata: Vec<Chunk>,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk: Chunk,
    pub distance: f32,
}

/// On-disk layout of the vector file.
#[derive(Serialize, Deserialize)]
struct VectorFile {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn metadata(&self) -> &[Chunk] {
        &self.metadata
    }

    /// Replace the whole store. Nothing is kept from earlier calls.
    ///
    /// Validation runs before anything is touched, so a failed rebuild
    /// leaves the previous content intact.
    pub fn rebuild(&mut self, vectors: Vec<Vec<f32>>, metadata: Vec<Chunk>) -> Result<()> {
        if vectors.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        if vectors.len() != metadata.len() {
            return Err(EngineError::LengthMismatch {
                vectors: vectors.len(),
                metadata: metadata.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        self.vectors = vectors;
        self.metadata = metadata;
        Ok(())
    }

    /// Up to `k` entries ordered by ascending Euclidean distance.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        if query.len() != self.dimension {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (euclidean_distance(query, v), i))
            .collect();

        // Stable sort keeps insertion order between equal distances
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, i)| VectorHit {
                chunk: self.metadata[i].clone(),
                distance,
            })
            .collect())
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Filesystem layout for persisted project indexes.
#[derive(Debug, Clone)]
pub struct IndexStore {
    index_dir: PathBuf,
    metadata_dir: PathBuf,
}

impl IndexStore {
    pub fn new(index_dir: impl Into<PathBuf>, metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            metadata_dir: metadata_dir.into(),
        }
    }

    pub fn index_path(&self, project: &str) -> PathBuf {
        self.index_dir.join(format!("{project}.index"))
    }

    pub fn metadata_path(&self, project: &str) -> PathBuf {
        self.metadata_dir.join(format!("{project}.json"))
    }

    pub fn exists(&self, project: &str) -> bool {
        self.index_path(project).exists()
    }

    /// Write both artifacts, each via temp file + rename.
    pub fn persist(&self, project: &str, index: &VectorIndex) -> Result<()> {
        std::fs::create_dir_all(&self.index_dir)?;
        std::fs::create_dir_all(&self.metadata_dir)?;

        let vectors = serde_json::to_vec(&VectorFile {
            dimension: index.dimension,
            vectors: index.vectors.clone(),
        })?;
        let metadata = serde_json::to_vec(&index.metadata)?;

        write_atomic(&self.metadata_path(project), &metadata)?;
        write_atomic(&self.index_path(project), &vectors)?;

        tracing::debug!(
            "Persisted {} vectors for project {project}",
            index.vectors.len()
        );
        Ok(())
    }

    /// Load a project's index. A project that was never persisted loads as
    /// an empty store of the given dimension.
    pub fn load(&self, project: &str, dimension: usize) -> Result<VectorIndex> {
        let index_path = self.index_path(project);
        if !index_path.exists() {
            return Ok(VectorIndex::new(dimension));
        }

        let file: VectorFile = serde_json::from_slice(&std::fs::read(&index_path)?)?;
        let metadata_path = self.metadata_path(project);
        let metadata: Vec<Chunk> = if metadata_path.exists() {
            serde_json::from_slice(&std::fs::read(&metadata_path)?)?
        } else {
            Vec::new()
        };

        if file.vectors.len() != metadata.len()
            || file.vectors.iter().any(|v| v.len() != file.dimension)
        {
            return Err(EngineError::CorruptIndex(index_path));
        }

        Ok(VectorIndex {
            dimension: file.dimension,
            vectors: file.vectors,
            metadata,
        })
    }
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chunk(path: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            file_path: path.to_string(),
            start_offset: 0,
            end_offset: 4,
            start_line: 1,
            end_line: 1,
            content: format!("content of {path}"),
        }
    }

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new(3);
        index
            .rebuild(
                vec![
                    vec![0.1, 0.2, 0.9],
                    vec![0.9, 0.1, 0.1],
                    vec![0.2, 0.8, 0.3],
                ],
                vec![chunk("src/main.rs"), chunk("src/db.rs"), chunk("src/handlers.rs")],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_search_exact_match_first_with_zero_distance() {
        let index = sample_index();
        let hits = index.search(&[0.9, 0.1, 0.1], 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.file_path, "src/db.rs");
        assert_eq!(hits[0].distance, 0.0);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[test]
    fn test_search_limits_to_k() {
        let index = sample_index();
        assert_eq!(index.search(&[0.0, 0.0, 0.0], 2).unwrap().len(), 2);
        assert!(index.search(&[0.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_store() {
        let index = VectorIndex::new(3);
        assert!(index.search(&[1.0, 2.0, 3.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 2.0], 5),
            Err(EngineError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_rebuild_dimension_mismatch_keeps_old_content() {
        let mut index = sample_index();
        let result = index.rebuild(vec![vec![1.0, 2.0]], vec![chunk("x.py")]);
        assert!(matches!(result, Err(EngineError::DimensionMismatch { .. })));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_rebuild_empty_input() {
        let mut index = VectorIndex::new(3);
        assert!(matches!(
            index.rebuild(Vec::new(), Vec::new()),
            Err(EngineError::EmptyInput)
        ));
    }

    #[test]
    fn test_rebuild_replaces_instead_of_appending() {
        let mut index = sample_index();
        index
            .rebuild(vec![vec![1.0, 1.0, 1.0]], vec![chunk("only.py")])
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.metadata()[0].file_path, "only.py");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = VectorIndex::new(2);
        index
            .rebuild(
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                vec![chunk("first"), chunk("second")],
            )
            .unwrap();
        let hits = index.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].chunk.file_path, "first");
    }

    #[test]
    fn test_persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("indexes"), dir.path().join("metadata"));
        let index = sample_index();

        store.persist("demo", &index).unwrap();
        assert!(store.exists("demo"));

        let loaded = store.load("demo", 3).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.metadata(), index.metadata());
    }

    #[test]
    fn test_load_missing_project_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("indexes"), dir.path().join("metadata"));
        let loaded = store.load("nope", 8).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.dimension(), 8);
        assert!(!store.exists("nope"));
    }

    #[test]
    fn test_load_detects_desynchronized_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("indexes"), dir.path().join("metadata"));
        store.persist("demo", &sample_index()).unwrap();
        std::fs::write(store.metadata_path("demo"), "[]").unwrap();

        assert!(matches!(
            store.load("demo", 3),
            Err(EngineError::CorruptIndex(_))
        ));
    }
}

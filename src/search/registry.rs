//! Process-wide cache of project indexes.
//!
//! Readers get an immutable `Arc` snapshot. Replacing a project's index
//! happens under that project's async mutex: persist first, then swap the
//! snapshot, so an in-flight search keeps reading the old one.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::search::vector::{IndexStore, VectorIndex};

#[derive(Default)]
struct ProjectSlot {
    /// Held for a whole ingestion run
    ingest_lock: Arc<tokio::sync::Mutex<()>>,
    /// Held while artifacts are written or lazily loaded
    write_lock: tokio::sync::Mutex<()>,
    current: RwLock<Option<Arc<VectorIndex>>>,
}

pub struct IndexRegistry {
    store: IndexStore,
    dimension: usize,
    slots: Mutex<HashMap<String, Arc<ProjectSlot>>>,
}

impl IndexRegistry {
    pub fn new(store: IndexStore, dimension: usize) -> Self {
        Self {
            store,
            dimension,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    fn slot(&self, project: &str) -> Arc<ProjectSlot> {
        self.slots
            .lock()
            .entry(project.to_string())
            .or_default()
            .clone()
    }

    /// Serialise ingestion runs of one project. Readers are not blocked.
    pub async fn lock_ingest(&self, project: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = self.slot(project).ingest_lock.clone();
        lock.lock_owned().await
    }

    /// Current index for `project`, loading it from disk on first use.
    /// `None` means the project has never been ingested.
    pub async fn snapshot(&self, project: &str) -> Result<Option<Arc<VectorIndex>>> {
        let slot = self.slot(project);
        let cached = slot.current.read().clone();
        if cached.is_some() {
            return Ok(cached);
        }

        let _guard = slot.write_lock.lock().await;
        let cached = slot.current.read().clone();
        if cached.is_some() {
            return Ok(cached);
        }
        if !self.store.exists(project) {
            return Ok(None);
        }

        let store = self.store.clone();
        let (name, dimension) = (project.to_string(), self.dimension);
        let index = tokio::task::spawn_blocking(move || store.load(&name, dimension))
            .await
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))??;
        let index = Arc::new(index);
        tracing::info!("Loaded index for {project} ({} vectors)", index.len());
        *slot.current.write() = Some(index.clone());
        Ok(Some(index))
    }

    /// Persist `index` as the project's new index and make it visible.
    pub async fn replace(&self, project: &str, index: VectorIndex) -> Result<()> {
        let slot = self.slot(project);
        let _guard = slot.write_lock.lock().await;

        let index = Arc::new(index);
        let store = self.store.clone();
        let (name, to_write) = (project.to_string(), index.clone());
        tokio::task::spawn_blocking(move || store.persist(&name, &to_write))
            .await
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))??;

        *slot.current.write() = Some(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use uuid::Uuid;

    fn index_with(paths: &[&str]) -> VectorIndex {
        let mut index = VectorIndex::new(2);
        let vectors = paths.iter().map(|_| vec![0.5, 0.5]).collect();
        let metadata = paths
            .iter()
            .map(|p| Chunk {
                id: Uuid::new_v4(),
                file_path: p.to_string(),
                start_offset: 0,
                end_offset: 1,
                start_line: 1,
                end_line: 1,
                content: "x".into(),
            })
            .collect();
        index.rebuild(vectors, metadata).unwrap();
        index
    }

    fn registry(dir: &std::path::Path) -> IndexRegistry {
        IndexRegistry::new(IndexStore::new(dir.join("i"), dir.join("m")), 2)
    }

    #[tokio::test]
    async fn test_snapshot_of_unknown_project_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(registry(dir.path()).snapshot("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_old_snapshot_survives_replace() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        registry.replace("p", index_with(&["a.py", "b.py"])).await.unwrap();
        let before = registry.snapshot("p").await.unwrap().unwrap();

        registry.replace("p", index_with(&["c.py"])).await.unwrap();
        let after = registry.snapshot("p").await.unwrap().unwrap();

        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 1);
        assert_eq!(after.metadata()[0].file_path, "c.py");
    }

    #[tokio::test]
    async fn test_ingest_lock_does_not_block_replace() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        let _guard = registry.lock_ingest("p").await;
        registry.replace("p", index_with(&["a.py"])).await.unwrap();
        assert!(registry.snapshot("p").await.unwrap().is_some());
        assert!(registry.slot("p").ingest_lock.try_lock().is_err());
    }

    #[tokio::test]
    async fn test_fresh_registry_loads_persisted_index() {
        let dir = tempfile::tempdir().unwrap();
        registry(dir.path())
            .replace("p", index_with(&["a.py"]))
            .await
            .unwrap();

        let reopened = registry(dir.path());
        let index = reopened.snapshot("p").await.unwrap().unwrap();
        assert_eq!(index.metadata()[0].file_path, "a.py");
    }
}

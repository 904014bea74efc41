//! Ingestion pipeline: materialize, walk, chunk, embed, index, graph.
//!
//! Everything is accumulated in memory and written once at the end, so a
//! failed or cancelled run leaves the previous artifacts in place.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::detect_largest_files;
use crate::chunking::chunk_file;
use crate::config::IngestConfig;
use crate::error::{validate_project_name, EngineError, Result};
use crate::git::{materialize, walk_files, Source, SourceFile, WalkOutcome};
use crate::graph::{build_graph, DependencyArtifact, GraphStore};
use crate::llm::EmbeddingProvider;
use crate::models::{Chunk, IngestReport};
use crate::search::registry::IndexRegistry;
use crate::search::vector::VectorIndex;

const LARGEST_FILES: usize = 5;

pub struct Ingestor<E> {
    embedder: E,
    registry: Arc<IndexRegistry>,
    graphs: GraphStore,
    config: IngestConfig,
    repos_dir: PathBuf,
    timeout: Duration,
}

/// Chunks and vectors gathered across files, index-aligned.
#[derive(Default)]
struct Accumulator {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    file_count: usize,
    skipped_files: usize,
    truncated: bool,
}

impl<E: EmbeddingProvider> Ingestor<E> {
    pub fn new(
        embedder: E,
        registry: Arc<IndexRegistry>,
        graphs: GraphStore,
        config: IngestConfig,
        repos_dir: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            registry,
            graphs,
            config,
            repos_dir,
            timeout,
        }
    }

    pub fn graphs(&self) -> &GraphStore {
        &self.graphs
    }

    /// Fully rebuild `project` from `source` (git URL or local directory).
    pub async fn ingest(&self, source: &str, project: &str) -> Result<IngestReport> {
        let project = validate_project_name(project)?;
        let _guard = self.registry.lock_ingest(&project).await;

        let source = Source::parse(source);
        let root = materialize(
            &source,
            &project,
            &self.repos_dir,
            self.config.clone_timeout_secs,
        )
        .await?;

        let walk_config = self.config.clone();
        let WalkOutcome { files, skipped } =
            tokio::task::spawn_blocking(move || walk_files(&root, &walk_config))
                .await
                .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;
        tracing::info!("Found {} indexable files for {project}", files.len());

        let mut acc = Accumulator {
            skipped_files: skipped,
            ..Accumulator::default()
        };
        for (i, file) in files.iter().enumerate() {
            self.ingest_file(file, &mut acc).await?;
            if acc.truncated {
                acc.skipped_files += files.len() - i - 1;
                tracing::warn!(
                    "Chunk cap of {} reached for {project}, remaining files skipped",
                    self.config.max_chunks
                );
                break;
            }
        }

        let largest_files = detect_largest_files(
            files
                .iter()
                .map(|f| (f.relative_path.as_str(), f.size_bytes)),
            LARGEST_FILES,
        );

        if acc.chunks.is_empty() {
            tracing::warn!("No chunks produced for {project}, nothing persisted");
            return Ok(IngestReport {
                project,
                message: "No valid files found.".to_string(),
                chunk_count: 0,
                file_count: 0,
                skipped_files: acc.skipped_files,
                truncated: acc.truncated,
                largest_files,
                indexed_at: None,
            });
        }

        let chunk_count = acc.chunks.len();
        let mut index = VectorIndex::new(self.registry.dimension());
        index.rebuild(acc.vectors, acc.chunks)?;

        let graph = tokio::task::spawn_blocking(move || build_graph(&files))
            .await
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;

        self.registry.replace(&project, index).await?;
        self.graphs
            .persist(&project, &DependencyArtifact::Graph(graph))?;

        tracing::info!(
            "Indexed {chunk_count} chunks from {} files for {project}",
            acc.file_count
        );
        Ok(IngestReport {
            message: format!("Project '{project}' ingested successfully."),
            project,
            chunk_count,
            file_count: acc.file_count,
            skipped_files: acc.skipped_files,
            truncated: acc.truncated,
            largest_files,
            indexed_at: Some(Utc::now()),
        })
    }

    /// Chunk and embed one file into `acc`. A file whose embedding fails is
    /// dropped whole.
    async fn ingest_file(&self, file: &SourceFile, acc: &mut Accumulator) -> Result<()> {
        let mut chunks = chunk_file(&file.relative_path, &file.content, &self.config)?;
        if chunks.is_empty() {
            return Ok(());
        }

        let remaining = self.config.max_chunks.saturating_sub(acc.chunks.len());
        if chunks.len() > remaining {
            chunks.truncate(remaining);
            acc.truncated = true;
        }
        if chunks.is_empty() {
            acc.skipped_files += 1;
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = match tokio::time::timeout(self.timeout, self.embedder.embed_batch(&texts))
            .await
        {
            Ok(Ok(vectors)) if vectors.len() == chunks.len() => vectors,
            Ok(Ok(vectors)) => {
                tracing::warn!(
                    "Embedding count mismatch for {}: {} chunks, {} vectors",
                    file.relative_path,
                    chunks.len(),
                    vectors.len()
                );
                acc.skipped_files += 1;
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to embed {}: {e:#}", file.relative_path);
                acc.skipped_files += 1;
                return Ok(());
            }
            Err(_) => {
                tracing::warn!("Embedding timed out for {}", file.relative_path);
                acc.skipped_files += 1;
                return Ok(());
            }
        };

        acc.chunks.extend(chunks);
        acc.vectors.extend(vectors);
        acc.file_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::HashEmbedder;
    use crate::search::vector::IndexStore;

    fn ingestor(data: &std::path::Path, config: IngestConfig) -> Ingestor<HashEmbedder> {
        let registry = Arc::new(IndexRegistry::new(
            IndexStore::new(data.join("indexes"), data.join("metadata")),
            8,
        ));
        Ingestor::new(
            HashEmbedder::new(8),
            registry,
            GraphStore::new(data.join("graphs")),
            config,
            data.join("repos"),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_empty_project_persists_nothing() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("image.png"), "binary").unwrap();
        let data = tempfile::tempdir().unwrap();

        let ingestor = ingestor(data.path(), IngestConfig::default());
        let report = ingestor
            .ingest(&src.path().to_string_lossy(), "empty")
            .await
            .unwrap();

        assert_eq!(report.chunk_count, 0);
        assert_eq!(report.message, "No valid files found.");
        assert!(!ingestor.registry.store().exists("empty"));
        assert!(ingestor.graphs.load("empty").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chunk_cap_truncates() {
        let src = tempfile::tempdir().unwrap();
        for name in ["a.md", "b.md", "c.md"] {
            std::fs::write(src.path().join(name), "x".repeat(1000)).unwrap();
        }
        let data = tempfile::tempdir().unwrap();
        let config = IngestConfig {
            max_chunks: 4,
            ..IngestConfig::default()
        };

        let report = ingestor(data.path(), config)
            .ingest(&src.path().to_string_lossy(), "capped")
            .await
            .unwrap();

        // 1000 chars at step 400 gives 3 windows per file
        assert_eq!(report.chunk_count, 4);
        assert_eq!(report.file_count, 2);
        assert!(report.truncated);
        assert_eq!(report.skipped_files, 1);
    }

    #[tokio::test]
    async fn test_invalid_project_name() {
        let data = tempfile::tempdir().unwrap();
        let err = ingestor(data.path(), IngestConfig::default())
            .ingest(".", "../escape")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProject(_)));
    }
}

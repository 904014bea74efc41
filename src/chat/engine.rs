use regex::Regex;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use super::prompt::{build_context, build_overview_prompt, build_prompt, truncate_chars};
use super::session::SessionStore;
use crate::analysis::{detect_entry_points, detect_languages};
use crate::config::QueryConfig;
use crate::error::{validate_project_name, EngineError, Result};
use crate::llm::{EmbeddingProvider, LanguageModel};
use crate::models::{ErrorContextResponse, FileReference};
use crate::search::registry::IndexRegistry;

static TRACEBACK_FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"File "(.+?)", line (\d+)"#).unwrap());

const OVERVIEW_SAMPLE: usize = 10;
const ERROR_CONTEXT_K: usize = 5;

/// Retrieval-augmented question answering over one project index.
pub struct QueryEngine<E, L> {
    embedder: E,
    llm: L,
    registry: Arc<IndexRegistry>,
    sessions: Arc<SessionStore>,
    config: QueryConfig,
    timeout: Duration,
}

impl<E: EmbeddingProvider, L: LanguageModel> QueryEngine<E, L> {
    pub fn new(
        embedder: E,
        llm: L,
        registry: Arc<IndexRegistry>,
        sessions: Arc<SessionStore>,
        config: QueryConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            llm,
            registry,
            sessions,
            config,
            timeout,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Run a provider call under the per-call timeout.
    async fn call<T>(
        &self,
        what: &str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(EngineError::Provider(format!("{what}: {e:#}"))),
            Err(_) => Err(EngineError::Provider(format!(
                "{what} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    /// Answer `question` against `project`, continuing `session_id`.
    ///
    /// Missing indexes and provider failures come back as answer text. Only
    /// invalid project names and index invariant violations are errors.
    pub async fn query(&self, project: &str, session_id: &str, question: &str) -> Result<String> {
        let project = validate_project_name(project)?;

        let Some(index) = self.registry.snapshot(&project).await? else {
            return Ok(format!(
                "Index not found for project '{project}'. Please ingest first."
            ));
        };

        let query_vector = match self.call("embedding", self.embedder.embed(question)).await {
            Ok(v) => v,
            Err(e) => return Ok(format!("Error: {e}")),
        };

        let hits = index.search(&query_vector, self.config.top_k)?;
        if hits.is_empty() {
            return Ok("No relevant code found.".to_string());
        }

        let context = build_context(
            hits.iter().map(|h| h.chunk.content.as_str()),
            self.config.max_context_chars,
        );
        tracing::info!(
            "Query on {project}: {} chunks retrieved, context {} chars",
            hits.len(),
            context.chars().count()
        );

        let handle = self.sessions.get_or_create(session_id);
        let mut session = handle.lock().await;

        let prompt = build_prompt(&session.messages, &context, question);
        match self.call(self.llm.name(), self.llm.complete(&prompt)).await {
            Ok(answer) => {
                session.push_turn(question, &answer, self.config.max_history_pairs);
                Ok(answer)
            }
            Err(e) => {
                tracing::warn!("Completion failed for session {session_id}: {e}");
                Ok(format!("Error: {e}"))
            }
        }
    }

    /// High-level summary of an ingested project.
    pub async fn architecture_overview(&self, project: &str) -> Result<String> {
        let project = validate_project_name(project)?;

        let index = match self.registry.snapshot(&project).await? {
            Some(index) if !index.is_empty() => index,
            _ => return Ok(format!("No project indexed for '{project}'.")),
        };

        let files: Vec<&str> = index
            .metadata()
            .iter()
            .map(|c| c.file_path.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let sample: Vec<String> = index
            .metadata()
            .iter()
            .take(OVERVIEW_SAMPLE)
            .map(|c| {
                format!(
                    "{} (lines {}-{}):\n{}",
                    c.file_path,
                    c.start_line,
                    c.end_line,
                    truncate_chars(&c.content, self.config.max_context_chars / OVERVIEW_SAMPLE)
                )
            })
            .collect();

        let prompt = build_overview_prompt(
            &project,
            &sample,
            &detect_languages(&files),
            &detect_entry_points(&files),
        );

        match self.call(self.llm.name(), self.llm.complete(&prompt)).await {
            Ok(overview) => Ok(overview),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }

    /// Traceback frames plus the chunks nearest to the error text.
    pub async fn error_context(&self, project: &str, error_text: &str) -> Result<ErrorContextResponse> {
        let project = validate_project_name(project)?;
        let references = extract_file_references(error_text);

        let Some(index) = self.registry.snapshot(&project).await? else {
            return Ok(ErrorContextResponse {
                references,
                chunks: Vec::new(),
                message: None,
            });
        };

        let vector = match self.call("embedding", self.embedder.embed(error_text)).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Error context for {project} without chunks: {e}");
                return Ok(ErrorContextResponse {
                    references,
                    chunks: Vec::new(),
                    message: Some(format!("Error: {e}")),
                });
            }
        };
        let chunks = index
            .search(&vector, ERROR_CONTEXT_K)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect();

        Ok(ErrorContextResponse {
            references,
            chunks,
            message: None,
        })
    }
}

/// `File "<path>", line <n>` frames, in order of appearance.
pub fn extract_file_references(error_text: &str) -> Vec<FileReference> {
    TRACEBACK_FRAME
        .captures_iter(error_text)
        .filter_map(|caps| {
            let line = caps[2].parse().ok()?;
            Some(FileReference {
                file_path: caps[1].to_string(),
                line,
            })
        })
        .collect()
}

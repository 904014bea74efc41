use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EmbeddingProvider;
use crate::config::LlmConfig;

/// Maximum characters to send per text to the embedding API.
/// Keeps dense inputs (minified JS, JSON blobs) under an 8k-token context.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Embedding backend chosen once from configuration.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    Hash(HashEmbedder),
    Ollama(HttpEmbedder),
    OpenAi(HttpEmbedder),
}

impl AnyEmbedder {
    pub fn from_config(client: &reqwest::Client, config: &LlmConfig) -> Result<Self> {
        let http = || HttpEmbedder {
            client: client.clone(),
            base_url: config.embedding_base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            api_key: config
                .embedding_api_key
                .clone()
                .or_else(|| config.api_key.clone()),
            dimension: config.embedding_dim,
            timeout: Duration::from_secs(config.timeout_secs),
        };

        match config.embedding_provider.as_str() {
            "hash" => Ok(Self::Hash(HashEmbedder::new(config.embedding_dim))),
            "ollama" => Ok(Self::Ollama(http())),
            "openai" => Ok(Self::OpenAi(http())),
            other => anyhow::bail!("Unknown embedding provider: {other}"),
        }
    }
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text.to_string()]).await?;
        out.pop().context("No embedding returned")
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::Hash(h) => Ok(texts.iter().map(|t| h.vector_for(t)).collect()),
            Self::Ollama(h) => embed_ollama(h, texts).await,
            Self::OpenAi(h) => embed_openai(h, texts).await,
        }
    }

    fn dimension(&self) -> usize {
        match self {
            Self::Hash(h) => h.dimension,
            Self::Ollama(h) | Self::OpenAi(h) => h.dimension,
        }
    }
}

// ─── Deterministic hash embedder ─────────────────────────

/// Offline embedder: expands a blake3 hash of the text into a pseudo-random
/// vector. Same text, same vector, on every run and platform.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut bytes = vec![0u8; self.dimension * 4];
        blake3::Hasher::new()
            .update(text.as_bytes())
            .finalize_xof()
            .fill(&mut bytes);

        bytes
            .chunks_exact(4)
            .map(|b| {
                let bits = u32::from_le_bytes([b[0], b[1], b[2], b[3]]) >> 8;
                bits as f32 / (1u32 << 24) as f32
            })
            .collect()
    }
}

impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ─── HTTP embedders ──────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    timeout: Duration,
}

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to truncate over-long inputs instead of failing
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(h: &HttpEmbedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/api/embed", h.base_url);
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(32) {
        let req = OllamaEmbedRequest {
            model: h.model.clone(),
            input: batch
                .iter()
                .map(|t| truncate_for_embedding(t).to_string())
                .collect(),
            truncate: true,
        };

        let resp = h
            .client
            .post(&url)
            .timeout(h.timeout)
            .json(&req)
            .send()
            .await
            .context("Failed to call Ollama embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama embed API returned {status}: {body}");
        }

        let body: OllamaEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse Ollama embed response")?;
        all_embeddings.extend(body.embeddings);
    }

    Ok(all_embeddings)
}

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(h: &HttpEmbedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/v1/embeddings", h.base_url);
    let api_key = h.api_key.as_deref().unwrap_or_default();
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(64) {
        let req = OpenAiEmbedRequest {
            model: h.model.clone(),
            input: batch
                .iter()
                .map(|t| truncate_for_embedding(t).to_string())
                .collect(),
        };

        let resp = h
            .client
            .post(&url)
            .timeout(h.timeout)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .context("Failed to call OpenAI embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI embed API returned {status}: {body}");
        }

        let body: OpenAiEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse OpenAI embed response")?;
        all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
    }

    Ok(all_embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embedder_is_deterministic() {
        let h = HashEmbedder::new(16);
        assert_eq!(h.vector_for("fn main() {}"), h.vector_for("fn main() {}"));
        assert_ne!(h.vector_for("a"), h.vector_for("b"));
    }

    #[test]
    fn test_hash_embedder_dimension_and_range() {
        let v = HashEmbedder::new(1536).vector_for("hello");
        assert_eq!(v.len(), 1536);
        assert!(v.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[tokio::test]
    async fn test_any_embedder_hash_batch_preserves_order() {
        let embedder = AnyEmbedder::Hash(HashEmbedder::new(8));
        let texts = vec!["one".to_string(), "two".to_string()];
        let out = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], HashEmbedder::new(8).vector_for("two"));
        assert_eq!(embedder.embed("one").await.unwrap(), out[0]);
    }

    #[test]
    fn test_from_config_rejects_unknown_provider() {
        let config = LlmConfig {
            embedding_provider: "bogus".into(),
            ..LlmConfig::default()
        };
        assert!(AnyEmbedder::from_config(&reqwest::Client::new(), &config).is_err());
    }

    #[test]
    fn test_truncate_for_embedding_respects_char_boundary() {
        let s = "é".repeat(MAX_EMBED_CHARS);
        let t = truncate_for_embedding(&s);
        assert!(t.len() <= MAX_EMBED_CHARS);
        assert!(s.is_char_boundary(t.len()));
    }
}

//! Embedding and language-model providers.
//!
//! The engine is generic over [`EmbeddingProvider`] and [`LanguageModel`].
//! The binary picks one concrete variant of each at startup through
//! [`AnyEmbedder`] and [`AnyChatModel`].

pub mod chat;
pub mod embeddings;

use std::future::Future;

pub use chat::AnyChatModel;
pub use embeddings::{AnyEmbedder, HashEmbedder};

pub trait EmbeddingProvider: Send + Sync {
    /// Map `text` to a vector of length [`Self::dimension`].
    fn embed(&self, text: &str) -> impl Future<Output = anyhow::Result<Vec<f32>>> + Send;

    /// Embed many texts. Order of the output matches `texts`.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send {
        async move {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    fn dimension(&self) -> usize;
}

pub trait LanguageModel: Send + Sync {
    /// Send a single prompt and return the model's text.
    fn complete(&self, prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send;

    fn name(&self) -> &'static str;
}

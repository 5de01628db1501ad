//! Embedding provider traits and configuration.

use std::time::Duration;

use crate::error::Result;

/// Default sentence embedding model.
pub const DEFAULT_MODEL: &str = "all-mpnet-base-v2";

/// Configuration for embedding providers.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Model identifier understood by the provider.
    pub model: String,

    /// Request timeout for remote providers.
    pub timeout: Duration,

    /// Let the provider truncate inputs longer than the model context.
    pub truncate: bool,
}

impl EmbeddingConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            truncate: true,
        }
    }
}

/// Turns text into fixed-length vectors.
///
/// Implementations must be thread-safe (Send + Sync) so a pipeline holding
/// one can be moved across threads.
pub trait Embedder: Send + Sync {
    /// Identifier of the loaded model.
    fn model_id(&self) -> &str;

    /// Embed one text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per text in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the name of this provider (for logging/debugging).
    fn name(&self) -> &str;
}

/// Resolves a model identifier into a ready embedder.
pub trait EmbedderLoader: Send + Sync {
    fn load(&self, model: &str) -> Result<Box<dyn Embedder>>;
}

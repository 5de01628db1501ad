//! Text embedding providers used by semantic deduplication.
//!
//! # Supported Providers
//!
//! - **Ollama** - Local embedding models over HTTP (`OLLAMA_HOST` overrides the endpoint)
//! - **Mock** - Deterministic hashed bag-of-words, for tests and offline runs

mod mock;
mod ollama;
mod provider;

pub use mock::{MockEmbedder, MockLoader};
pub use ollama::{MODEL_ALIASES, OLLAMA_DEFAULT_MODEL, OllamaEmbedder, OllamaLoader};
pub use provider::{DEFAULT_MODEL, Embedder, EmbedderLoader, EmbeddingConfig};

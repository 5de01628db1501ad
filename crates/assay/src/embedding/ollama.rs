//! Ollama embedding provider.
//!
//! Runs embedding models locally, no API key needed. Pull a model first,
//! e.g. `ollama pull nomic-embed-text`.
//!
//! Sentence-transformers names that Ollama does not serve are mapped to an
//! Ollama model by [`OllamaLoader`] (see [`MODEL_ALIASES`]).

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AssayError, Result};

use super::provider::{Embedder, EmbedderLoader, EmbeddingConfig};

/// Default Ollama endpoint.
const DEFAULT_HOST: &str = "http://localhost:11434";

/// Ollama model used for the default sentence embedding model.
pub const OLLAMA_DEFAULT_MODEL: &str = "nomic-embed-text";

/// Requested model name to the Ollama model that serves it.
pub const MODEL_ALIASES: &[(&str, &str)] = &[
    ("all-mpnet-base-v2", OLLAMA_DEFAULT_MODEL),
    ("sentence-transformers/all-mpnet-base-v2", OLLAMA_DEFAULT_MODEL),
    ("all-MiniLM-L6-v2", "all-minilm"),
    ("sentence-transformers/all-MiniLM-L6-v2", "all-minilm"),
];

/// Embedder backed by a running Ollama server.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    config: EmbeddingConfig,
}

impl OllamaEmbedder {
    /// Connect to Ollama and check the model is available.
    pub fn load(model: impl Into<String>) -> Result<Self> {
        Self::with_config(EmbeddingConfig::new(model))
    }

    /// Create with custom configuration. Probes `/api/show` for the model.
    pub fn with_config(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = std::env::var("OLLAMA_HOST")
            .map(|host| host.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let embedder = Self {
            client,
            base_url,
            config,
        };
        embedder.probe().map_err(|e| match e {
            AssayError::Embedding { model, message } => AssayError::ModelLoad { model, message },
            other => other,
        })?;
        tracing::info!(model = %embedder.config.model, url = %embedder.base_url, "Loaded Ollama embedding model");
        Ok(embedder)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn error(&self, message: impl Into<String>) -> AssayError {
        AssayError::Embedding {
            model: self.config.model.clone(),
            message: message.into(),
        }
    }

    fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .headers(self.headers())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    self.error("failed to connect to Ollama. Is it running? Start with: ollama serve")
                } else {
                    self.error(format!("Ollama request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            if error_text.contains("not found") {
                return Err(self.error(format!(
                    "model not found. Pull it with: ollama pull {}",
                    self.config.model
                )));
            }
            return Err(self.error(format!("Ollama error ({}): {}", status, error_text)));
        }
        Ok(response)
    }

    fn probe(&self) -> Result<()> {
        self.post("/api/show", json!({ "model": self.config.model }))?;
        Ok(())
    }
}

impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| self.error("Ollama returned no embedding"))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "model": self.config.model,
            "input": texts,
            "truncate": self.config.truncate,
        });
        let parsed: EmbedResponse = self
            .post("/api/embed", body)?
            .json()
            .map_err(|e| self.error(format!("Failed to parse Ollama response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(self.error(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Loads [`OllamaEmbedder`]s by model name.
///
/// Names listed in [`MODEL_ALIASES`] are replaced by the Ollama model that
/// serves them; any other name is passed through unchanged.
#[derive(Debug, Clone, Default)]
pub struct OllamaLoader {
    config: EmbeddingConfig,
}

impl OllamaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template configuration; the model field is replaced on each load.
    pub fn with_config(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    /// The Ollama model that will be requested for `model`.
    pub fn resolve(model: &str) -> &str {
        MODEL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == model)
            .map_or(model, |(_, ollama)| *ollama)
    }
}

impl EmbedderLoader for OllamaLoader {
    fn load(&self, model: &str) -> Result<Box<dyn Embedder>> {
        let resolved = Self::resolve(model);
        if resolved != model {
            tracing::debug!(requested = model, ollama = resolved, "Mapped embedding model name");
        }
        let config = EmbeddingConfig {
            model: resolved.to_string(),
            ..self.config.clone()
        };
        Ok(Box::new(OllamaEmbedder::with_config(config)?))
    }
}

/// Ollama `/api/embed` response.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embed_response() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1], vec![0.3, 0.4]);
    }

    #[test]
    fn test_resolve_default_model() {
        assert_eq!(OllamaLoader::resolve(crate::embedding::DEFAULT_MODEL), OLLAMA_DEFAULT_MODEL);
        assert_eq!(OllamaLoader::resolve("all-MiniLM-L6-v2"), "all-minilm");
        assert_eq!(OllamaLoader::resolve("mxbai-embed-large"), "mxbai-embed-large");
    }
}

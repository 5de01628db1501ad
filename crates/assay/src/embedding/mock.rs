//! Mock embedding provider for testing and offline runs.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::error::{AssayError, Result};

use super::provider::{Embedder, EmbedderLoader};

/// Deterministic hashed bag-of-words embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `dimensions`
/// buckets. Texts sharing most of their words end up close in cosine
/// distance; texts with no words in common are at distance 1.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    model: String,
    dimensions: usize,
    fail: bool,
}

impl MockEmbedder {
    pub const DEFAULT_DIMENSIONS: usize = 256;

    /// Create a new mock embedder.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            dimensions: Self::DEFAULT_DIMENSIONS,
            fail: false,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions.max(1);
        self
    }

    /// An embedder whose every call fails.
    pub fn failing(model: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(model)
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(word) % self.dimensions as u64) as usize
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(super::DEFAULT_MODEL)
    }
}

impl Embedder for MockEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(AssayError::Embedding {
                model: self.model.clone(),
                message: "mock embedder configured to fail".to_string(),
            });
        }
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Loader handing out [`MockEmbedder`]s for any model except the ones marked missing.
#[derive(Debug, Clone, Default)]
pub struct MockLoader {
    missing: HashSet<String>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make loading `model` fail.
    pub fn with_missing(mut self, model: impl Into<String>) -> Self {
        self.missing.insert(model.into());
        self
    }
}

impl EmbedderLoader for MockLoader {
    fn load(&self, model: &str) -> Result<Box<dyn Embedder>> {
        if self.missing.contains(model) {
            return Err(AssayError::ModelLoad {
                model: model.to_string(),
                message: "model not available".to_string(),
            });
        }
        Ok(Box::new(MockEmbedder::new(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let e = MockEmbedder::default();
        assert_eq!(e.embed("Budget of the call").unwrap(), e.embed("budget OF the call").unwrap());
        assert_eq!(e.embed("x").unwrap().len(), MockEmbedder::DEFAULT_DIMENSIONS);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = MockEmbedder::default().embed("  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_failing_and_missing() {
        assert!(MockEmbedder::failing("m").embed("x").is_err());
        let loader = MockLoader::new().with_missing("gone");
        assert!(matches!(loader.load("gone").err(), Some(AssayError::ModelLoad { .. })));
        assert_eq!(loader.load("here").unwrap().model_id(), "here");
    }
}

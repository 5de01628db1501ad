//! Semantic duplicate removal.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::args::ColumnList;
use crate::embedding::{DEFAULT_MODEL, Embedder, EmbedderLoader};
use crate::error::{AssayError, Result};
use crate::pipeline::{Operator, ParamKind, Signature};
use crate::table::{NonEmptyTable, Table, partition};
use crate::validation::checks::{self, fail};

use super::cluster::{AverageLinkage, Clusterer, cosine_distances};

/// Which representative wins when several texts of a cluster share the longest length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Earliest in partition order.
    #[default]
    First,
    /// Latest in partition order.
    Last,
}

/// Configuration for [`RemoveSemanticDuplicates`].
#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    /// Columns forming the grouping key. Rows only merge within a group.
    pub groupby_columns: Vec<String>,

    /// Text column that gets embedded and compared.
    pub target_column: String,

    /// Embedding model identifier.
    pub model: String,

    /// Cosine distance below which clusters merge.
    pub threshold: f64,

    pub tie_break: TieBreak,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            groupby_columns: vec!["document".to_string(), "price".to_string()],
            target_column: "sentence".to_string(),
            model: DEFAULT_MODEL.to_string(),
            threshold: 0.8,
            tie_break: TieBreak::First,
        }
    }
}

impl DedupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groupby_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groupby_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Check the configuration before an operator is built from it.
    pub fn validate(&self) -> Result<()> {
        ColumnList::new(self.groupby_columns.iter().cloned())?;
        if self.target_column.trim().is_empty() {
            return Err(AssayError::Config(
                "target_column must be a non-empty string".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AssayError::Config("model must be a non-empty string".to_string()));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(AssayError::Config(format!(
                "threshold must be a finite, non-negative distance, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Collapse near-duplicate texts within each group to their longest member.
pub struct RemoveSemanticDuplicates {
    config: DedupConfig,
    embedder: Box<dyn Embedder>,
    clusterer: Box<dyn Clusterer>,
}

impl RemoveSemanticDuplicates {
    /// Build with an already loaded embedder.
    pub fn new(config: DedupConfig, embedder: Box<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            embedder,
            clusterer: Box::new(AverageLinkage),
        })
    }

    /// Build, loading the configured model through `loader`.
    pub fn load(config: DedupConfig, loader: &dyn EmbedderLoader) -> Result<Self> {
        config.validate()?;
        let model = config.model.clone();
        let embedder = loader.load(&model).map_err(|e| {
            let message = match e {
                AssayError::Embedding { message, .. } | AssayError::ModelLoad { message, .. } => message,
                other => other.to_string(),
            };
            tracing::error!(model = %model, "Failed to load embedding model");
            AssayError::ModelLoad {
                model: model.clone(),
                message,
            }
        })?;
        tracing::info!(model = %model, provider = embedder.name(), "Loaded embedding model");
        Self::new(config, embedder)
    }

    /// Replace the clustering strategy.
    pub fn with_clusterer(mut self, clusterer: impl Clusterer + 'static) -> Self {
        self.clusterer = Box::new(clusterer);
        self
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    fn runtime(&self, message: impl std::fmt::Display) -> AssayError {
        fail(AssayError::Embedding {
            model: self.config.model.clone(),
            message: format!("error during sentence clustering: {}", message),
        })
    }

    fn wrap(&self, err: AssayError) -> AssayError {
        match err {
            e @ AssayError::Embedding { .. } => fail(e),
            other => self.runtime(other),
        }
    }

    /// Positions (into `texts`) of the surviving representatives, in text order.
    fn representatives(&self, texts: &[&str]) -> Result<Vec<usize>> {
        if texts.len() == 1 {
            return Ok(vec![0]);
        }
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let embeddings = self.embedder.embed_batch(&owned).map_err(|e| self.wrap(e))?;
        if embeddings.len() != texts.len() {
            return Err(self.runtime(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        let distances = cosine_distances(&embeddings).map_err(|e| self.wrap(e))?;
        let labels = self
            .clusterer
            .cluster(&distances, self.config.threshold)
            .map_err(|e| self.wrap(e))?;
        if labels.len() != texts.len() {
            return Err(self.runtime(format!(
                "expected {} cluster labels, got {}",
                texts.len(),
                labels.len()
            )));
        }

        let clusters = labels.iter().copied().max().map_or(0, |m| m + 1);
        let mut best: Vec<Option<usize>> = vec![None; clusters];
        for (pos, &label) in labels.iter().enumerate() {
            let len = texts[pos].chars().count();
            let replace = match best[label] {
                None => true,
                Some(current) => {
                    let current_len = texts[current].chars().count();
                    match self.config.tie_break {
                        TieBreak::First => len > current_len,
                        TieBreak::Last => len >= current_len,
                    }
                }
            };
            if replace {
                best[label] = Some(pos);
            }
        }

        let mut reps: Vec<usize> = best.into_iter().flatten().collect();
        reps.sort_unstable();
        Ok(reps)
    }
}

impl Operator for RemoveSemanticDuplicates {
    fn signature(&self) -> Signature {
        Signature::operator("remove_semantic_duplicates")
            .bind("groupby_columns", ParamKind::other("ColumnList"))
            .bind("target_column", ParamKind::other("String"))
            .bind("model", ParamKind::other("Embedder"))
            .bind("threshold", ParamKind::other("f64"))
    }

    fn transform(&self, input: NonEmptyTable) -> Result<Table> {
        let target = self.config.target_column.as_str();
        tracing::info!(
            groupby = ?self.config.groupby_columns,
            target,
            model = %self.config.model,
            threshold = self.config.threshold,
            "Removing semantic duplicates"
        );

        let targets = checks::present(&input, target, "remove_semantic_duplicates")?;
        let groupby: Vec<&str> = self.config.groupby_columns.iter().map(String::as_str).collect();
        for column in &groupby {
            checks::present(&input, column, "remove_semantic_duplicates")?;
        }

        let parts = partition(&input, &groupby);
        if !parts.dropped.is_empty() {
            tracing::warn!(
                rows = parts.dropped.len(),
                "Dropping rows with a missing grouping key"
            );
        }

        let mut keep: Vec<usize> = Vec::new();
        let group_count = parts.groups.len();
        for (key, rows) in &parts.groups {
            let mut texts: Vec<&str> = Vec::with_capacity(rows.len());
            for &row in rows {
                let text = targets[row].as_str().ok_or_else(|| {
                    fail(AssayError::Schema(format!(
                        "Column '{}' must hold strings, found {} at row {}.",
                        target,
                        targets[row].type_name(),
                        input.index()[row]
                    )))
                })?;
                texts.push(text);
            }

            let reps = self.representatives(&texts)?;
            tracing::debug!(group = %key, rows = rows.len(), kept = reps.len(), "Clustered group");

            // Merge back on (key, text): first matching row of the group not yet taken.
            let mut taken: HashSet<usize> = HashSet::new();
            for rep in reps {
                let text = texts[rep];
                let matched = (0..rows.len())
                    .find(|&pos| texts[pos] == text && !taken.contains(&pos))
                    .unwrap_or(rep);
                taken.insert(matched);
                keep.push(rows[matched]);
            }
        }

        let mut output = input.take_rows(&keep);
        output.reset_index();
        tracing::info!(
            groups = group_count,
            before = input.row_count(),
            after = output.row_count(),
            "Semantic duplicate removal complete"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{MockEmbedder, MockLoader};
    use crate::error::ErrorKind;
    use crate::table::{Value, column};

    fn dedup(threshold: f64) -> RemoveSemanticDuplicates {
        let config = DedupConfig::new()
            .with_groupby_columns(["document_id"])
            .with_target_column("context")
            .with_threshold(threshold);
        RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default())).unwrap()
    }

    fn sample() -> NonEmptyTable {
        NonEmptyTable::new(
            Table::from_columns(vec![
                ("document_id", column(["d1", "d1", "d1", "d2"])),
                (
                    "context",
                    column([
                        "grant budget for the call",
                        "the grant budget for the call",
                        "consortium of partners",
                        "grant budget for the call",
                    ]),
                ),
                ("value", column([100, 100, 5, 100])),
            ])
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_collapses_to_longest_within_group() {
        let out = dedup(0.5).transform(sample()).unwrap();
        assert_eq!(out.index(), &[0, 1, 2]);
        assert_eq!(
            out.column("context").unwrap(),
            column([
                "the grant budget for the call",
                "consortium of partners",
                "grant budget for the call",
            ])
            .as_slice()
        );
        assert_eq!(out.column_names().collect::<Vec<_>>(), vec!["document_id", "context", "value"]);
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let out = dedup(0.0).transform(sample()).unwrap();
        assert_eq!(out.row_count(), 4);
    }

    #[test]
    fn test_tie_break() {
        let t = NonEmptyTable::new(
            Table::from_columns(vec![
                ("g", column([1, 1])),
                ("s", column(["alpha beta", "beta alpha"])),
            ])
            .unwrap(),
        )
        .unwrap();
        let config = DedupConfig::new().with_groupby_columns(["g"]).with_target_column("s");

        let first = RemoveSemanticDuplicates::new(config.clone(), Box::new(MockEmbedder::default()))
            .unwrap()
            .transform(t.clone())
            .unwrap();
        assert_eq!(first.column("s").unwrap(), &[Value::from("alpha beta")]);

        let last = RemoveSemanticDuplicates::new(
            config.with_tie_break(TieBreak::Last),
            Box::new(MockEmbedder::default()),
        )
        .unwrap()
        .transform(t)
        .unwrap();
        assert_eq!(last.column("s").unwrap(), &[Value::from("beta alpha")]);
    }

    #[test]
    fn test_embedding_failure_names_model() {
        let config = DedupConfig::new()
            .with_groupby_columns(["document_id"])
            .with_target_column("context")
            .with_model("broken-model");
        let op = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::failing("broken-model")))
            .unwrap();
        let err = op.transform(sample()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert!(err.to_string().contains("broken-model"));
    }

    #[test]
    fn test_load_failure_names_model() {
        let config = DedupConfig::new().with_model("missing-model");
        let err = RemoveSemanticDuplicates::load(config, &MockLoader::new().with_missing("missing-model"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, AssayError::ModelLoad { .. }));
        assert!(err.to_string().contains("missing-model"));
    }

    #[test]
    fn test_missing_columns() {
        let config = DedupConfig::new().with_groupby_columns(["nope"]).with_target_column("context");
        let op = RemoveSemanticDuplicates::new(config, Box::new(MockEmbedder::default())).unwrap();
        assert_eq!(op.transform(sample()).unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_config() {
        assert!(DedupConfig::new().with_threshold(f64::NAN).validate().is_err());
        assert!(DedupConfig::new().with_groupby_columns(Vec::<String>::new()).validate().is_err());
    }
}

//! Declarative pipeline specifications.
//!
//! A spec is a named, ordered list of operator configurations that can be
//! stored as JSON and turned into a contract-checked [`Pipeline`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dedup::{DedupConfig, RemoveSemanticDuplicates, TieBreak};
use crate::embedding::{DEFAULT_MODEL, EmbedderLoader};
use crate::error::{AssayError, Result};
use crate::transform::{
    DropRowsIfNoColumnMatchesRegex, DropRowsNotSatisfyingRegex, DropRowsWithNonPositiveValues,
    GroupByDocumentAndStackTypes, ReduceListIntsToUnique,
};
use crate::validation::{
    CheckColumnsSatisfyRegex, CheckNumericColumns, CheckStringColumns,
    VerifyListColumnContainsOnlyInts, VerifyNoEmptyStrings, VerifyNoMissingData, VerifyNoNegatives,
};

use super::engine::Pipeline;
use super::stage::{OperatorStage, Stage};

/// Current pipeline spec version
pub const SPEC_VERSION: &str = "0.1";

/// Root pipeline specification structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Specification version for future migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable pipeline name
    pub name: String,

    /// Ordered sequence of operators
    pub stages: Vec<StageSpec>,
}

fn default_version() -> String {
    SPEC_VERSION.to_string()
}

impl PipelineSpec {
    /// Create an empty spec.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    /// Load a pipeline spec from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Parse a pipeline spec from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save pipeline spec to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Serialize pipeline spec to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Built-in spec by name: `money` or `entity`.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "money" => Some(Self::money()),
            "entity" => Some(Self::entity()),
            _ => None,
        }
    }

    /// Cleans extracted funding amounts: validates the records, keeps
    /// positive euro amounts mentioned in a call or budget context, then
    /// collapses semantically repeated mentions per document and value.
    pub fn money() -> Self {
        Self::new("money")
            .with_stage(StageSpec::VerifyNoMissingData)
            .with_stage(StageSpec::VerifyNoNegatives)
            .with_stage(StageSpec::VerifyNoEmptyStrings)
            .with_stage(StageSpec::CheckNumericColumns {
                columns_to_check: strings(["value"]),
            })
            .with_stage(StageSpec::CheckStringColumns {
                columns_to_check: strings(["context", "original_sentence", "currency"]),
            })
            .with_stage(StageSpec::CheckColumnsSatisfyRegex {
                columns_to_check: strings(["original_sentence"]),
                regex_pattern: r"\d+".to_string(),
            })
            .with_stage(StageSpec::DropRowsWithNonPositiveValues {
                columns_to_check: strings(["value"]),
            })
            .with_stage(StageSpec::DropRowsNotSatisfyingRegex {
                columns_to_check: strings(["currency"]),
                regex_pattern: r"^(?:eur|euros|euro|€)$".to_string(),
            })
            .with_stage(StageSpec::DropRowsIfNoColumnMatchesRegex {
                columns_to_check: strings(["original_sentence", "context"]),
                regex_pattern: "call|budget|grant|amif".to_string(),
            })
            .with_stage(StageSpec::RemoveSemanticDuplicates {
                groupby_columns: strings(["document_id", "value"]),
                target_column: "context".to_string(),
                model: DEFAULT_MODEL.to_string(),
                threshold: 0.5,
                tie_break: TieBreak::First,
            })
    }

    /// Cleans extracted consortium requirements and stacks organization
    /// types per document.
    pub fn entity() -> Self {
        Self::new("entity")
            .with_stage(StageSpec::VerifyNoMissingData)
            .with_stage(StageSpec::VerifyNoNegatives)
            .with_stage(StageSpec::VerifyNoEmptyStrings)
            .with_stage(StageSpec::CheckStringColumns {
                columns_to_check: strings(["organization_type"]),
            })
            .with_stage(StageSpec::VerifyListColumnContainsOnlyInts {
                columns_to_check: strings(["min_entities"]),
            })
            .with_stage(StageSpec::ReduceListIntsToUnique {
                target_column: "min_entities".to_string(),
            })
            .with_stage(StageSpec::GroupByDocumentAndStackTypes {
                target_column: "organization_type".to_string(),
                document_id_column: default_document_id(),
                min_entities_column: default_min_entities(),
            })
    }

    /// Build every operator and validate the resulting pipeline.
    ///
    /// `loader` resolves embedding models for deduplication stages and is
    /// not called otherwise.
    pub fn build(&self, loader: &dyn EmbedderLoader) -> Result<Pipeline> {
        let stages = self
            .stages
            .iter()
            .map(|s| s.build(loader))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(pipeline = %self.name, stages = stages.len(), "Built pipeline from spec");
        Pipeline::new(stages)
    }

    /// Whether any stage needs an embedding model.
    pub fn needs_embeddings(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s, StageSpec::RemoveSemanticDuplicates { .. }))
    }
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_min_entities() -> String {
    ReduceListIntsToUnique::DEFAULT_COLUMN.to_string()
}

fn default_document_id() -> String {
    GroupByDocumentAndStackTypes::DEFAULT_DOCUMENT_ID.to_string()
}

fn default_groupby() -> Vec<String> {
    DedupConfig::default().groupby_columns
}

fn default_dedup_target() -> String {
    DedupConfig::default().target_column
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_threshold() -> f64 {
    DedupConfig::default().threshold
}

/// One operator and its configuration (tagged enum)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StageSpec {
    VerifyNoMissingData,

    VerifyNoNegatives,

    VerifyNoEmptyStrings,

    CheckNumericColumns {
        columns_to_check: Vec<String>,
    },

    CheckStringColumns {
        columns_to_check: Vec<String>,
    },

    CheckColumnsSatisfyRegex {
        columns_to_check: Vec<String>,
        regex_pattern: String,
    },

    VerifyListColumnContainsOnlyInts {
        columns_to_check: Vec<String>,
    },

    DropRowsWithNonPositiveValues {
        columns_to_check: Vec<String>,
    },

    DropRowsNotSatisfyingRegex {
        columns_to_check: Vec<String>,
        regex_pattern: String,
    },

    DropRowsIfNoColumnMatchesRegex {
        columns_to_check: Vec<String>,
        regex_pattern: String,
    },

    ReduceListIntsToUnique {
        #[serde(default = "default_min_entities")]
        target_column: String,
    },

    GroupByDocumentAndStackTypes {
        target_column: String,
        #[serde(default = "default_document_id")]
        document_id_column: String,
        #[serde(default = "default_min_entities")]
        min_entities_column: String,
    },

    RemoveSemanticDuplicates {
        #[serde(default = "default_groupby")]
        groupby_columns: Vec<String>,
        #[serde(default = "default_dedup_target")]
        target_column: String,
        #[serde(default = "default_model")]
        model: String,
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default)]
        tie_break: TieBreak,
    },
}

impl StageSpec {
    /// Construct the configured operator as a pipeline stage.
    pub fn build(&self, loader: &dyn EmbedderLoader) -> Result<Box<dyn Stage>> {
        let stage = match self {
            StageSpec::VerifyNoMissingData => OperatorStage::boxed(VerifyNoMissingData),
            StageSpec::VerifyNoNegatives => OperatorStage::boxed(VerifyNoNegatives),
            StageSpec::VerifyNoEmptyStrings => OperatorStage::boxed(VerifyNoEmptyStrings),
            StageSpec::CheckNumericColumns { columns_to_check } => {
                OperatorStage::boxed(CheckNumericColumns::new(columns_to_check.iter().cloned())?)
            }
            StageSpec::CheckStringColumns { columns_to_check } => {
                OperatorStage::boxed(CheckStringColumns::new(columns_to_check.iter().cloned())?)
            }
            StageSpec::CheckColumnsSatisfyRegex {
                columns_to_check,
                regex_pattern,
            } => OperatorStage::boxed(CheckColumnsSatisfyRegex::new(
                columns_to_check.iter().cloned(),
                regex_pattern,
            )?),
            StageSpec::VerifyListColumnContainsOnlyInts { columns_to_check } => OperatorStage::boxed(
                VerifyListColumnContainsOnlyInts::new(columns_to_check.iter().cloned())?,
            ),
            StageSpec::DropRowsWithNonPositiveValues { columns_to_check } => OperatorStage::boxed(
                DropRowsWithNonPositiveValues::new(columns_to_check.iter().cloned())?,
            ),
            StageSpec::DropRowsNotSatisfyingRegex {
                columns_to_check,
                regex_pattern,
            } => OperatorStage::boxed(DropRowsNotSatisfyingRegex::new(
                columns_to_check.iter().cloned(),
                regex_pattern,
            )?),
            StageSpec::DropRowsIfNoColumnMatchesRegex {
                columns_to_check,
                regex_pattern,
            } => OperatorStage::boxed(DropRowsIfNoColumnMatchesRegex::new(
                columns_to_check.iter().cloned(),
                regex_pattern,
            )?),
            StageSpec::ReduceListIntsToUnique { target_column } => {
                OperatorStage::boxed(ReduceListIntsToUnique::new(target_column.clone())?)
            }
            StageSpec::GroupByDocumentAndStackTypes {
                target_column,
                document_id_column,
                min_entities_column,
            } => OperatorStage::boxed(
                GroupByDocumentAndStackTypes::new(target_column.clone())?
                    .with_document_id_column(document_id_column.clone())
                    .with_min_entities_column(min_entities_column.clone()),
            ),
            StageSpec::RemoveSemanticDuplicates {
                groupby_columns,
                target_column,
                model,
                threshold,
                tie_break,
            } => {
                let config = DedupConfig::new()
                    .with_groupby_columns(groupby_columns.iter().cloned())
                    .with_target_column(target_column.clone())
                    .with_model(model.clone())
                    .with_threshold(*threshold)
                    .with_tie_break(*tie_break);
                OperatorStage::boxed(RemoveSemanticDuplicates::load(config, loader)?)
            }
        };
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockLoader;

    #[test]
    fn test_presets_build() {
        let money = PipelineSpec::money().build(&MockLoader::new()).unwrap();
        assert_eq!(money.len(), 10);
        assert_eq!(money.stage_names()[9], "remove_semantic_duplicates");

        let entity = PipelineSpec::entity().build(&MockLoader::new()).unwrap();
        assert_eq!(
            entity.stage_names().last().map(String::as_str),
            Some("group_by_document_and_stack_types")
        );
        assert!(!PipelineSpec::entity().needs_embeddings());
    }

    #[test]
    fn test_json_defaults() {
        let spec = PipelineSpec::from_json(
            r#"{
                "name": "custom",
                "stages": [
                    {"op": "verify_no_missing_data"},
                    {"op": "reduce_list_ints_to_unique"},
                    {"op": "remove_semantic_duplicates", "threshold": 0.3}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(spec.version, SPEC_VERSION);
        assert_eq!(
            spec.stages[1],
            StageSpec::ReduceListIntsToUnique {
                target_column: "min_entities".to_string()
            }
        );
        match &spec.stages[2] {
            StageSpec::RemoveSemanticDuplicates {
                groupby_columns,
                model,
                tie_break,
                ..
            } => {
                assert_eq!(groupby_columns, &vec!["document".to_string(), "price".to_string()]);
                assert_eq!(model, DEFAULT_MODEL);
                assert_eq!(*tie_break, TieBreak::First);
            }
            other => panic!("unexpected stage {:?}", other),
        }
    }

    #[test]
    fn test_json_round_trip_of_preset() {
        let json = PipelineSpec::money().to_json().unwrap();
        assert!(json.contains(r#""op": "drop_rows_not_satisfying_regex""#));
        assert_eq!(PipelineSpec::from_json(&json).unwrap(), PipelineSpec::money());
    }

    #[test]
    fn test_invalid_stage_config() {
        let spec = PipelineSpec::new("bad").with_stage(StageSpec::CheckNumericColumns {
            columns_to_check: Vec::new(),
        });
        assert!(spec.build(&MockLoader::new()).is_err());
    }
}

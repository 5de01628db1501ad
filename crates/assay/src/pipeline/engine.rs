//! Ordered, contract-checked stage execution.

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{AssayError, Result};
use crate::table::Table;

use super::contract::validate_stage;
use super::stage::{FnStage, Operator, OperatorStage, Stage};

/// Row count after one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: String,
    pub rows_before: usize,
    pub rows_after: usize,
}

/// Report generated after pipeline execution.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of rows before processing
    pub rows_before: usize,

    /// Number of columns before processing
    pub columns_before: usize,

    /// Number of rows after processing
    pub rows_after: usize,

    /// Number of columns after processing
    pub columns_after: usize,

    /// Number of stages applied
    pub stages_applied: usize,

    /// Per-stage row counts, in execution order
    pub stages: Vec<StageReport>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    /// One-line summary of the run.
    pub fn summary(&self) -> String {
        fn trend(before: usize, after: usize) -> &'static str {
            if after > before {
                "added"
            } else if after < before {
                "removed"
            } else {
                "unchanged"
            }
        }

        format!(
            "Pipeline completed: {} rows ({} → {}), {} columns ({} → {}), {} stages, {:.2}s",
            trend(self.rows_before, self.rows_after),
            self.rows_before,
            self.rows_after,
            trend(self.columns_before, self.columns_after),
            self.columns_before,
            self.columns_after,
            self.stages_applied,
            self.duration.as_secs_f64()
        )
    }
}

/// An ordered list of validated stages.
///
/// Every stage is checked by the contract validator before the pipeline
/// accepts it, both at construction and on [`set_stages`](Self::set_stages).
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Validate and wrap the given stages.
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Result<Self> {
        validate_all(&stages)?;
        tracing::info!(stages = stages.len(), "Pipeline initialized");
        Ok(Self { stages })
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Replace the stage list.
    ///
    /// The new list is validated as a whole first; on failure the current
    /// stages stay in place.
    pub fn set_stages(&mut self, stages: Vec<Box<dyn Stage>>) -> Result<()> {
        validate_all(&stages)?;
        self.stages = stages;
        tracing::info!(stages = self.stages.len(), "Pipeline stages updated");
        Ok(())
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Thread the table through every stage in order.
    ///
    /// Fails fast: the first stage error is returned unchanged.
    pub fn run(&self, table: Table) -> Result<Table> {
        self.run_with_report(table).map(|(table, _)| table)
    }

    /// Like [`run`](Self::run), also returning a [`RunReport`].
    pub fn run_with_report(&self, table: Table) -> Result<(Table, RunReport)> {
        let start = Instant::now();
        if table.is_empty() {
            let err = AssayError::EmptyTable(format!(
                "pipeline input has {} columns and no rows",
                table.column_count()
            ));
            tracing::error!("{}", err);
            return Err(err);
        }

        let rows_before = table.row_count();
        let columns_before = table.column_count();
        tracing::info!(stages = self.stages.len(), rows = rows_before, "Starting pipeline run");

        let mut current = table;
        let mut reports = Vec::with_capacity(self.stages.len());
        for (position, stage) in self.stages.iter().enumerate() {
            let name = stage.name();
            let rows_in = current.row_count();
            tracing::info!(stage = %name, step = position + 1, rows = rows_in, "Executing stage");

            let output = stage.call(current).inspect_err(|e| {
                tracing::error!(stage = %name, "Stage failed: {}", e);
            })?;
            current = output.into_table().map_err(|actual| {
                let err = AssayError::StageOutput {
                    stage: name.clone(),
                    actual: actual.to_string(),
                };
                tracing::error!(stage = %name, "{}", err);
                err
            })?;

            tracing::info!(stage = %name, rows = current.row_count(), "Stage finished");
            reports.push(StageReport {
                name,
                rows_before: rows_in,
                rows_after: current.row_count(),
            });
        }

        let report = RunReport {
            rows_before,
            columns_before,
            rows_after: current.row_count(),
            columns_after: current.column_count(),
            stages_applied: reports.len(),
            stages: reports,
            duration: start.elapsed(),
        };
        tracing::info!("{}", report.summary());
        Ok((current, report))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

fn validate_all(stages: &[Box<dyn Stage>]) -> Result<()> {
    for stage in stages {
        validate_stage(stage.as_ref())?;
    }
    Ok(())
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    /// Append a type-erased stage.
    pub fn stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append an operator.
    pub fn operator(self, operator: impl Operator + 'static) -> Self {
        self.stage(OperatorStage::boxed(operator))
    }

    /// Append a closure `Table -> Table`.
    pub fn function<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Table) -> Result<Table> + Send + Sync + 'static,
    {
        self.stage(FnStage::new(name, f).boxed())
    }

    /// Validate every stage and build the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::stage::{Param, ParamKind, Signature};
    use crate::table::column;

    fn sample() -> Table {
        Table::from_columns(vec![("a", column([1, 2, 3]))]).unwrap()
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let p = Pipeline::new(Vec::new()).unwrap();
        assert_eq!(p.run(sample()).unwrap(), sample());
    }

    #[test]
    fn test_rejects_empty_input() {
        let p = Pipeline::new(Vec::new()).unwrap();
        let err = p.run(Table::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(err.to_string().contains("must contain at least one row"));
    }

    #[test]
    fn test_non_table_output() {
        let sig = Signature::new("to_count")
            .param(Param::free("table", ParamKind::Table))
            .returns(ParamKind::Table);
        let stage = FnStage::with_signature(sig, |t: Table| Ok(t.row_count()));
        let p = Pipeline::new(vec![stage.boxed()]).unwrap();
        let err = p.run(sample()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(
            err.to_string(),
            "Stage 'to_count' returned type 'usize', but expected 'Table'."
        );
    }

    #[test]
    fn test_report_counts() {
        let p = Pipeline::builder()
            .function("drop_first", |t: Table| {
                let keep: Vec<usize> = (1..t.row_count()).collect();
                Ok(t.take_rows(&keep))
            })
            .build()
            .unwrap();
        let (out, report) = p.run_with_report(sample()).unwrap();
        assert_eq!(out.index(), &[1, 2]);
        assert_eq!(report.rows_before, 3);
        assert_eq!(report.rows_after, 2);
        assert_eq!(report.stages[0].name, "drop_first");
        assert!(report.summary().starts_with("Pipeline completed: removed rows (3 → 2)"));
    }
}

//! Pipeline engine: stages, contract checks, execution and specs.

pub mod contract;
mod engine;
mod spec;
mod stage;

pub use contract::{validate_signature, validate_stage};
pub use engine::{Pipeline, PipelineBuilder, RunReport, StageReport};
pub use spec::{PipelineSpec, SPEC_VERSION, StageSpec};
pub use stage::{FnStage, Operator, OperatorStage, Param, ParamKind, Signature, Stage, StageOutput};

//! CLI command implementations.

pub mod check;
pub mod inspect;
pub mod run;

use assay::PipelineSpec;

use crate::cli::PipelineChoice;

/// Resolve `--spec` / `--preset` into a pipeline spec.
pub(crate) fn load_spec(choice: &PipelineChoice) -> Result<PipelineSpec, Box<dyn std::error::Error>> {
    match (&choice.spec, choice.preset) {
        (Some(path), _) => {
            if !path.exists() {
                return Err(format!("Spec file not found: {}", path.display()).into());
            }
            Ok(PipelineSpec::from_file(path)?)
        }
        (None, Some(preset)) => PipelineSpec::preset(preset.name())
            .ok_or_else(|| format!("Unknown preset: {}", preset).into()),
        (None, None) => Err("Either --spec or --preset is required".into()),
    }
}

//! Check command - build a pipeline and list its stages.

use assay::{MockLoader, Stage};
use colored::Colorize;

use crate::cli::PipelineChoice;

pub fn run(choice: PipelineChoice, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let spec = super::load_spec(&choice)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&spec)?);
        return Ok(());
    }

    // No model is loaded; the mock stands in for it.
    let pipeline = spec.build(&MockLoader::new())?;
    tracing::debug!(pipeline = %spec.name, stages = pipeline.len(), "Contract check passed");

    println!(
        "{} {} (spec version {})",
        "Pipeline".cyan().bold(),
        spec.name.white().bold(),
        spec.version
    );
    println!();
    for (i, stage) in pipeline.stages().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, stage.signature());
    }
    println!();
    println!(
        "{} {} stages passed the contract check",
        "OK".green().bold(),
        pipeline.len()
    );
    if spec.needs_embeddings() {
        println!(
            "{}",
            "Note: this pipeline loads an embedding model at run time".yellow()
        );
    }

    Ok(())
}

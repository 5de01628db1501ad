//! Run command - clean an extraction result and export CSV.

use std::path::{Path, PathBuf};

use assay::{EmbedderLoader, JsonLoader, MockLoader, OllamaLoader, write_csv};
use colored::Colorize;

use crate::cli::PipelineChoice;

pub fn run(
    input: PathBuf,
    choice: PipelineChoice,
    output: Option<PathBuf>,
    mock_embeddings: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("File not found: {}", input.display()).into());
    }

    let spec = super::load_spec(&choice)?;
    let output_path = output.unwrap_or_else(|| default_output(&input, &spec.name));
    tracing::info!(
        input = %input.display(),
        output = %output_path.display(),
        pipeline = %spec.name,
        mock_embeddings,
        "Starting run"
    );

    println!(
        "{} {} {} {}",
        "Cleaning".cyan().bold(),
        input.display().to_string().white(),
        "with pipeline".cyan(),
        spec.name.white().bold()
    );

    let loader: Box<dyn EmbedderLoader> = if mock_embeddings {
        Box::new(MockLoader::new())
    } else {
        if spec.needs_embeddings() {
            tracing::debug!("Embedding models will be loaded from Ollama");
        }
        Box::new(OllamaLoader::new())
    };
    let pipeline = spec.build(loader.as_ref())?;

    let (table, metadata) = JsonLoader::new().load(&input)?;
    println!(
        "Loaded {} rows from {} documents",
        metadata.row_count.to_string().white().bold(),
        metadata.document_count.to_string().white()
    );

    let (cleaned, report) = pipeline.run_with_report(table)?;

    if verbose {
        println!();
        println!("{}", "Stages:".yellow().bold());
        for stage in &report.stages {
            let delta = stage.rows_before as i64 - stage.rows_after as i64;
            let removed = if delta > 0 {
                format!("-{}", delta).red().to_string()
            } else {
                "0".dimmed().to_string()
            };
            println!(
                "  {:40} {:>6} → {:<6} ({})",
                stage.name, stage.rows_before, stage.rows_after, removed
            );
        }
        println!();
    }

    write_csv(&cleaned, &output_path)?;
    tracing::info!(
        rows = report.rows_after,
        stages = report.stages_applied,
        elapsed_ms = report.duration.as_millis() as u64,
        "Run finished"
    );

    println!("{}", report.summary());
    println!(
        "{} {}",
        "Wrote".green().bold(),
        output_path.display().to_string().white()
    );

    Ok(())
}

/// `<dir>/<input stem>.<pipeline name>.csv`
fn default_output(input: &Path, pipeline_name: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let mut path = input.to_path_buf();
    path.set_file_name(format!("{}.{}.csv", stem, pipeline_name));
    path
}

//! Inspect command - show source metadata and columns of an input file.

use std::path::PathBuf;

use assay::{JsonLoader, Value};
use colored::Colorize;

pub fn run(input: PathBuf, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("File not found: {}", input.display()).into());
    }

    let (table, meta) = JsonLoader::new().load(&input)?;
    tracing::debug!(hash = %meta.hash, columns = table.column_count(), "Inspecting input");

    println!("{} {}", "Source".cyan().bold(), meta.file.white());
    println!("  Path:      {}", meta.path.display());
    println!("  Hash:      {}", meta.hash.dimmed());
    println!("  Size:      {} bytes", meta.size_bytes);
    println!("  Documents: {}", meta.document_count.to_string().white().bold());
    println!("  Rows:      {}", meta.row_count.to_string().white().bold());
    println!("  Loaded at: {}", meta.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();

    println!("{}", "Columns:".yellow().bold());
    for (name, cells) in table.columns() {
        let missing = cells.iter().filter(|v| v.is_missing()).count();
        let kinds = cell_types(cells);
        let missing_note = if missing > 0 {
            format!("{} missing", missing).red().to_string()
        } else {
            String::new()
        };
        println!("  {:24} {:20} {}", name, kinds, missing_note);

        if verbose {
            if let Some(first) = cells.iter().find(|v| !v.is_missing()) {
                println!("    {} {}", "e.g.".dimmed(), first.repr());
            }
        }
    }

    Ok(())
}

/// Distinct non-missing cell types, in first-seen order.
fn cell_types(cells: &[Value]) -> String {
    let mut kinds: Vec<&'static str> = Vec::new();
    for cell in cells.iter().filter(|v| !v.is_missing()) {
        let kind = cell.type_name();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        "empty".to_string()
    } else {
        kinds.join("|")
    }
}

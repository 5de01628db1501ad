//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Assay: contract-checked cleaning of extracted records
#[derive(Parser)]
#[command(name = "assay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Silence log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean an extraction result file and export it as CSV
    Run {
        /// Path to the JSON extraction result
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        pipeline: PipelineChoice,

        /// Output path (default: <input stem>.<pipeline name>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use deterministic mock embeddings instead of Ollama.
        ///
        /// Without this flag embeddings come from Ollama (OLLAMA_HOST, default
        /// http://localhost:11434). The default model all-mpnet-base-v2 is served
        /// as nomic-embed-text and all-MiniLM-L6-v2 as all-minilm; other names
        /// are requested from Ollama as given.
        #[arg(long)]
        mock_embeddings: bool,
    },

    /// Build a pipeline and list its stages without running it
    Check {
        #[command(flatten)]
        pipeline: PipelineChoice,

        /// Print the pipeline spec as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show metadata and columns of an extraction result file
    Inspect {
        /// Path to the JSON extraction result
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

/// Where the pipeline comes from: a spec file or a built-in preset.
#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct PipelineChoice {
    /// Path to a pipeline spec (JSON)
    #[arg(long, value_name = "FILE")]
    pub spec: Option<PathBuf>,

    /// Built-in pipeline
    #[arg(long)]
    pub preset: Option<Preset>,
}

#[derive(Clone, Copy, Debug)]
pub enum Preset {
    Money,
    Entity,
}

impl Preset {
    pub fn name(self) -> &'static str {
        match self {
            Preset::Money => "money",
            Preset::Entity => "entity",
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "money" => Ok(Preset::Money),
            "entity" => Ok(Preset::Entity),
            _ => Err(format!("Unknown preset: {}. Use money or entity.", s)),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

//! Assay CLI - clean extracted records through contract-checked pipelines.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let _guard = match logging::init(cli.verbose, cli.quiet, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run {
            input,
            pipeline,
            output,
            mock_embeddings,
        } => commands::run::run(input, pipeline, output, mock_embeddings, cli.verbose),

        Commands::Check { pipeline, json } => commands::check::run(pipeline, json),

        Commands::Inspect { input } => commands::inspect::run(input, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

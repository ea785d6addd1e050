//! killtrace 명령줄 진입점

mod cli;
mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;

use killtrace_analyzer::{AnalyzerConfig, LogAnalyzer};

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level.as_str())
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AnalyzerConfig::from_override_file(path)?,
        None => AnalyzerConfig::new(),
    };
    let analyzer = LogAnalyzer::with_config(config);
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, &analyzer, &writer)?,
        Commands::Explain(args) => commands::explain::execute(args, &analyzer, &writer)?,
    }
    Ok(())
}

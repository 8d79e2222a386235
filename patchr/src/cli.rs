//! CLI argument parsing for patchr

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Apply patch directives embedded in source comments
#[derive(Parser, Debug)]
#[command(name = "patchr")]
#[command(author, version, long_about = None)]
#[command(about = "patchr is a tool to apply patches to source code using comment directives")]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    /// File or directory to patch
    #[arg(value_name = "TARGET", required = true)]
    pub target: Option<PathBuf>,

    /// Values file for templates (JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Overrides comment prefix detection
    #[arg(short = 'p', long, value_name = "PREFIX")]
    pub comment_prefix: Option<String>,

    /// Print patched output instead of writing files
    #[arg(short, long)]
    pub dry_run: bool,

    /// Pre-answer an input (NAME=VALUE, repeatable)
    #[arg(short, long = "input", value_name = "NAME=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// Fail instead of prompting for unknown inputs
    #[arg(long)]
    pub non_interactive: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show version
    Version {
        /// Show details
        #[arg(short, long)]
        detail: bool,
    },
}

fn parse_input(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

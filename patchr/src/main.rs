//! patchr - apply patch directives embedded in source comments
//!
//! CLI entry point.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use patchr::cli::{Cli, Command};
use patchr::config::Config;
use patchr::{ApplyOptions, InputCache, InputResolver, apply_path, load_values};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > WARN
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") | None => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", other);
            tracing::Level::WARN
        }
    };

    // stdout carries dry-run output
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Command::Version { detail }) => {
            cmd_version(detail);
            Ok(())
        }
        None => {
            let target = cli.target.clone().ok_or_else(|| eyre::eyre!("Missing file or directory"))?;
            cmd_apply(&cli, &config, target)
        }
    }
}

fn cmd_apply(cli: &Cli, config: &Config, target: PathBuf) -> Result<()> {
    // CLI answers win over config answers
    let mut inputs: HashMap<String, String> = config.inputs.clone();
    inputs.extend(cli.inputs.iter().cloned());
    let cache = InputCache::from(inputs);

    let resolver = if cli.non_interactive || config.non_interactive {
        InputResolver::non_interactive(cache)
    } else {
        InputResolver::interactive(cache)
    };

    let data = match &cli.values {
        Some(path) => load_values(path, &resolver, &config.comment_prefixes)
            .context(format!("Failed to load values from {}", path.display()))?,
        None => Value::Null,
    };

    let options = ApplyOptions {
        comment_prefix: cli.comment_prefix.clone(),
        dry_run: cli.dry_run,
        comment_prefixes: config.comment_prefixes.clone(),
    };

    info!(path = %target.display(), dry_run = options.dry_run, "patchr starting");
    let report = apply_path(&target, &data, &resolver, &options, &mut io::stdout().lock())?;

    if !options.dry_run {
        println!(
            "{} Patched {} file(s), {} changed",
            "✓".green(),
            report.files,
            report.changed.to_string().cyan()
        );
    }
    Ok(())
}

fn cmd_version(detail: bool) {
    println!("{} version: {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if detail {
        println!();
        println!("authors: {}", env!("CARGO_PKG_AUTHORS"));
        println!("license: {}", env!("CARGO_PKG_LICENSE"));
        println!("description: {}", env!("CARGO_PKG_DESCRIPTION"));
    }
}

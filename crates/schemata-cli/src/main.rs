//! # schemata CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use schemata_cli::check::{run_check, CheckArgs};
use schemata_cli::list::{run_list, ListArgs};
use schemata_cli::validate::{run_validate, ValidateArgs};
use schemata_cli::SchemaSources;

/// Schemata: schema registry and validation toolchain.
///
/// Loads versioned schema documents from namespace directories and
/// validates JSON or YAML documents against them.
#[derive(Parser, Debug)]
#[command(name = "schemata", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML loader configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Additional schema root directory. Repeatable.
    #[arg(long = "schemas", value_name = "DIR", global = true)]
    schemas: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every schema and report counts per namespace.
    Check(CheckArgs),

    /// List loaded schemas with version, title and digest.
    List(ListArgs),

    /// Validate documents against a registered schema.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("schemata CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let sources = SchemaSources {
        config: cli.config,
        schemas: cli.schemas,
    };

    let result = match cli.command {
        Commands::Check(args) => run_check(&args, &sources),
        Commands::List(args) => run_list(&args, &sources),
        Commands::Validate(args) => run_validate(&args, &sources),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

//! # Check Subcommand
//!
//! Loads the whole catalog and fails on the first unreadable, duplicate or
//! malformed schema. Intended as a CI gate for schema repositories.

use anyhow::Result;
use clap::Args;

use schemata_registry::LoadReport;

use crate::SchemaSources;

/// Arguments for the `schemata check` subcommand.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Only load this namespace (plus root-level schemas). Repeatable.
    #[arg(long = "namespace", value_name = "NS")]
    pub namespaces: Vec<String>,
}

/// Execute the check subcommand.
///
/// Returns exit code 0; load failures surface as `Err` (exit code 2).
pub fn run_check(args: &CheckArgs, sources: &SchemaSources) -> Result<u8> {
    let (_registry, report) = sources.load(&args.namespaces)?;
    print!("{}", render_summary(&report));
    Ok(0)
}

fn render_summary(report: &LoadReport) -> String {
    let mut out = format!("Schemas: {} loaded\n", report.len());
    for (namespace, count) in report.count_by_namespace() {
        let label = if namespace.is_empty() { "(root)" } else { namespace };
        out.push_str(&format!("  {label}: {count}\n"));
    }
    out
}

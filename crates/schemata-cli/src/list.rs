//! # List Subcommand
//!
//! Prints every loaded schema in identifier order.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Serialize, Serializer};

use schemata_core::ContentDigest;
use schemata_registry::{LoadReport, SchemaRegistry};

use crate::SchemaSources;

/// Arguments for the `schemata list` subcommand.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only load this namespace (plus root-level schemas). Repeatable.
    #[arg(long = "namespace", value_name = "NS")]
    pub namespaces: Vec<String>,

    /// Emit a JSON array instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ListedSchema {
    id: String,
    version: String,
    title: String,
    namespace: String,
    #[serde(serialize_with = "full_digest")]
    digest: ContentDigest,
}

fn full_digest<S: Serializer>(digest: &ContentDigest, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(digest)
}

/// Execute the list subcommand.
pub fn run_list(args: &ListArgs, sources: &SchemaSources) -> Result<u8> {
    let (registry, report) = sources.load(&args.namespaces)?;
    let rows = collect_rows(&registry, &report);

    if args.json {
        let json = serde_json::to_string_pretty(&rows).context("failed to serialize schema list")?;
        println!("{json}");
    } else {
        print!("{}", render_table(&rows));
    }
    Ok(0)
}

fn collect_rows(registry: &SchemaRegistry, report: &LoadReport) -> Vec<ListedSchema> {
    let namespaces: BTreeMap<&str, &str> = report
        .loaded
        .iter()
        .map(|s| (s.schema_id.as_str(), s.namespace.as_str()))
        .collect();

    registry
        .descriptors()
        .iter()
        .filter_map(|d| {
            let digest = registry.digest(d.id().as_str())?;
            Some(ListedSchema {
                id: d.id().to_string(),
                version: d.version().to_string(),
                title: d.title().to_string(),
                namespace: namespaces.get(d.id().as_str()).copied().unwrap_or_default().to_string(),
                digest,
            })
        })
        .collect()
}

fn render_table(rows: &[ListedSchema]) -> String {
    let id_width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let version_width = rows.iter().map(|r| r.version.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{:<id_width$}  {:<version_width$}  {}:{}  {}\n",
            row.id,
            row.version,
            row.digest.algorithm,
            row.digest.short_hex(),
            row.title
        ));
    }
    out
}

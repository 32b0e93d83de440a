//! # schemata-cli: Command-Line Interface for Schemata
//!
//! Provides the `schemata` binary.
//!
//! ## Subcommands
//!
//! - `schemata check`: load every schema and report counts per namespace.
//! - `schemata list`: list loaded schemas with version, title and digest.
//! - `schemata validate`: validate JSON/YAML documents against a schema.
//!
//! ```bash
//! schemata check --namespace events
//! schemata list --json
//! schemata validate --schema https://schemas.schemata.dev/events/OrderPlaced.v1 order.json
//! ```
//!
//! ## Exit Codes
//!
//! `0` success, `1` at least one document failed validation, `2` operational
//! error (unreadable file, bad configuration, load failure, unknown schema).
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to `schemata-registry`; no validation logic here.

pub mod check;
pub mod list;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};

use schemata_registry::{LoadReport, LoaderConfig, SchemaLoader, SchemaRegistry};

/// Schema root used when neither a config file nor `--schemas` names one.
pub const DEFAULT_SCHEMA_ROOT: &str = "schemas";

/// Where schemas come from: the global `--config` and `--schemas` options.
#[derive(Debug, Clone, Default)]
pub struct SchemaSources {
    /// YAML loader configuration file.
    pub config: Option<PathBuf>,
    /// Roots appended to the configured ones.
    pub schemas: Vec<PathBuf>,
}

impl SchemaSources {
    /// Merge the config file with command-line overrides.
    ///
    /// Command-line roots are appended; command-line namespaces, when any
    /// are given, replace the configured list. With no roots at all the
    /// loader falls back to `./schemas`.
    pub fn loader_config(&self, namespaces: &[String]) -> Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)
                .with_context(|| format!("failed to read loader config {}", path.display()))?,
            None => LoaderConfig::default(),
        };
        config.roots.extend(self.schemas.iter().cloned());
        if config.roots.is_empty() {
            config.roots.push(PathBuf::from(DEFAULT_SCHEMA_ROOT));
        }
        if !namespaces.is_empty() {
            config.namespaces = namespaces.to_vec();
        }
        Ok(config)
    }

    /// Build a registry from every schema the merged configuration selects.
    pub fn load(&self, namespaces: &[String]) -> Result<(SchemaRegistry, LoadReport)> {
        let config = self.loader_config(namespaces)?;
        let registry = SchemaRegistry::new();
        let report = SchemaLoader::new(config)
            .load_into(&registry)
            .context("failed to load schemas")?;
        Ok((registry, report))
    }
}

//! # Schema Loader
//!
//! Populates a [`SchemaRegistry`] from schema documents on disk.
//!
//! ## Layout
//!
//! ```text
//! schemas/
//! ├── Common.schema.json          namespace ""
//! ├── events/
//! │   └── OrderPlaced.schema.json namespace "events"
//! └── roles/
//!     └── admin/
//!         └── Operator.schema.yaml namespace "roles"
//! ```
//!
//! Every root is walked recursively and matching files are loaded in sorted
//! path order, so the outcome of a load never depends on directory listing
//! order. A file's namespace is the first directory below its root.
//!
//! ## Pipeline
//!
//! parse (JSON or YAML) → meta-validate against JSON Schema 2020-12 →
//! [`SchemaDescriptor::from_document`] → [`SchemaRegistry::register`].
//! The first failure stops the load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use schemata_core::SchemaId;

use crate::descriptor::SchemaDescriptor;
use crate::error::LoadError;
use crate::registry::SchemaRegistry;

const SCHEMA_SUFFIXES: &[&str] = &[".schema.json", ".schema.yaml", ".schema.yml"];

/// Where to find schema documents and which namespaces to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Directories to walk.
    pub roots: Vec<PathBuf>,
    /// Namespaces to load. Empty means all.
    pub namespaces: Vec<String>,
}

impl LoaderConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadError> {
        serde_yaml::from_str(yaml).map_err(|e| LoadError::Config(e.to_string()))
    }

    /// Read and parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text)
            .map_err(|e| LoadError::Config(format!("{}: {e}", path.display())))
    }

    /// Whether files in `namespace` should be loaded.
    ///
    /// The root namespace `""` is always included.
    pub fn includes(&self, namespace: &str) -> bool {
        namespace.is_empty() || self.namespaces.is_empty() || self.namespaces.iter().any(|n| n == namespace)
    }
}

/// One schema registered by a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedSchema {
    /// Identifier the schema was registered under.
    pub schema_id: SchemaId,
    /// Directory below the root, or `""` for root-level files.
    pub namespace: String,
    /// File the schema was read from.
    pub path: PathBuf,
}

/// Everything a load registered, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Registered schemas, in load order.
    pub loaded: Vec<LoadedSchema>,
}

impl LoadReport {
    /// Number of schemas loaded.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Whether the load registered nothing.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Number of schemas loaded per namespace, in namespace order.
    pub fn count_by_namespace(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for schema in &self.loaded {
            *counts.entry(schema.namespace.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Loads schema documents from the configured roots into a registry.
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    config: LoaderConfig,
}

impl SchemaLoader {
    /// Create a loader for the given configuration.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// The configuration this loader reads from.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load every matching schema document and register it.
    ///
    /// Schemas registered before a failure stay in the registry.
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`] encountered, naming the offending path.
    pub fn load_into(&self, registry: &SchemaRegistry) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();

        for root in &self.config.roots {
            if !root.is_dir() {
                return Err(LoadError::MissingRoot { path: root.clone() });
            }
            let mut files = Vec::new();
            collect_schema_files(root, &mut files)?;
            files.sort();

            for path in files {
                let namespace = namespace_of(root, &path);
                if !self.config.includes(&namespace) {
                    tracing::trace!(path = %path.display(), namespace = %namespace, "skipped filtered namespace");
                    continue;
                }

                let document = load_document(&path)?;
                if let Err(e) = jsonschema::draft202012::meta::validate(&document) {
                    return Err(LoadError::MetaSchema {
                        path,
                        reason: e.to_string(),
                    });
                }
                let descriptor = match SchemaDescriptor::from_document(document) {
                    Ok(d) => d,
                    Err(source) => return Err(LoadError::Descriptor { path, source }),
                };
                let stored = match registry.register(descriptor) {
                    Ok(d) => d,
                    Err(source) => {
                        tracing::debug!(path = %path.display(), error = %source, "schema registration failed");
                        return Err(LoadError::Registry { path, source });
                    }
                };

                report.loaded.push(LoadedSchema {
                    schema_id: stored.id().clone(),
                    namespace,
                    path,
                });
            }
        }

        tracing::info!(
            schemas = report.len(),
            roots = self.config.roots.len(),
            "loaded schemas"
        );
        Ok(report)
    }
}

/// Read a JSON or YAML document, choosing the parser by file extension.
///
/// `.yaml` and `.yml` are parsed as YAML; everything else as JSON.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str::<Value>(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| LoadError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

fn is_schema_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| SCHEMA_SUFFIXES.iter().any(|s| name.ends_with(s)))
}

fn collect_schema_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_schema_files(&path, out)?;
        } else if is_schema_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn namespace_of(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return String::new();
    };
    let mut components = relative.components();
    match (components.next(), components.next()) {
        (Some(first), Some(_)) => first.as_os_str().to_string_lossy().into_owned(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn schema_json(id: &str) -> String {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": id,
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "string"}}
        })
        .to_string()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Common.schema.json", &schema_json("https://schemas.example.org/Common.v1"));
        write(
            dir.path(),
            "events/OrderPlaced.schema.json",
            &schema_json("https://schemas.example.org/events/OrderPlaced.v1"),
        );
        write(
            dir.path(),
            "roles/admin/Operator.schema.yaml",
            "$id: https://schemas.example.org/roles/Operator.v2\n\
             version: 2.1.0\n\
             type: object\n\
             properties:\n  name:\n    type: string\n",
        );
        write(dir.path(), "events/README.md", "not a schema");
        dir
    }

    fn loader(root: &Path, namespaces: &[&str]) -> SchemaLoader {
        SchemaLoader::new(LoaderConfig {
            roots: vec![root.to_path_buf()],
            namespaces: namespaces.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_loads_every_namespace() {
        let dir = fixture();
        let registry = SchemaRegistry::new();
        let report = loader(dir.path(), &[]).load_into(&registry).unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(registry.len(), 3);
        let counts = report.count_by_namespace();
        assert_eq!(counts.get(""), Some(&1));
        assert_eq!(counts.get("events"), Some(&1));
        assert_eq!(counts.get("roles"), Some(&1));

        let operator = registry.get("https://schemas.example.org/roles/Operator.v2").unwrap();
        assert_eq!(operator.version().to_string(), "2.1.0");
    }

    #[test]
    fn test_load_order_is_sorted_by_path() {
        let dir = fixture();
        let report = loader(dir.path(), &[]).load_into(&SchemaRegistry::new()).unwrap();
        let paths: Vec<_> = report.loaded.iter().map(|s| s.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_namespace_filter_keeps_root_namespace() {
        let dir = fixture();
        let registry = SchemaRegistry::new();
        let report = loader(dir.path(), &["events"]).load_into(&registry).unwrap();
        let namespaces: Vec<_> = report.loaded.iter().map(|s| s.namespace.as_str()).collect();
        assert_eq!(namespaces, vec!["", "events"]);
        assert!(!registry.contains("https://schemas.example.org/roles/Operator.v2"));
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = loader(&missing, &[]).load_into(&SchemaRegistry::new()).unwrap_err();
        assert!(matches!(err, LoadError::MissingRoot { path } if path == missing));
    }

    #[test]
    fn test_duplicate_across_files_names_second_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/First.schema.json", &schema_json("Dup.v1"));
        write(dir.path(), "b/Second.schema.json", &schema_json("Dup.v1"));
        let registry = SchemaRegistry::new();
        let err = loader(dir.path(), &[]).load_into(&registry).unwrap_err();
        match err {
            LoadError::Registry {
                path,
                source: RegistryError::DuplicateSchema { .. },
            } => assert!(path.ends_with("b/Second.schema.json")),
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Broken.schema.json", "{ not json");
        let err = loader(dir.path(), &[]).load_into(&SchemaRegistry::new()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { ref path, .. } if path.ends_with("Broken.schema.json")));
    }

    #[test]
    fn test_meta_schema_violation() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Bad.schema.json", r#"{"$id": "Bad.v1", "type": 12}"#);
        let err = loader(dir.path(), &[]).load_into(&SchemaRegistry::new()).unwrap_err();
        assert!(matches!(err, LoadError::MetaSchema { .. }));
    }

    #[test]
    fn test_document_without_identifier() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Anon.schema.json", r#"{"type": "object"}"#);
        let err = loader(dir.path(), &[]).load_into(&SchemaRegistry::new()).unwrap_err();
        assert!(matches!(err, LoadError::Descriptor { .. }));
    }

    #[test]
    fn test_load_document_by_extension() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"id": "x"}"#);
        write(dir.path(), "b.yml", "id: x\n");
        let a = load_document(&dir.path().join("a.json")).unwrap();
        let b = load_document(&dir.path().join("b.yml")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_config_from_yaml() {
        let config = LoaderConfig::from_yaml_str("roots: [schemas, vendor/schemas]\nnamespaces: [events]\n").unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("schemas"), PathBuf::from("vendor/schemas")]);
        assert!(config.includes("events"));
        assert!(config.includes(""));
        assert!(!config.includes("roles"));
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        assert!(matches!(
            LoaderConfig::from_yaml_str("root: schemas\n"),
            Err(LoadError::Config(_))
        ));
    }

    #[test]
    fn test_namespace_of() {
        let root = Path::new("/s");
        assert_eq!(namespace_of(root, Path::new("/s/A.schema.json")), "");
        assert_eq!(namespace_of(root, Path::new("/s/events/A.schema.json")), "events");
        assert_eq!(namespace_of(root, Path::new("/s/roles/admin/A.schema.json")), "roles");
    }
}

//! # Validate Subcommand
//!
//! Validates JSON or YAML documents against one registered schema.
//!
//! Every document is checked even after a failure, so a single run reports
//! all invalid inputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use schemata_core::SchemaId;
use schemata_registry::{load_document, SchemaRegistry, ValidationResult};

use crate::SchemaSources;

/// Arguments for the `schemata validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Identifier of the schema to validate against.
    #[arg(long, value_name = "ID")]
    pub schema: SchemaId,

    /// Documents to validate (`.json`, `.yaml` or `.yml`).
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Emit a JSON array of results instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FileResult {
    file: PathBuf,
    #[serde(flatten)]
    result: ValidationResult,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 if every document is valid, 1 if any is invalid.
/// Unknown schemas and unreadable documents are `Err` (exit code 2).
pub fn run_validate(args: &ValidateArgs, sources: &SchemaSources) -> Result<u8> {
    let (registry, _report) = sources.load(&[])?;
    let results = validate_files(&registry, &args.schema, &args.files)?;

    if args.json {
        let json = serde_json::to_string_pretty(&results).context("failed to serialize results")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&results));
    }

    let failed = results.iter().filter(|r| !r.result.valid).count();
    tracing::info!(
        schema_id = %args.schema,
        documents = results.len(),
        failed,
        "validation finished"
    );
    Ok(if failed > 0 { 1 } else { 0 })
}

fn validate_files(registry: &SchemaRegistry, schema: &SchemaId, files: &[PathBuf]) -> Result<Vec<FileResult>> {
    if !registry.contains(schema.as_str()) {
        anyhow::bail!("schema not found: {schema}");
    }
    files
        .iter()
        .map(|path| {
            let result = validate_file(registry, schema, path)?;
            Ok(FileResult {
                file: path.clone(),
                result,
            })
        })
        .collect()
}

fn validate_file(registry: &SchemaRegistry, schema: &SchemaId, path: &Path) -> Result<ValidationResult> {
    let document = load_document(path).with_context(|| format!("failed to load {}", path.display()))?;
    registry
        .validate(schema.as_str(), &document)
        .with_context(|| format!("failed to validate {}", path.display()))
}

fn render_text(results: &[FileResult]) -> String {
    let mut out = String::new();
    for r in results {
        if r.result.valid {
            out.push_str(&format!("OK    {}\n", r.file.display()));
        } else {
            out.push_str(&format!("FAIL  {}\n", r.file.display()));
            for violation in &r.result.errors {
                out.push_str(&format!("        {violation}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use tempfile::TempDir;

    struct Fixture {
        catalog: TempDir,
        docs: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let docs = TempDir::new().unwrap();
            testing::write(docs.path(), "good.json", r#"{"id": "a", "createdAt": "2024-01-01T00:00:00Z"}"#);
            testing::write(docs.path(), "bad.yaml", "name: x\n");
            Self {
                catalog: testing::catalog(),
                docs,
            }
        }

        fn sources(&self) -> SchemaSources {
            SchemaSources {
                config: None,
                schemas: vec![self.catalog.path().to_path_buf()],
            }
        }

        fn doc(&self, name: &str) -> PathBuf {
            self.docs.path().join(name)
        }

        fn args(&self, schema: &str, files: &[&str]) -> ValidateArgs {
            ValidateArgs {
                schema: SchemaId::new(schema).unwrap(),
                files: files.iter().map(|f| self.doc(f)).collect(),
                json: false,
            }
        }
    }

    #[test]
    fn test_all_valid_exits_zero() {
        let fx = Fixture::new();
        let code = run_validate(&fx.args(testing::ENTITY_ID, &["good.json"]), &fx.sources()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_any_invalid_exits_one() {
        let fx = Fixture::new();
        let code = run_validate(&fx.args(testing::ENTITY_ID, &["good.json", "bad.yaml"]), &fx.sources()).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_unknown_schema_is_operational_error() {
        let fx = Fixture::new();
        let err = run_validate(&fx.args("https://schemas.example.org/Nope.v1", &["good.json"]), &fx.sources())
            .unwrap_err();
        assert!(err.to_string().contains("schema not found"));
    }

    #[test]
    fn test_unreadable_document_is_operational_error() {
        let fx = Fixture::new();
        assert!(run_validate(&fx.args(testing::ENTITY_ID, &["missing.json"]), &fx.sources()).is_err());
    }

    #[test]
    fn test_text_report() {
        let fx = Fixture::new();
        let (registry, _) = fx.sources().load(&[]).unwrap();
        let schema = SchemaId::new(testing::ENTITY_ID).unwrap();
        let results = validate_files(&registry, &schema, &[fx.doc("good.json"), fx.doc("bad.yaml")]).unwrap();
        let text = render_text(&results);
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("OK    "));
        assert!(lines[1].starts_with("FAIL  "));
        assert_eq!(lines[2].trim(), "/id: missing required field \"id\"");
        assert_eq!(lines[3].trim(), "/createdAt: missing required field \"createdAt\"");
    }

    #[test]
    fn test_json_report_flattens_result() {
        let fx = Fixture::new();
        let (registry, _) = fx.sources().load(&[]).unwrap();
        let schema = SchemaId::new(testing::ENTITY_ID).unwrap();
        let results = validate_files(&registry, &schema, &[fx.doc("bad.yaml")]).unwrap();
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json[0]["valid"], false);
        assert_eq!(json[0]["errors"][0]["kind"], "missing_field");
        assert_eq!(json[0]["errors"][0]["instance_path"], serde_json::json!(["id"]));
        assert!(json[0]["file"].as_str().unwrap().ends_with("bad.yaml"));
    }
}

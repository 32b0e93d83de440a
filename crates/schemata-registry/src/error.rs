//! # Error Types
//!
//! The registry distinguishes four outcomes a caller must be able to
//! branch on:
//!
//! - data that does not match a schema (not an error; see
//!   [`ValidationResult`](crate::ValidationResult)),
//! - an identifier with no registered schema ([`RegistryError::SchemaNotFound`]),
//! - a second registration under a taken identifier ([`RegistryError::DuplicateSchema`]),
//! - a ruleset the validator cannot interpret ([`MalformedSchema`]).

use std::path::PathBuf;

use schemata_core::{CanonicalizationError, ContentDigest, SchemaId, ValidationError};
use thiserror::Error;

/// A schema's ruleset cannot be interpreted.
///
/// This is an integrity defect in the schema source, never a property of the
/// instance being validated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed schema {schema_id} at #{schema_path}: {reason}")]
pub struct MalformedSchema {
    /// Identifier of the schema that failed to compile.
    pub schema_id: String,
    /// JSON Pointer to the offending keyword inside the schema document.
    pub schema_path: String,
    /// What could not be interpreted.
    pub reason: String,
}

/// Errors returned by [`SchemaRegistry`](crate::SchemaRegistry) operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No schema is registered under the identifier.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// The identifier is already registered. The existing entry is kept.
    #[error(
        "duplicate schema {schema_id}: already registered as {existing_digest}, \
         rejected incoming {incoming_digest}"
    )]
    DuplicateSchema {
        /// The contested identifier.
        schema_id: SchemaId,
        /// Digest of the descriptor already in the registry.
        existing_digest: ContentDigest,
        /// Digest of the descriptor that was rejected.
        incoming_digest: ContentDigest,
    },

    /// The descriptor's ruleset failed to compile.
    #[error(transparent)]
    MalformedSchema(#[from] MalformedSchema),

    /// The descriptor could not be canonicalized for its digest.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Errors building a [`SchemaDescriptor`](crate::SchemaDescriptor) from a
/// schema document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// The document root is not an object.
    #[error("schema document must be a JSON object")]
    NotAnObject,

    /// A field needed to identify the schema is absent.
    #[error("schema document has no `{0}`")]
    MissingField(&'static str),

    /// A field needed to identify the schema is not a string.
    #[error("schema document field `{0}` must be a string")]
    NotAString(&'static str),

    /// The identifier or version failed its syntax check.
    #[error("invalid schema identity: {0}")]
    Identity(#[from] ValidationError),
}

/// Errors raised by the [`SchemaLoader`](crate::SchemaLoader).
///
/// Every variant that concerns a file carries its path.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A configured root does not exist or is not a directory.
    #[error("schema root {} is not a directory", path.display())]
    MissingRoot {
        /// The configured root.
        path: PathBuf,
    },

    /// A file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A document is not valid JSON or YAML.
    #[error("failed to parse {}: {reason}", path.display())]
    Parse {
        /// The document path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A schema document does not conform to the JSON Schema meta-schema.
    #[error("{} is not a valid JSON Schema document: {reason}", path.display())]
    MetaSchema {
        /// The schema path.
        path: PathBuf,
        /// First meta-schema violation.
        reason: String,
    },

    /// A schema document lacks a usable identifier or version.
    #[error("{}: {source}", path.display())]
    Descriptor {
        /// The schema path.
        path: PathBuf,
        /// What was wrong with the document.
        #[source]
        source: DescriptorError,
    },

    /// Registration of a loaded schema failed.
    #[error("{}: {source}", path.display())]
    Registry {
        /// The schema path.
        path: PathBuf,
        /// The registry rejection.
        #[source]
        source: RegistryError,
    },

    /// The loader configuration could not be parsed.
    #[error("invalid loader configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_includes_pointer() {
        let err = MalformedSchema {
            schema_id: "Entity.v1".to_string(),
            schema_path: "/properties/id/type".to_string(),
            reason: "unknown type \"str\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed schema Entity.v1 at #/properties/id/type: unknown type \"str\""
        );
    }

    #[test]
    fn test_malformed_is_transparent_in_registry_error() {
        let inner = MalformedSchema {
            schema_id: "X.v1".to_string(),
            schema_path: String::new(),
            reason: "not an object".to_string(),
        };
        let err = RegistryError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
        assert!(matches!(err, RegistryError::MalformedSchema(_)));
    }

    #[test]
    fn test_not_found_display() {
        let err = RegistryError::SchemaNotFound("Missing.v1".to_string());
        assert_eq!(err.to_string(), "schema not found: Missing.v1");
    }

    #[test]
    fn test_load_error_names_path() {
        let err = LoadError::Parse {
            path: PathBuf::from("schemas/events/Bad.schema.json"),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("schemas/events/Bad.schema.json"));
    }
}

//! # Schema Descriptor
//!
//! One versioned structural schema, held as data. The raw ruleset document
//! is kept verbatim so that the validator, the digest and any external
//! tooling all see exactly what the schema source declared.
//!
//! Descriptors are immutable: every field is private and only exposed
//! through accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use schemata_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, SchemaId, SchemaVersion,
};

use crate::error::DescriptorError;

/// A versioned structural schema: identifier, version, title and ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    id: SchemaId,
    version: SchemaVersion,
    title: String,
    rules: Value,
}

impl SchemaDescriptor {
    /// Assemble a descriptor from already-validated parts.
    pub fn new(id: SchemaId, version: SchemaVersion, title: impl Into<String>, rules: Value) -> Self {
        Self {
            id,
            version,
            title: title.into(),
            rules,
        }
    }

    /// Build a descriptor from a JSON-Schema-style document.
    ///
    /// - identifier: `$id`, falling back to `id`;
    /// - version: `version`, falling back to `N.0.0` from a trailing `.vN`
    ///   in the identifier;
    /// - title: `title`, falling back to the identifier's entity name;
    /// - rules: the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] if the document is not an object, has no
    /// usable identifier or version, or either fails its syntax check.
    pub fn from_document(document: Value) -> Result<Self, DescriptorError> {
        let map = document.as_object().ok_or(DescriptorError::NotAnObject)?;

        let raw_id = match (map.get("$id"), map.get("id")) {
            (Some(v), _) => v.as_str().ok_or(DescriptorError::NotAString("$id"))?,
            (None, Some(v)) => v.as_str().ok_or(DescriptorError::NotAString("id"))?,
            (None, None) => return Err(DescriptorError::MissingField("$id")),
        };
        let id = SchemaId::new(raw_id)?;

        let version = match map.get("version") {
            Some(v) => SchemaVersion::parse(v.as_str().ok_or(DescriptorError::NotAString("version"))?)?,
            None => id
                .major_version()
                .map(|major| SchemaVersion::new(major, 0, 0))
                .ok_or(DescriptorError::MissingField("version"))?,
        };

        let title = match map.get("title") {
            Some(v) => v.as_str().ok_or(DescriptorError::NotAString("title"))?.to_string(),
            None => id.entity_name().to_string(),
        };

        Ok(Self {
            id,
            version,
            title,
            rules: document,
        })
    }

    /// The registry key.
    pub fn id(&self) -> &SchemaId {
        &self.id
    }

    /// Semantic version of the schema's shape.
    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    /// Human-readable name for diagnostics.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The raw ruleset document.
    pub fn rules(&self) -> &Value {
        &self.rules
    }

    /// SHA-256 over the JCS form of the whole descriptor.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_core::ValidationError;
    use serde_json::json;

    #[test]
    fn test_from_document_reads_all_fields() {
        let doc = json!({
            "$id": "https://schemas.example.org/events/OrderPlaced.v1",
            "version": "1.2.0",
            "title": "Order placed",
            "type": "object"
        });
        let d = SchemaDescriptor::from_document(doc.clone()).unwrap();
        assert_eq!(d.id().as_str(), "https://schemas.example.org/events/OrderPlaced.v1");
        assert_eq!(d.version(), &SchemaVersion::new(1, 2, 0));
        assert_eq!(d.title(), "Order placed");
        assert_eq!(d.rules(), &doc);
    }

    #[test]
    fn test_from_document_derives_version_and_title() {
        let d = SchemaDescriptor::from_document(json!({
            "$id": "https://schemas.example.org/roles/Operator.v3",
            "type": "object"
        }))
        .unwrap();
        assert_eq!(d.version(), &SchemaVersion::new(3, 0, 0));
        assert_eq!(d.title(), "Operator");
    }

    #[test]
    fn test_from_document_falls_back_to_plain_id() {
        let d = SchemaDescriptor::from_document(json!({"id": "Entity.v1"})).unwrap();
        assert_eq!(d.id().as_str(), "Entity.v1");
    }

    #[test]
    fn test_from_document_requires_identifier() {
        let err = SchemaDescriptor::from_document(json!({"type": "object"})).unwrap_err();
        assert_eq!(err, DescriptorError::MissingField("$id"));
    }

    #[test]
    fn test_from_document_requires_version_without_suffix() {
        let err = SchemaDescriptor::from_document(json!({"$id": "urn:entity"})).unwrap_err();
        assert_eq!(err, DescriptorError::MissingField("version"));
    }

    #[test]
    fn test_from_document_rejects_bad_version() {
        let err = SchemaDescriptor::from_document(json!({"$id": "Entity.v1", "version": "1.0"}))
            .unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::Identity(ValidationError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_from_document_rejects_non_object() {
        assert_eq!(
            SchemaDescriptor::from_document(json!(["not", "a", "schema"])).unwrap_err(),
            DescriptorError::NotAnObject
        );
    }

    #[test]
    fn test_from_document_rejects_non_string_id() {
        assert_eq!(
            SchemaDescriptor::from_document(json!({"$id": 7})).unwrap_err(),
            DescriptorError::NotAString("$id")
        );
    }

    #[test]
    fn test_digest_tracks_content() {
        let id = SchemaId::new("Entity.v1").unwrap();
        let a = SchemaDescriptor::new(id.clone(), SchemaVersion::new(1, 0, 0), "Entity", json!({"type": "object"}));
        let b = SchemaDescriptor::new(id, SchemaVersion::new(1, 0, 0), "Entity", json!({"type": "array"}));
        assert_eq!(a.digest().unwrap(), a.clone().digest().unwrap());
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
    }
}

//! # Schema Registry
//!
//! Keyed store of schema descriptors. Each descriptor is compiled and
//! fingerprinted once at registration; lookups and validations afterwards
//! only take a read lock long enough to clone two `Arc`s.
//!
//! ## Concurrency
//!
//! `SchemaRegistry` is `Send + Sync`. Any number of threads may validate
//! while another registers. Registration is atomic: a descriptor is either
//! fully visible (descriptor, compiled rules and digest together) or absent.
//!
//! ## Duplicates
//!
//! Identifiers are unique. Registering a taken identifier fails with
//! [`RegistryError::DuplicateSchema`] and leaves the existing entry in place,
//! whether or not the incoming content is identical.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use schemata_core::{ContentDigest, SchemaId};

use crate::descriptor::SchemaDescriptor;
use crate::error::RegistryError;
use crate::rule::CompiledSchema;
use crate::validate::ValidationResult;

#[derive(Clone)]
struct Entry {
    descriptor: Arc<SchemaDescriptor>,
    compiled: Arc<CompiledSchema>,
    digest: ContentDigest,
}

/// Thread-safe registry of versioned schemas.
#[derive(Default)]
pub struct SchemaRegistry {
    entries: RwLock<BTreeMap<SchemaId, Entry>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.ids())
            .finish()
    }
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema.
    ///
    /// The ruleset is compiled and the content digest computed before the
    /// registry is touched, so a malformed descriptor never becomes visible.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MalformedSchema`] if the ruleset cannot be compiled.
    /// - [`RegistryError::DuplicateSchema`] if the identifier is taken.
    /// - [`RegistryError::Canonicalization`] if the digest cannot be computed.
    pub fn register(&self, descriptor: SchemaDescriptor) -> Result<Arc<SchemaDescriptor>, RegistryError> {
        let compiled = CompiledSchema::compile(&descriptor).map_err(|e| {
            tracing::warn!(
                schema_id = %descriptor.id(),
                schema_path = %e.schema_path,
                reason = %e.reason,
                "rejected malformed schema"
            );
            e
        })?;
        let digest = descriptor.digest()?;

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(descriptor.id()) {
            tracing::warn!(
                schema_id = %descriptor.id(),
                existing = %existing.digest,
                incoming = %digest,
                "rejected duplicate schema registration"
            );
            return Err(RegistryError::DuplicateSchema {
                schema_id: descriptor.id().clone(),
                existing_digest: existing.digest.clone(),
                incoming_digest: digest,
            });
        }

        let descriptor = Arc::new(descriptor);
        tracing::debug!(
            schema_id = %descriptor.id(),
            version = %descriptor.version(),
            digest = %digest,
            "registered schema"
        );
        entries.insert(
            descriptor.id().clone(),
            Entry {
                descriptor: Arc::clone(&descriptor),
                compiled: Arc::new(compiled),
                digest,
            },
        );
        Ok(descriptor)
    }

    /// Look up a descriptor.
    pub fn get(&self, id: &str) -> Option<Arc<SchemaDescriptor>> {
        self.entries.read().get(id).map(|e| Arc::clone(&e.descriptor))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// The digest recorded when `id` was registered.
    pub fn digest(&self, id: &str) -> Option<ContentDigest> {
        self.entries.read().get(id).map(|e| e.digest.clone())
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered identifiers in ascending order.
    pub fn ids(&self) -> Vec<SchemaId> {
        self.entries.read().keys().cloned().collect()
    }

    /// Registered descriptors in identifier order.
    pub fn descriptors(&self) -> Vec<Arc<SchemaDescriptor>> {
        self.entries
            .read()
            .values()
            .map(|e| Arc::clone(&e.descriptor))
            .collect()
    }

    /// The highest-versioned descriptor whose entity name is `entity_name`.
    ///
    /// Ties on version (distinct identifiers carrying the same version) go
    /// to the greater identifier.
    pub fn latest(&self, entity_name: &str) -> Option<Arc<SchemaDescriptor>> {
        self.entries
            .read()
            .values()
            .filter(|e| e.descriptor.id().entity_name() == entity_name)
            .max_by(|a, b| {
                a.descriptor
                    .version()
                    .cmp(b.descriptor.version())
                    .then_with(|| a.descriptor.id().cmp(b.descriptor.id()))
            })
            .map(|e| Arc::clone(&e.descriptor))
    }

    /// Validate `instance` against the schema registered as `id`.
    ///
    /// The registry lock is released before the instance is walked.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SchemaNotFound`] if `id` is not registered.
    pub fn validate(&self, id: &str, instance: &Value) -> Result<ValidationResult, RegistryError> {
        let compiled = self
            .entries
            .read()
            .get(id)
            .map(|e| Arc::clone(&e.compiled))
            .ok_or_else(|| RegistryError::SchemaNotFound(id.to_string()))?;
        Ok(compiled.validate(instance))
    }
}

#![warn(missing_docs)]

//! # schemata-registry: Schema Registry & Validation Engine
//!
//! Holds versioned structural schemas and checks arbitrary JSON-like data
//! against them, reporting every violation with a precise location.
//!
//! ## Components
//!
//! - [`SchemaDescriptor`]: one immutable, versioned schema.
//! - [`CompiledSchema`]: a descriptor's ruleset compiled into a closed
//!   [`Rule`] tree, built once and reused.
//! - [`validate()`]: the pure validator. Invalid data is a normal
//!   [`ValidationResult`], never an error.
//! - [`SchemaRegistry`]: thread-safe catalog keyed by [`SchemaId`],
//!   with validate-by-identifier.
//! - [`SchemaLoader`]: fills a registry from `*.schema.{json,yaml,yml}`
//!   files grouped in namespace directories.
//!
//! ## Crate Policy
//!
//! - Depends only on `schemata-core` internally.
//! - No process-wide state: every registry is constructed by its caller.
//! - Nothing here panics on untrusted instance data.
//!
//! [`SchemaId`]: schemata_core::SchemaId

pub mod descriptor;
pub mod error;
pub mod loader;
pub mod registry;
pub mod rule;
pub mod validate;

pub use descriptor::SchemaDescriptor;
pub use error::{DescriptorError, LoadError, MalformedSchema, RegistryError};
pub use loader::{load_document, LoadReport, LoadedSchema, LoaderConfig, SchemaLoader};
pub use registry::SchemaRegistry;
pub use rule::{AdditionalProperties, CompiledSchema, Format, InstanceType, Rule, RuleSet};
pub use validate::{validate, InstancePath, PathSegment, ValidationResult, Violation, ViolationKind};

//! # schemata-core: Foundational Types for Schemata
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on: schema identifiers, semantic versions, canonical serialization
//! and content digests. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for identifiers.** `SchemaId` and `SchemaVersion` are parsed
//!    once at the boundary. No bare strings flow into the registry as keys.
//!
//! 2. **`CanonicalBytes` newtype.** Every digest is computed over RFC 8785
//!    (JCS) bytes. Two descriptors with the same content hash identically
//!    regardless of key order in their source documents.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `schemata-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{SchemaId, SchemaVersion};

//! # Schema Identity Newtypes
//!
//! `SchemaId` is the registry key. It is opaque apart from two helpers that
//! understand the `.../EntityName.vN` naming convention.
//!
//! `SchemaVersion` is a semantic version (`MAJOR.MINOR.PATCH[-pre][+build]`)
//! ordered by semver precedence, so the registry can pick the newest shape
//! of an entity.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Stable, globally unique identifier of a schema (usually URI-shaped).
///
/// Construction rejects empty strings and strings containing whitespace.
/// Nothing else about the syntax is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaId(String);

impl SchemaId {
    /// Validate and wrap an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyIdentifier);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ValidationError::IdentifierWhitespace(id));
        }
        Ok(Self(id))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entity name embedded in the identifier.
    ///
    /// Takes the last `/`- or `#`-separated segment and strips a trailing
    /// `.vN` version suffix: `https://x.org/events/OrderPlaced.v2` yields
    /// `OrderPlaced`.
    pub fn entity_name(&self) -> &str {
        split_version_suffix(self.last_segment()).0
    }

    /// The major version from a trailing `.vN` segment, if present.
    pub fn major_version(&self) -> Option<u64> {
        split_version_suffix(self.last_segment()).1
    }

    fn last_segment(&self) -> &str {
        self.0
            .rsplit(|c: char| c == '/' || c == '#')
            .find(|s| !s.is_empty())
            .unwrap_or(self.0.as_str())
    }
}

fn split_version_suffix(segment: &str) -> (&str, Option<u64>) {
    if let Some((name, digits)) = segment.rsplit_once(".v") {
        if !name.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(major) = digits.parse() {
                return (name, Some(major));
            }
        }
    }
    (segment, None)
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SchemaId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SchemaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SchemaId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SchemaId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SchemaId> for String {
    fn from(id: SchemaId) -> Self {
        id.0
    }
}

impl FromStr for SchemaId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A semantic version attached to a schema's shape.
///
/// Ordering follows semver precedence: numeric core first, then a release
/// ranks above any of its pre-releases, then pre-release identifiers compare
/// field by field. Build metadata only breaks ties so that `Ord` stays
/// consistent with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Option<String>,
    build: Option<String>,
}

impl SchemaVersion {
    /// A release version with no pre-release or build metadata.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// Parse `MAJOR.MINOR.PATCH[-pre][+build]`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidVersion`] naming the part of the
    /// grammar that failed.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidVersion {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => {
                if !dot_identifiers_valid(build, false) {
                    return Err(invalid("malformed build metadata"));
                }
                (rest, Some(build.to_string()))
            }
            None => (s, None),
        };

        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => {
                if !dot_identifiers_valid(pre, true) {
                    return Err(invalid("malformed pre-release"));
                }
                (core, Some(pre.to_string()))
            }
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected MAJOR.MINOR.PATCH"));
        }
        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = parse_numeric(part).ok_or_else(|| invalid("version components must be non-negative integers without leading zeros"))?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre,
            build,
        })
    }

    /// Major component.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// Minor component.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// Patch component.
    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Pre-release suffix, without the leading `-`.
    pub fn pre_release(&self) -> Option<&str> {
        self.pre.as_deref()
    }

    /// Build metadata, without the leading `+`.
    pub fn build_metadata(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// True when the version carries a pre-release suffix.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

fn parse_numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

fn dot_identifiers_valid(s: &str, reject_leading_zero: bool) -> bool {
    s.split('.').all(|ident| {
        if ident.is_empty() || !ident.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return false;
        }
        let numeric = ident.bytes().all(|b| b.is_ascii_digit());
        !(reject_leading_zero && numeric && ident.len() > 1 && ident.starts_with('0'))
    })
}

fn compare_pre_release(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre_release(a, b),
            })
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl FromStr for SchemaVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.to_string()
    }
}

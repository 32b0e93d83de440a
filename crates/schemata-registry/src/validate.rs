//! # Validation
//!
//! Walks a [`CompiledSchema`] against a `serde_json::Value` instance and
//! collects every independent violation in one pass.
//!
//! ## Ordering
//!
//! Violations appear in the order their constraints are declared in the
//! schema document. Extra fields rejected by `additionalProperties` appear
//! in the instance's key order. Identical inputs always produce identical
//! output.
//!
//! ## Type guard
//!
//! A node's `type` is checked before anything else. When the instance has
//! the wrong type, one `Type` violation is emitted at that location and the
//! node's remaining rules are skipped, so a scalar where an object was
//! expected does not also report every nested field as missing.
//!
//! ## Failure channel
//!
//! Invalid data is a normal result (`valid == false`), never an `Err`. The
//! only error is [`MalformedSchema`], raised when the descriptor's ruleset
//! cannot be compiled.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::SchemaDescriptor;
use crate::error::MalformedSchema;
use crate::rule::{escape_pointer, json_equal, type_name, AdditionalProperties, CompiledSchema, Rule, RuleSet};

/// Validate `instance` against `descriptor`.
///
/// Compiles the ruleset on every call. Callers validating repeatedly
/// against the same schema should compile once with
/// [`CompiledSchema::compile`] or go through a
/// [`SchemaRegistry`](crate::SchemaRegistry), which caches the compiled form.
///
/// # Errors
///
/// Returns [`MalformedSchema`] if the ruleset cannot be interpreted.
pub fn validate(descriptor: &SchemaDescriptor, instance: &Value) -> Result<ValidationResult, MalformedSchema> {
    Ok(CompiledSchema::compile(descriptor)?.validate(instance))
}

/// One step from a parent value to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object field name.
    Key(String),
    /// Array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a value inside an instance, from the root down.
///
/// Serializes as an array of field names and indices; displays as an
/// RFC 6901 JSON Pointer (the root is the empty string).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstancePath(Vec<PathSegment>);

impl InstancePath {
    /// The root of the instance.
    pub fn root() -> Self {
        Self::default()
    }

    /// The segments from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// True for the instance root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a JSON Pointer.
    pub fn to_pointer(&self) -> String {
        self.0
            .iter()
            .map(|s| match s {
                PathSegment::Key(k) => format!("/{}", escape_pointer(k)),
                PathSegment::Index(i) => format!("/{i}"),
            })
            .collect()
    }

    fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for InstancePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Machine-readable category of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Wrong primitive type.
    Type,
    /// Required field absent.
    MissingField,
    /// Field not allowed by `additionalProperties: false`.
    AdditionalProperty,
    /// String failed a format check.
    Format,
    /// Value not among `enum` or not equal to `const`.
    Enum,
    /// String too short or too long.
    Length,
    /// Number outside its bounds.
    Range,
    /// String does not match `pattern`.
    Pattern,
    /// Array has too few or too many elements.
    ItemCount,
    /// Array element repeats an earlier one under `uniqueItems`.
    DuplicateItem,
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Where in the instance the constraint failed.
    pub instance_path: InstancePath,
    /// JSON Pointer to the failing keyword in the schema document.
    pub schema_path: String,
    /// Category of the failure.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_root() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Outcome of validating one instance against one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no constraint failed.
    pub valid: bool,
    /// Every failed constraint in declaration order; empty when valid.
    pub errors: Vec<Violation>,
}

impl ValidationResult {
    fn from_violations(errors: Vec<Violation>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// True when no constraint failed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The failed constraints.
    pub fn errors(&self) -> &[Violation] {
        &self.errors
    }

    /// Violations at exactly `path`.
    pub fn errors_at<'a>(&'a self, path: &'a InstancePath) -> impl Iterator<Item = &'a Violation> + 'a {
        self.errors.iter().filter(move |v| &v.instance_path == path)
    }
}

impl CompiledSchema {
    /// Validate an instance against this compiled schema.
    pub fn validate(&self, instance: &Value) -> ValidationResult {
        let mut walker = Walker {
            schema: self,
            path: InstancePath::root(),
            out: Vec::new(),
        };
        walker.walk(&self.root, instance);
        tracing::trace!(
            schema_id = %self.schema_id,
            violations = walker.out.len(),
            "validated instance"
        );
        ValidationResult::from_violations(walker.out)
    }
}

struct Walker<'s> {
    schema: &'s CompiledSchema,
    path: InstancePath,
    out: Vec<Violation>,
}

impl<'s> Walker<'s> {
    fn report(&mut self, set: &RuleSet, keyword: &str, kind: ViolationKind, message: String) {
        self.report_at(self.path.clone(), set, keyword, kind, message);
    }

    fn report_at(&mut self, instance_path: InstancePath, set: &RuleSet, keyword: &str, kind: ViolationKind, message: String) {
        self.out.push(Violation {
            instance_path,
            schema_path: format!("{}/{keyword}", set.pointer),
            kind,
            message,
        });
    }

    fn walk(&mut self, set: &'s RuleSet, value: &Value) {
        if let Some(types) = &set.types {
            if !types.iter().any(|t| t.matches(value)) {
                let expected = match types.as_slice() {
                    [single] => single.to_string(),
                    many => format!(
                        "one of [{}]",
                        many.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
                    ),
                };
                self.report(
                    set,
                    "type",
                    ViolationKind::Type,
                    format!("expected {expected}, found {}", type_name(value)),
                );
                return;
            }
        }

        for rule in &set.rules {
            match rule {
                Rule::Required(fields) => {
                    if let Value::Object(map) = value {
                        for field in fields.iter().filter(|f| !map.contains_key(f.as_str())) {
                            let at = self.path.child(PathSegment::Key(field.clone()));
                            self.report_at(
                                at,
                                set,
                                "required",
                                ViolationKind::MissingField,
                                format!("missing required field {field:?}"),
                            );
                        }
                    }
                }
                Rule::Object {
                    properties,
                    additional,
                } => {
                    if let Value::Object(map) = value {
                        self.walk_object(set, properties, additional, map);
                    }
                }
                Rule::ArrayOf {
                    items,
                    min_items,
                    max_items,
                    unique,
                } => {
                    if let Value::Array(elements) = value {
                        self.walk_array(set, items.as_deref(), *min_items, *max_items, *unique, elements);
                    }
                }
                Rule::Format(format) => {
                    if let Value::String(s) = value {
                        if !format.check(s) {
                            self.report(
                                set,
                                "format",
                                ViolationKind::Format,
                                format!("{s:?} is not a valid {format}"),
                            );
                        }
                    }
                }
                Rule::Enum(allowed) => {
                    if !allowed.iter().any(|a| json_equal(a, value)) {
                        self.report(
                            set,
                            "enum",
                            ViolationKind::Enum,
                            format!("{value} is not one of {}", Value::Array(allowed.clone())),
                        );
                    }
                }
                Rule::Const(expected) => {
                    if !json_equal(value, expected) {
                        self.report(set, "const", ViolationKind::Enum, format!("expected {expected}, found {value}"));
                    }
                }
                Rule::Length { min, max } => {
                    if let Value::String(s) = value {
                        let len = s.chars().count() as u64;
                        if let Some(min) = min.filter(|m| len < *m) {
                            self.report(
                                set,
                                "minLength",
                                ViolationKind::Length,
                                format!("length {len} is shorter than {min}"),
                            );
                        }
                        if let Some(max) = max.filter(|m| len > *m) {
                            self.report(
                                set,
                                "maxLength",
                                ViolationKind::Length,
                                format!("length {len} is longer than {max}"),
                            );
                        }
                    }
                }
                Rule::Range {
                    minimum,
                    maximum,
                    exclusive_minimum,
                    exclusive_maximum,
                } => {
                    if let Some(n) = value.as_f64() {
                        let checks = [
                            ("minimum", minimum.filter(|b| n < *b), "less than"),
                            ("maximum", maximum.filter(|b| n > *b), "greater than"),
                            ("exclusiveMinimum", exclusive_minimum.filter(|b| n <= *b), "not greater than"),
                            ("exclusiveMaximum", exclusive_maximum.filter(|b| n >= *b), "not less than"),
                        ];
                        for (keyword, failed, relation) in checks {
                            if let Some(bound) = failed {
                                self.report(set, keyword, ViolationKind::Range, format!("{value} is {relation} {bound}"));
                            }
                        }
                    }
                }
                Rule::Pattern(regex) => {
                    if let Value::String(s) = value {
                        if !regex.is_match(s) {
                            self.report(
                                set,
                                "pattern",
                                ViolationKind::Pattern,
                                format!("{s:?} does not match pattern {:?}", regex.as_str()),
                            );
                        }
                    }
                }
                Rule::Ref(target) => {
                    // Compilation guarantees every reference resolves.
                    if let Some(definition) = self.schema.definition(target) {
                        self.walk(definition, value);
                    }
                }
            }
        }
    }

    fn walk_object(
        &mut self,
        set: &'s RuleSet,
        properties: &'s [(String, RuleSet)],
        additional: &'s AdditionalProperties,
        map: &Map<String, Value>,
    ) {
        for (name, child) in properties {
            if let Some(field) = map.get(name) {
                self.path.push(PathSegment::Key(name.clone()));
                self.walk(child, field);
                self.path.pop();
            }
        }

        let declared = |key: &str| properties.iter().any(|(name, _)| name == key);
        match additional {
            AdditionalProperties::Allow => {}
            AdditionalProperties::Deny => {
                for key in map.keys().filter(|k| !declared(k.as_str())) {
                    let at = self.path.child(PathSegment::Key(key.clone()));
                    self.report_at(
                        at,
                        set,
                        "additionalProperties",
                        ViolationKind::AdditionalProperty,
                        format!("field {key:?} is not allowed"),
                    );
                }
            }
            AdditionalProperties::Schema(extra) => {
                for (key, field) in map.iter().filter(|(k, _)| !declared(k.as_str())) {
                    self.path.push(PathSegment::Key(key.clone()));
                    self.walk(extra, field);
                    self.path.pop();
                }
            }
        }
    }

    fn walk_array(
        &mut self,
        set: &'s RuleSet,
        items: Option<&'s RuleSet>,
        min_items: Option<u64>,
        max_items: Option<u64>,
        unique: bool,
        elements: &[Value],
    ) {
        let count = elements.len() as u64;
        if let Some(min) = min_items.filter(|m| count < *m) {
            self.report(
                set,
                "minItems",
                ViolationKind::ItemCount,
                format!("array has {count} item(s), fewer than {min}"),
            );
        }
        if let Some(max) = max_items.filter(|m| count > *m) {
            self.report(
                set,
                "maxItems",
                ViolationKind::ItemCount,
                format!("array has {count} item(s), more than {max}"),
            );
        }
        if unique {
            for (i, element) in elements.iter().enumerate() {
                if let Some(first) = elements[..i].iter().position(|earlier| json_equal(earlier, element)) {
                    let at = self.path.child(PathSegment::Index(i));
                    self.report_at(
                        at,
                        set,
                        "uniqueItems",
                        ViolationKind::DuplicateItem,
                        format!("item {i} duplicates item {first}"),
                    );
                }
            }
        }
        if let Some(item_rules) = items {
            for (i, element) in elements.iter().enumerate() {
                self.path.push(PathSegment::Index(i));
                self.walk(item_rules, element);
                self.path.pop();
            }
        }
    }
}

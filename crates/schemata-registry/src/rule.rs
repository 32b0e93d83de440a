//! # Rule Tree
//!
//! A descriptor's raw ruleset is compiled once into a closed set of rule
//! kinds. The validator pattern-matches over [`Rule`] exhaustively; nothing
//! downstream inspects the raw document again.
//!
//! ## Supported keywords
//!
//! | Rule | Keywords |
//! |---|---|
//! | type guard | `type` |
//! | [`Rule::Required`] | `required` |
//! | [`Rule::Object`] | `properties`, `additionalProperties` |
//! | [`Rule::ArrayOf`] | `items`, `minItems`, `maxItems`, `uniqueItems` |
//! | [`Rule::Format`] | `format` |
//! | [`Rule::Enum`] / [`Rule::Const`] | `enum`, `const` |
//! | [`Rule::Length`] | `minLength`, `maxLength` |
//! | [`Rule::Range`] | `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum` |
//! | [`Rule::Pattern`] | `pattern` |
//! | [`Rule::Ref`] | `$ref` to `#/$defs/..` or `#/definitions/..` |
//!
//! Annotation keywords and `x-` extensions are ignored. Anything else is a
//! [`MalformedSchema`]: the validator refuses to silently skip a constraint
//! it does not understand.
//!
//! Rules keep the order in which their first keyword appears in the
//! document, which is what makes violation order follow declaration order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};

use schemata_core::{SchemaId, SchemaVersion};

use crate::descriptor::SchemaDescriptor;
use crate::error::MalformedSchema;

const ANNOTATION_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "$comment",
    "title",
    "description",
    "version",
    "default",
    "examples",
    "deprecated",
    "readOnly",
    "writeOnly",
    "$defs",
    "definitions",
];

const DEFINITION_CONTAINERS: &[&str] = &["$defs", "definitions"];

/// Primitive JSON types a `type` keyword can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceType {
    /// `null`
    Null,
    /// `true` or `false`
    Boolean,
    /// A map.
    Object,
    /// A sequence.
    Array,
    /// Any number.
    Number,
    /// A number with no fractional part.
    Integer,
    /// A string.
    String,
}

impl InstanceType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => Self::Array,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "string" => Self::String,
            _ => return None,
        })
    }

    /// The keyword spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Number => value.is_number(),
            Self::Integer => is_integer(value),
            Self::String => value.is_string(),
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

/// Name of the JSON type of `value`, as used in violation messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) if is_integer(value) => "integer",
        Value::Number(_) => "number",
    }
}

/// JSON equality with numbers compared by value, so `1` equals `1.0`.
///
/// Object key order is ignored. Used by `enum`, `const` and `uniqueItems`
/// so they agree with the `integer` type check.
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(i), Some(j)) => i == j,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

/// String formats the validator knows how to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Hyphenated UUID, e.g. `123e4567-e89b-12d3-a456-426614174000`.
    Uuid,
    /// RFC 3339 timestamp with offset.
    DateTime,
    /// `YYYY-MM-DD` calendar date.
    Date,
    /// `local@domain.tld`.
    Email,
    /// Absolute URI with a scheme.
    Uri,
    /// Semantic version.
    Semver,
}

impl Format {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "uuid" => Self::Uuid,
            "date-time" => Self::DateTime,
            "date" => Self::Date,
            "email" => Self::Email,
            "uri" => Self::Uri,
            "semver" => Self::Semver,
            _ => return None,
        })
    }

    /// The keyword spelling of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::DateTime => "date-time",
            Self::Date => "date",
            Self::Email => "email",
            Self::Uri => "uri",
            Self::Semver => "semver",
        }
    }

    /// Whether `s` is well-formed for this format.
    pub fn check(&self, s: &str) -> bool {
        match self {
            Self::Uuid => s.len() == 36 && uuid::Uuid::try_parse(s).is_ok(),
            Self::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
            Self::Date => s.len() == 10 && chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
            Self::Email => is_email(s),
            Self::Uri => is_absolute_uri(s),
            Self::Semver => SchemaVersion::parse(s).is_ok(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_absolute_uri(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
        && !rest.chars().any(char::is_whitespace)
}

/// How an object treats keys not named under `properties`.
#[derive(Debug, Clone)]
pub enum AdditionalProperties {
    /// Extra keys are accepted unchecked.
    Allow,
    /// Extra keys are violations.
    Deny,
    /// Extra keys must satisfy the sub-schema.
    Schema(Box<RuleSet>),
}

/// One compiled constraint.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Field names that must be present on an object.
    Required(Vec<String>),
    /// Nested field schemas and the extra-field policy.
    Object {
        /// Declared fields, in document order.
        properties: Vec<(String, RuleSet)>,
        /// Policy for undeclared fields.
        additional: AdditionalProperties,
    },
    /// Element schema and cardinality of an array.
    ArrayOf {
        /// Schema every element must satisfy.
        items: Option<Box<RuleSet>>,
        /// Minimum element count.
        min_items: Option<u64>,
        /// Maximum element count.
        max_items: Option<u64>,
        /// Whether elements must be pairwise distinct.
        unique: bool,
    },
    /// String format check.
    Format(Format),
    /// Value must equal one of these.
    Enum(Vec<Value>),
    /// Value must equal this.
    Const(Value),
    /// String length bounds, in characters.
    Length {
        /// Inclusive lower bound.
        min: Option<u64>,
        /// Inclusive upper bound.
        max: Option<u64>,
    },
    /// Numeric bounds.
    Range {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
        /// Exclusive lower bound.
        exclusive_minimum: Option<f64>,
        /// Exclusive upper bound.
        exclusive_maximum: Option<f64>,
    },
    /// Regular expression the string must match somewhere.
    Pattern(Regex),
    /// Apply a definition at the same instance location. Holds the
    /// definition's schema pointer (`/$defs/Name`).
    Ref(String),
}

/// All constraints declared at one node of the schema document.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) pointer: String,
    pub(crate) types: Option<Vec<InstanceType>>,
    pub(crate) rules: Vec<Rule>,
}

impl RuleSet {
    /// JSON Pointer of this node within the schema document.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Accepted types, if the node declares `type`.
    pub fn types(&self) -> Option<&[InstanceType]> {
        self.types.as_deref()
    }

    /// Constraints other than the type guard, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// A descriptor's ruleset compiled for repeated validation.
///
/// Immutable and `Send + Sync`; one instance can serve any number of
/// concurrent validations.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub(crate) schema_id: SchemaId,
    pub(crate) root: RuleSet,
    pub(crate) definitions: BTreeMap<String, RuleSet>,
}

impl CompiledSchema {
    /// Compile a descriptor's ruleset.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSchema`] naming the first keyword that cannot be
    /// interpreted, or a `$ref` cycle that would never consume input.
    pub fn compile(descriptor: &SchemaDescriptor) -> Result<Self, MalformedSchema> {
        let compiler = Compiler {
            schema_id: descriptor.id().as_str(),
            definition_pointers: collect_definition_pointers(descriptor)?,
        };
        let document = descriptor.rules();

        let mut definitions = BTreeMap::new();
        if let Value::Object(root) = document {
            for container in DEFINITION_CONTAINERS {
                if let Some(Value::Object(defs)) = root.get(*container) {
                    for (name, schema) in defs {
                        let pointer = format!("/{container}/{}", escape_pointer(name));
                        let set = compiler.compile_node(schema, &pointer)?;
                        definitions.insert(pointer, set);
                    }
                }
            }
        }

        let root = compiler.compile_node(document, "")?;
        compiler.reject_ref_cycles(&definitions)?;

        Ok(Self {
            schema_id: descriptor.id().clone(),
            root,
            definitions,
        })
    }

    /// Identifier of the schema this was compiled from.
    pub fn schema_id(&self) -> &SchemaId {
        &self.schema_id
    }

    /// The root node.
    pub fn root(&self) -> &RuleSet {
        &self.root
    }

    pub(crate) fn definition(&self, pointer: &str) -> Option<&RuleSet> {
        self.definitions.get(pointer)
    }
}

fn collect_definition_pointers(descriptor: &SchemaDescriptor) -> Result<BTreeSet<String>, MalformedSchema> {
    let mut pointers = BTreeSet::new();
    let Value::Object(root) = descriptor.rules() else {
        return Ok(pointers);
    };
    for container in DEFINITION_CONTAINERS {
        match root.get(*container) {
            None => {}
            Some(Value::Object(defs)) => {
                for name in defs.keys() {
                    pointers.insert(format!("/{container}/{}", escape_pointer(name)));
                }
            }
            Some(_) => {
                return Err(MalformedSchema {
                    schema_id: descriptor.id().to_string(),
                    schema_path: format!("/{container}"),
                    reason: format!("`{container}` must be an object"),
                })
            }
        }
    }
    Ok(pointers)
}

/// Escape a key for use as a JSON Pointer reference token (RFC 6901).
pub(crate) fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

struct Compiler<'a> {
    schema_id: &'a str,
    definition_pointers: BTreeSet<String>,
}

impl Compiler<'_> {
    fn malformed(&self, pointer: &str, reason: impl Into<String>) -> MalformedSchema {
        MalformedSchema {
            schema_id: self.schema_id.to_string(),
            schema_path: pointer.to_string(),
            reason: reason.into(),
        }
    }

    fn compile_node(&self, node: &Value, pointer: &str) -> Result<RuleSet, MalformedSchema> {
        let map = match node {
            Value::Object(map) => map,
            other => {
                return Err(self.malformed(
                    pointer,
                    format!("sub-schema must be an object, found {}", type_name(other)),
                ))
            }
        };

        let mut set = RuleSet {
            pointer: pointer.to_string(),
            types: None,
            rules: Vec::new(),
        };
        let mut object_done = false;
        let mut array_done = false;
        let mut length_done = false;
        let mut range_done = false;

        for (keyword, value) in map {
            let at = format!("{pointer}/{}", escape_pointer(keyword));
            match keyword.as_str() {
                "type" => set.types = Some(self.compile_type(value, &at)?),
                "required" => set.rules.push(Rule::Required(self.compile_required(value, &at)?)),
                "properties" | "additionalProperties" => {
                    if !object_done {
                        object_done = true;
                        set.rules.push(self.compile_object(map, pointer)?);
                    }
                }
                "items" | "minItems" | "maxItems" | "uniqueItems" => {
                    if !array_done {
                        array_done = true;
                        set.rules.push(self.compile_array(map, pointer)?);
                    }
                }
                "minLength" | "maxLength" => {
                    if !length_done {
                        length_done = true;
                        set.rules.push(Rule::Length {
                            min: self.optional_count(map, "minLength", pointer)?,
                            max: self.optional_count(map, "maxLength", pointer)?,
                        });
                    }
                }
                "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" => {
                    if !range_done {
                        range_done = true;
                        set.rules.push(Rule::Range {
                            minimum: self.optional_number(map, "minimum", pointer)?,
                            maximum: self.optional_number(map, "maximum", pointer)?,
                            exclusive_minimum: self.optional_number(map, "exclusiveMinimum", pointer)?,
                            exclusive_maximum: self.optional_number(map, "exclusiveMaximum", pointer)?,
                        });
                    }
                }
                "format" => {
                    let name = value
                        .as_str()
                        .ok_or_else(|| self.malformed(&at, "`format` must be a string"))?;
                    let format = Format::parse(name)
                        .ok_or_else(|| self.malformed(&at, format!("unknown format {name:?}")))?;
                    set.rules.push(Rule::Format(format));
                }
                "enum" => match value {
                    Value::Array(values) if !values.is_empty() => set.rules.push(Rule::Enum(values.clone())),
                    _ => return Err(self.malformed(&at, "`enum` must be a non-empty array")),
                },
                "const" => set.rules.push(Rule::Const(value.clone())),
                "pattern" => {
                    let source = value
                        .as_str()
                        .ok_or_else(|| self.malformed(&at, "`pattern` must be a string"))?;
                    let regex = Regex::new(source)
                        .map_err(|e| self.malformed(&at, format!("invalid pattern: {e}")))?;
                    set.rules.push(Rule::Pattern(regex));
                }
                "$ref" => set.rules.push(Rule::Ref(self.compile_ref(value, &at)?)),
                k if ANNOTATION_KEYWORDS.contains(&k) || k.starts_with("x-") => {}
                other => return Err(self.malformed(&at, format!("unsupported keyword `{other}`"))),
            }
        }

        Ok(set)
    }

    fn compile_type(&self, value: &Value, at: &str) -> Result<Vec<InstanceType>, MalformedSchema> {
        let parse_one = |v: &Value| -> Result<InstanceType, MalformedSchema> {
            let name = v
                .as_str()
                .ok_or_else(|| self.malformed(at, "`type` entries must be strings"))?;
            InstanceType::parse(name).ok_or_else(|| self.malformed(at, format!("unknown type {name:?}")))
        };
        match value {
            Value::String(_) => Ok(vec![parse_one(value)?]),
            Value::Array(names) if !names.is_empty() => names.iter().map(parse_one).collect(),
            _ => Err(self.malformed(at, "`type` must be a string or a non-empty array of strings")),
        }
    }

    fn compile_required(&self, value: &Value, at: &str) -> Result<Vec<String>, MalformedSchema> {
        let names = value
            .as_array()
            .ok_or_else(|| self.malformed(at, "`required` must be an array of strings"))?;
        let mut seen = BTreeSet::new();
        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            let name = name
                .as_str()
                .ok_or_else(|| self.malformed(at, "`required` must be an array of strings"))?;
            if !seen.insert(name) {
                return Err(self.malformed(at, format!("`required` lists {name:?} twice")));
            }
            fields.push(name.to_string());
        }
        Ok(fields)
    }

    fn compile_object(&self, map: &Map<String, Value>, pointer: &str) -> Result<Rule, MalformedSchema> {
        let mut properties = Vec::new();
        if let Some(value) = map.get("properties") {
            let at = format!("{pointer}/properties");
            let fields = value
                .as_object()
                .ok_or_else(|| self.malformed(&at, "`properties` must be an object"))?;
            for (name, schema) in fields {
                let child = self.compile_node(schema, &format!("{at}/{}", escape_pointer(name)))?;
                properties.push((name.clone(), child));
            }
        }

        let additional = match map.get("additionalProperties") {
            None | Some(Value::Bool(true)) => AdditionalProperties::Allow,
            Some(Value::Bool(false)) => AdditionalProperties::Deny,
            Some(schema @ Value::Object(_)) => AdditionalProperties::Schema(Box::new(
                self.compile_node(schema, &format!("{pointer}/additionalProperties"))?,
            )),
            Some(_) => {
                return Err(self.malformed(
                    &format!("{pointer}/additionalProperties"),
                    "`additionalProperties` must be a boolean or an object",
                ))
            }
        };

        Ok(Rule::Object {
            properties,
            additional,
        })
    }

    fn compile_array(&self, map: &Map<String, Value>, pointer: &str) -> Result<Rule, MalformedSchema> {
        let items = match map.get("items") {
            None => None,
            Some(schema @ Value::Object(_)) => {
                Some(Box::new(self.compile_node(schema, &format!("{pointer}/items"))?))
            }
            Some(_) => {
                return Err(self.malformed(
                    &format!("{pointer}/items"),
                    "`items` must be a single sub-schema object",
                ))
            }
        };
        let unique = match map.get("uniqueItems") {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(self.malformed(
                    &format!("{pointer}/uniqueItems"),
                    "`uniqueItems` must be a boolean",
                ))
            }
        };
        Ok(Rule::ArrayOf {
            items,
            min_items: self.optional_count(map, "minItems", pointer)?,
            max_items: self.optional_count(map, "maxItems", pointer)?,
            unique,
        })
    }

    fn optional_count(
        &self,
        map: &Map<String, Value>,
        keyword: &str,
        pointer: &str,
    ) -> Result<Option<u64>, MalformedSchema> {
        match map.get(keyword) {
            None => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                self.malformed(
                    &format!("{pointer}/{keyword}"),
                    format!("`{keyword}` must be a non-negative integer"),
                )
            }),
        }
    }

    fn optional_number(
        &self,
        map: &Map<String, Value>,
        keyword: &str,
        pointer: &str,
    ) -> Result<Option<f64>, MalformedSchema> {
        match map.get(keyword) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                self.malformed(
                    &format!("{pointer}/{keyword}"),
                    format!("`{keyword}` must be a number"),
                )
            }),
        }
    }

    fn compile_ref(&self, value: &Value, at: &str) -> Result<String, MalformedSchema> {
        let reference = value
            .as_str()
            .ok_or_else(|| self.malformed(at, "`$ref` must be a string"))?;
        let target = reference
            .strip_prefix('#')
            .filter(|p| DEFINITION_CONTAINERS.iter().any(|c| p.starts_with(&format!("/{c}/"))))
            .ok_or_else(|| {
                self.malformed(
                    at,
                    format!("unsupported reference {reference:?}; only #/$defs/.. and #/definitions/.. are resolved"),
                )
            })?;
        if !self.definition_pointers.contains(target) {
            return Err(self.malformed(at, format!("reference {reference:?} has no matching definition")));
        }
        Ok(target.to_string())
    }

    /// A definition whose rules `$ref` back to itself without descending into
    /// a property or item would recurse forever on any input.
    fn reject_ref_cycles(&self, definitions: &BTreeMap<String, RuleSet>) -> Result<(), MalformedSchema> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        fn visit<'d>(
            node: &'d str,
            definitions: &'d BTreeMap<String, RuleSet>,
            marks: &mut BTreeMap<&'d str, Mark>,
        ) -> Option<&'d str> {
            match marks.get(node) {
                Some(Mark::Active) => return Some(node),
                Some(Mark::Done) => return None,
                None => {}
            }
            marks.insert(node, Mark::Active);
            if let Some(set) = definitions.get(node) {
                for rule in &set.rules {
                    if let Rule::Ref(target) = rule {
                        if let Some(found) = visit(target.as_str(), definitions, marks) {
                            return Some(found);
                        }
                    }
                }
            }
            marks.insert(node, Mark::Done);
            None
        }

        let mut marks = BTreeMap::new();
        for pointer in definitions.keys() {
            if let Some(cyclic) = visit(pointer.as_str(), definitions, &mut marks) {
                return Err(self.malformed(cyclic, "`$ref` cycle does not descend into the instance"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(rules: Value) -> SchemaDescriptor {
        SchemaDescriptor::new(
            SchemaId::new("Test.v1").unwrap(),
            SchemaVersion::new(1, 0, 0),
            "Test",
            rules,
        )
    }

    fn compile(rules: Value) -> Result<CompiledSchema, MalformedSchema> {
        CompiledSchema::compile(&descriptor(rules))
    }

    #[test]
    fn test_rules_follow_declaration_order() {
        let compiled = compile(json!({
            "required": ["a"],
            "type": "object",
            "properties": {"a": {"type": "string", "minLength": 1, "format": "uuid"}},
            "additionalProperties": false
        }))
        .unwrap();
        let root = compiled.root();
        assert_eq!(root.types(), Some(&[InstanceType::Object][..]));
        assert!(matches!(root.rules()[0], Rule::Required(_)));
        assert!(matches!(root.rules()[1], Rule::Object { additional: AdditionalProperties::Deny, .. }));
        assert_eq!(root.rules().len(), 2);

        let Rule::Object { properties, .. } = &root.rules()[1] else {
            panic!("expected object rule");
        };
        assert_eq!(properties[0].0, "a");
        assert_eq!(properties[0].1.pointer(), "/properties/a");
        assert!(matches!(properties[0].1.rules()[0], Rule::Length { min: Some(1), max: None }));
        assert!(matches!(properties[0].1.rules()[1], Rule::Format(Format::Uuid)));
    }

    #[test]
    fn test_annotations_and_extensions_ignored() {
        let compiled = compile(json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "Test.v1",
            "title": "Test",
            "description": "doc",
            "x-owner": "platform-team",
            "type": "object"
        }))
        .unwrap();
        assert!(compiled.root().rules().is_empty());
    }

    #[test]
    fn test_unknown_keyword_is_malformed() {
        let err = compile(json!({"type": "object", "oneOf": []})).unwrap_err();
        assert_eq!(err.schema_path, "/oneOf");
        assert!(err.reason.contains("unsupported keyword"));
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let err = compile(json!({"properties": {"id": {"type": "str"}}})).unwrap_err();
        assert_eq!(err.schema_path, "/properties/id/type");
        assert_eq!(err.schema_id, "Test.v1");
    }

    #[test]
    fn test_unknown_format_is_malformed() {
        let err = compile(json!({"format": "ipv9"})).unwrap_err();
        assert_eq!(err.schema_path, "/format");
    }

    #[test]
    fn test_invalid_pattern_is_malformed() {
        let err = compile(json!({"pattern": "(unclosed"})).unwrap_err();
        assert_eq!(err.schema_path, "/pattern");
    }

    #[test]
    fn test_required_must_be_unique_strings() {
        assert!(compile(json!({"required": "id"})).is_err());
        assert!(compile(json!({"required": [1]})).is_err());
        assert!(compile(json!({"required": ["id", "id"]})).is_err());
    }

    #[test]
    fn test_boolean_sub_schema_only_for_additional_properties() {
        assert!(compile(json!({"additionalProperties": {"type": "string"}})).is_ok());
        let err = compile(json!({"properties": {"a": true}})).unwrap_err();
        assert_eq!(err.schema_path, "/properties/a");
        assert!(compile(json!(true)).is_err());
    }

    #[test]
    fn test_tuple_items_rejected() {
        let err = compile(json!({"items": [{"type": "string"}]})).unwrap_err();
        assert_eq!(err.schema_path, "/items");
    }

    #[test]
    fn test_negative_count_rejected() {
        let err = compile(json!({"minItems": -1})).unwrap_err();
        assert_eq!(err.schema_path, "/minItems");
    }

    #[test]
    fn test_ref_resolves_to_definition() {
        let compiled = compile(json!({
            "$defs": {"Address": {"type": "object", "required": ["city"]}},
            "properties": {"home": {"$ref": "#/$defs/Address"}}
        }))
        .unwrap();
        assert!(compiled.definition("/$defs/Address").is_some());
    }

    #[test]
    fn test_ref_to_missing_definition_rejected() {
        let err = compile(json!({"properties": {"home": {"$ref": "#/$defs/Nope"}}})).unwrap_err();
        assert_eq!(err.schema_path, "/properties/home/$ref");
    }

    #[test]
    fn test_remote_ref_rejected() {
        let err = compile(json!({"$ref": "https://example.org/other.json"})).unwrap_err();
        assert!(err.reason.contains("unsupported reference"));
    }

    #[test]
    fn test_pure_ref_cycle_rejected() {
        let err = compile(json!({
            "definitions": {
                "A": {"$ref": "#/definitions/B"},
                "B": {"$ref": "#/definitions/A"}
            },
            "$ref": "#/definitions/A"
        }))
        .unwrap_err();
        assert!(err.reason.contains("cycle"));
    }

    #[test]
    fn test_recursive_ref_through_properties_allowed() {
        let compiled = compile(json!({
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {"children": {"type": "array", "items": {"$ref": "#/$defs/Node"}}}
                }
            },
            "$ref": "#/$defs/Node"
        }));
        assert!(compiled.is_ok());
    }

    #[test]
    fn test_definition_key_escaping() {
        let compiled = compile(json!({
            "$defs": {"a/b": {"type": "string"}},
            "$ref": "#/$defs/a~1b"
        }))
        .unwrap();
        assert!(compiled.definition("/$defs/a~1b").is_some());
    }

    #[test]
    fn test_integer_matching() {
        assert!(InstanceType::Integer.matches(&json!(3)));
        assert!(InstanceType::Integer.matches(&json!(3.0)));
        assert!(!InstanceType::Integer.matches(&json!(3.5)));
        assert!(InstanceType::Number.matches(&json!(3.5)));
        assert_eq!(type_name(&json!(2.0)), "integer");
        assert_eq!(type_name(&json!(2.5)), "number");
    }

    #[test]
    fn test_json_equal_compares_numbers_by_value() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(json_equal(&json!(-3), &json!(-3.0)));
        assert!(!json_equal(&json!(1), &json!(1.5)));
        assert!(json_equal(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}])));
        assert!(json_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
        assert!(!json_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!json_equal(&json!("1"), &json!(1)));
        assert!(json_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn test_format_checks() {
        assert!(Format::Uuid.check("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!Format::Uuid.check("123e4567e89b12d3a456426614174000"));
        assert!(Format::DateTime.check("2024-01-01T00:00:00Z"));
        assert!(Format::DateTime.check("2024-01-01T05:30:00+05:30"));
        assert!(!Format::DateTime.check("2024-01-01"));
        assert!(Format::Date.check("2024-02-29"));
        assert!(!Format::Date.check("2023-02-29"));
        assert!(Format::Email.check("ops@example.org"));
        assert!(!Format::Email.check("ops@localhost"));
        assert!(!Format::Email.check("a@b@c.org"));
        assert!(Format::Uri.check("https://example.org/x"));
        assert!(Format::Uri.check("urn:isbn:0451450523"));
        assert!(!Format::Uri.check("/relative/path"));
        assert!(Format::Semver.check("1.0.0-rc.1"));
        assert!(!Format::Semver.check("1.0"));
    }
}

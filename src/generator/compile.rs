//! Schema to [`GenExpr`] compilation.
//!
//! The checks run in a fixed order: `example`, type lists, `enum`, `allOf`,
//! `oneOf`/`anyOf`, then the concrete type.

use super::expr::{
    GenExpr, TextKind, MAP_ENTRY_COUNT, MAX_SAFE_INTEGER, MAX_STRING_LENGTH, STRING_LENGTH_LIMIT,
};
use super::pattern::parse_pattern;
use crate::spec::{Items, SchemaNode, SchemaType, TypeTag};
use tracing::debug;

/// Default global cap on generated array lengths
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 20;

/// Compiles normalized schemas into generator expressions
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    max_array_length: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(DEFAULT_MAX_ARRAY_LENGTH)
    }
}

fn clamp_to_safe(value: f64) -> i64 {
    let safe = MAX_SAFE_INTEGER as f64;
    value.clamp(-safe, safe) as i64
}

fn non_negative_floor(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.floor() as usize
    }
}

fn format_kind(format: &str, key: &str) -> Option<TextKind> {
    let kind = match format {
        "date-time" | "date" | "time" => TextKind::Timestamp,
        "uuid" => TextKind::Uuid,
        "email" | "idn-email" => TextKind::Email,
        "hostname" | "idn-hostname" => TextKind::Domain,
        "ipv4" => TextKind::Ipv4,
        "ipv6" => TextKind::Ipv6,
        "uri" | "uri-reference" | "iri" | "iri-reference" | "url" => {
            if ["photo", "image", "picture"].iter().any(|k| key.contains(k)) {
                TextKind::ImageUrl
            } else {
                TextKind::Url
            }
        }
        _ => return None,
    };
    Some(kind)
}

fn key_kind(key: &str) -> Option<TextKind> {
    if key.ends_with("_at") {
        return Some(TextKind::Timestamp);
    }
    if key.ends_with("id") {
        return Some(TextKind::Uuid);
    }
    [
        ("email", TextKind::Email),
        ("name", TextKind::FullName),
        ("url", TextKind::Url),
        ("street", TextKind::Street),
        ("city", TextKind::City),
        ("state", TextKind::State),
        ("zip", TextKind::ZipCode),
    ]
    .into_iter()
    .find_map(|(needle, kind)| key.contains(needle).then_some(kind))
}

impl Compiler {
    pub fn new(max_array_length: usize) -> Self {
        Compiler { max_array_length }
    }

    /// Compile a schema; `key` is the property name the value is generated for.
    pub fn compile(&self, schema: &SchemaNode, key: Option<&str>) -> GenExpr {
        if let Some(example) = &schema.example {
            return GenExpr::Literal(example.clone());
        }

        if let Some(types) = schema.type_list() {
            let branches = types
                .iter()
                .map(|tag| {
                    let mut single = schema.clone();
                    single.schema_type = Some(SchemaType::Single(*tag));
                    self.compile(&single, key)
                })
                .collect();
            return GenExpr::OneOf(branches);
        }

        if let Some(values) = &schema.enum_values {
            return GenExpr::Pick(values.clone());
        }

        if let Some(branches) = &schema.all_of {
            return self.compile(&merge_all_of(schema, branches), key);
        }

        if let Some(branches) = schema.one_of.as_ref().or(schema.any_of.as_ref()) {
            return GenExpr::OneOf(branches.iter().map(|b| self.compile(b, key)).collect());
        }

        match effective_type(schema) {
            Some(TypeTag::String) => self.compile_string(schema, key),
            Some(TypeTag::Number | TypeTag::Integer) => compile_number(schema),
            Some(TypeTag::Boolean) => GenExpr::Bool,
            Some(TypeTag::Object) => self.compile_object(schema),
            Some(TypeTag::Array) => self.compile_array(schema),
            Some(TypeTag::Null | TypeTag::Unknown) | None => {
                if !schema.is_empty() {
                    debug!(schema_type = ?schema.schema_type, "unsupported schema type; emitting null");
                }
                GenExpr::Null
            }
        }
    }

    fn compile_string(&self, schema: &SchemaNode, key: Option<&str>) -> GenExpr {
        let key = key.map(str::to_lowercase).unwrap_or_default();

        if let Some(kind) = schema.format.as_deref().and_then(|f| format_kind(f, &key)) {
            return GenExpr::Text(kind);
        }
        if let Some(kind) = key_kind(&key) {
            return GenExpr::Text(kind);
        }
        if let Some(source) = schema.pattern.as_deref().and_then(parse_pattern) {
            return GenExpr::Pattern(source);
        }
        if schema.min_length.is_some() || schema.max_length.is_some() {
            let min = schema.min_length.map_or(0.0, f64::ceil);
            let max = schema.max_length.map_or(MAX_STRING_LENGTH as f64, f64::floor);
            let min = non_negative_floor(min).min(STRING_LENGTH_LIMIT);
            let max = non_negative_floor(max).clamp(min, STRING_LENGTH_LIMIT);
            return GenExpr::Alpha { min, max };
        }
        GenExpr::Text(TextKind::Words)
    }

    fn compile_object(&self, schema: &SchemaNode) -> GenExpr {
        if let Some(props) = &schema.properties {
            return GenExpr::Object(
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), self.compile(prop, Some(name))))
                    .collect(),
            );
        }
        if let Some(extra) = schema.additional_schema() {
            return GenExpr::Map {
                entries: MAP_ENTRY_COUNT,
                value: Box::new(self.compile(extra, None)),
            };
        }
        GenExpr::Object(Vec::new())
    }

    fn compile_array(&self, schema: &SchemaNode) -> GenExpr {
        let (min, max) = self.array_bounds(schema);
        let item = match &schema.items {
            Some(Items::Single(item)) => self.compile(item, None),
            Some(Items::Tuple(items)) if !items.is_empty() => {
                GenExpr::OneOf(items.iter().map(|i| self.compile(i, None)).collect())
            }
            _ => GenExpr::Null,
        };
        GenExpr::Array {
            min,
            max,
            item: Box::new(item),
        }
    }

    /// Element count range: `minItems` (default 1) up to `maxItems` capped by
    /// the global maximum; an oversized minimum collapses onto the cap.
    pub fn array_bounds(&self, schema: &SchemaNode) -> (usize, usize) {
        let cap = schema
            .max_items
            .map_or(self.max_array_length, non_negative_floor)
            .min(self.max_array_length);
        let min = schema.min_items.map_or(1, non_negative_floor).min(cap);
        (min, cap)
    }
}

/// Declared type, or the one implied by `properties` / `items`
fn effective_type(schema: &SchemaNode) -> Option<TypeTag> {
    schema.single_type().or_else(|| {
        if schema.properties.is_some() || schema.additional_schema().is_some() {
            Some(TypeTag::Object)
        } else if schema.items.is_some() {
            Some(TypeTag::Array)
        } else {
            None
        }
    })
}

/// Integer bounds from `minimum`/`maximum`.
///
/// A lone bound keeps the runtime default for the other side (`0` and
/// `MAX_SAFE_INTEGER`) unless that default would invert the range: a negative
/// lone `maximum` gets `-MAX_SAFE_INTEGER` as its minimum.
fn compile_number(schema: &SchemaNode) -> GenExpr {
    let min = schema.minimum.map(|m| clamp_to_safe(m.ceil()));
    let max = schema.maximum.map(|m| clamp_to_safe(m.floor()));
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => GenExpr::Int { min: Some(lo), max: Some(lo) },
        (None, Some(hi)) if hi < 0 => GenExpr::Int { min: Some(-MAX_SAFE_INTEGER), max: Some(hi) },
        _ => GenExpr::Int { min, max },
    }
}

fn merge_all_of(schema: &SchemaNode, branches: &[SchemaNode]) -> SchemaNode {
    let mut merged = SchemaNode::default();
    for branch in branches {
        merged.merge_from(branch.clone());
    }
    let mut siblings = schema.clone();
    siblings.all_of = None;
    merged.merge_from(siblings);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn compile(schema: Value) -> GenExpr {
        Compiler::default().compile(&SchemaNode::from_value(&schema), None)
    }

    fn compile_key(schema: Value, key: &str) -> GenExpr {
        Compiler::default().compile(&SchemaNode::from_value(&schema), Some(key))
    }

    #[test]
    fn test_example_beats_everything() {
        let expr = compile(json!({
            "type": "string", "format": "uuid", "pattern": "^a$", "enum": ["x"], "example": "fixed"
        }));
        assert_eq!(expr, GenExpr::Literal(json!("fixed")));
    }

    #[test]
    fn test_type_list_becomes_choice() {
        let expr = compile(json!({ "type": ["string", "null"] }));
        assert_eq!(
            expr,
            GenExpr::OneOf(vec![GenExpr::Text(TextKind::Words), GenExpr::Null])
        );
    }

    #[test]
    fn test_enum_becomes_pick() {
        assert_eq!(
            compile(json!({ "type": "string", "enum": ["a", "b"] })),
            GenExpr::Pick(vec![json!("a"), json!("b")])
        );
    }

    #[test]
    fn test_all_of_is_merged_last_wins() {
        let expr = compile(json!({ "allOf": [
            { "type": "object", "properties": { "a": { "type": "integer" } } },
            { "type": "object", "properties": { "a": { "type": "boolean" } } }
        ]}));
        assert_eq!(expr, GenExpr::Object(vec![("a".into(), GenExpr::Bool)]));
    }

    #[test]
    fn test_one_of_and_any_of() {
        let expr = compile(json!({ "anyOf": [{ "type": "boolean" }, { "type": "null" }] }));
        assert_eq!(expr, GenExpr::OneOf(vec![GenExpr::Bool, GenExpr::Null]));
    }

    #[test]
    fn test_string_format_dispatch() {
        let cases = [
            ("date-time", TextKind::Timestamp),
            ("date", TextKind::Timestamp),
            ("uuid", TextKind::Uuid),
            ("email", TextKind::Email),
            ("hostname", TextKind::Domain),
            ("ipv4", TextKind::Ipv4),
            ("ipv6", TextKind::Ipv6),
            ("uri", TextKind::Url),
        ];
        for (format, kind) in cases {
            assert_eq!(
                compile(json!({ "type": "string", "format": format })),
                GenExpr::Text(kind),
                "format {format}"
            );
        }
        assert_eq!(
            compile_key(json!({ "type": "string", "format": "uri" }), "profilePhoto"),
            GenExpr::Text(TextKind::ImageUrl)
        );
    }

    #[test]
    fn test_format_wins_over_key_name() {
        assert_eq!(
            compile_key(json!({ "type": "string", "format": "email" }), "created_at"),
            GenExpr::Text(TextKind::Email)
        );
    }

    #[test]
    fn test_key_name_heuristics() {
        let cases = [
            ("created_at", TextKind::Timestamp),
            ("userId", TextKind::Uuid),
            ("contactEmail", TextKind::Email),
            ("displayName", TextKind::FullName),
            ("avatarUrl", TextKind::Url),
            ("street", TextKind::Street),
            ("City", TextKind::City),
            ("state", TextKind::State),
            ("zipCode", TextKind::ZipCode),
        ];
        for (key, kind) in cases {
            assert_eq!(
                compile_key(json!({ "type": "string" }), key),
                GenExpr::Text(kind),
                "key {key}"
            );
        }
    }

    #[test]
    fn test_pattern_then_length_then_words() {
        assert_eq!(
            compile(json!({ "type": "string", "pattern": "^[a-z]{2}$", "minLength": 1 })),
            GenExpr::Pattern("^[a-z]{2}$".into())
        );
        assert_eq!(
            compile(json!({ "type": "string", "pattern": "(?<=x)y", "minLength": 3 })),
            GenExpr::Alpha { min: 3, max: MAX_STRING_LENGTH }
        );
        assert_eq!(
            compile(json!({ "type": "string", "maxLength": 4 })),
            GenExpr::Alpha { min: 0, max: 4 }
        );
        assert_eq!(
            compile(json!({ "type": "string", "minLength": 10, "maxLength": 4 })),
            GenExpr::Alpha { min: 10, max: 10 }
        );
        assert_eq!(compile(json!({ "type": "string" })), GenExpr::Text(TextKind::Words));
    }

    #[test]
    fn test_number_bounds() {
        assert_eq!(
            compile(json!({ "type": "integer" })),
            GenExpr::Int { min: None, max: None }
        );
        assert_eq!(
            compile(json!({ "type": "number", "minimum": 1.5, "maximum": 9.5 })),
            GenExpr::Int { min: Some(2), max: Some(9) }
        );
        assert_eq!(
            compile(json!({ "type": "integer", "minimum": 10, "maximum": 3 })),
            GenExpr::Int { min: Some(10), max: Some(10) }
        );
    }

    #[test]
    fn test_one_sided_number_bounds() {
        assert_eq!(
            compile(json!({ "type": "integer", "minimum": 7 })),
            GenExpr::Int { min: Some(7), max: None }
        );
        assert_eq!(
            compile(json!({ "type": "integer", "minimum": -7 })),
            GenExpr::Int { min: Some(-7), max: None }
        );
        assert_eq!(
            compile(json!({ "type": "integer", "maximum": 5 })),
            GenExpr::Int { min: None, max: Some(5) }
        );
        assert_eq!(
            compile(json!({ "type": "integer", "maximum": -5 })),
            GenExpr::Int { min: Some(-MAX_SAFE_INTEGER), max: Some(-5) }
        );
        assert_eq!(
            compile(json!({ "type": "integer", "minimum": 1e300 })),
            GenExpr::Int { min: Some(MAX_SAFE_INTEGER), max: None }
        );
        assert_eq!(
            compile(json!({ "type": "integer", "maximum": -1e300 })),
            GenExpr::Int { min: Some(-MAX_SAFE_INTEGER), max: Some(-MAX_SAFE_INTEGER) }
        );
    }

    #[test]
    fn test_string_lengths_are_capped() {
        assert_eq!(
            compile(json!({ "type": "string", "minLength": 1e12 })),
            GenExpr::Alpha { min: STRING_LENGTH_LIMIT, max: STRING_LENGTH_LIMIT }
        );
        assert_eq!(
            compile(json!({ "type": "string", "maxLength": 1e12 })),
            GenExpr::Alpha { min: 0, max: STRING_LENGTH_LIMIT }
        );
        assert_eq!(
            compile(json!({ "type": "string", "pattern": "^a{4000000000}$", "minLength": 2 })),
            GenExpr::Alpha { min: 2, max: MAX_STRING_LENGTH }
        );
    }

    #[test]
    fn test_object_keeps_property_order() {
        let expr = compile(json!({ "type": "object", "properties": {
            "z": { "type": "boolean" }, "a": { "type": "null" }
        }}));
        assert_eq!(
            expr,
            GenExpr::Object(vec![("z".into(), GenExpr::Bool), ("a".into(), GenExpr::Null)])
        );
    }

    #[test]
    fn test_additional_properties_map() {
        let expr = compile(json!({ "type": "object", "additionalProperties": { "type": "boolean" } }));
        assert_eq!(
            expr,
            GenExpr::Map { entries: 5, value: Box::new(GenExpr::Bool) }
        );
        assert_eq!(compile(json!({ "type": "object" })), GenExpr::Object(vec![]));
    }

    #[test]
    fn test_array_bounds() {
        let c = Compiler::new(20);
        let bounds = |v: Value| c.array_bounds(&SchemaNode::from_value(&v));
        assert_eq!(bounds(json!({ "type": "array" })), (1, 20));
        assert_eq!(bounds(json!({ "type": "array", "minItems": 2, "maxItems": 5 })), (2, 5));
        assert_eq!(bounds(json!({ "type": "array", "maxItems": 500 })), (1, 20));
        assert_eq!(bounds(json!({ "type": "array", "minItems": 50 })), (20, 20));
        assert_eq!(bounds(json!({ "type": "array", "minItems": -3, "maxItems": 2.7 })), (0, 2));
        assert_eq!(bounds(json!({ "type": "array", "maxItems": 0 })), (0, 0));
    }

    #[test]
    fn test_untyped_properties_are_an_object() {
        let expr = compile(json!({ "properties": { "ok": { "type": "boolean" } } }));
        assert_eq!(expr, GenExpr::Object(vec![("ok".into(), GenExpr::Bool)]));
    }

    #[test]
    fn test_unknown_and_empty_compile_to_null() {
        assert_eq!(compile(json!({ "type": "file" })), GenExpr::Null);
        assert_eq!(compile(json!({})), GenExpr::Null);
    }
}

//! The generator expression tree shared by the compiler and both interpreters.

use serde_json::Value;

/// Largest integer JavaScript represents exactly (`Number.MAX_SAFE_INTEGER`)
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Upper length bound for bounded strings when only `minLength` is declared
pub const MAX_STRING_LENGTH: usize = 42;

/// Hard ceiling on the length of any generated string; larger declared
/// lengths are clamped and longer patterns fall back to plain text
pub const STRING_LENGTH_LIMIT: usize = 4096;

/// Number of entries generated for `additionalProperties` maps
pub const MAP_ENTRY_COUNT: usize = 5;

/// Length of generated map keys
pub const MAP_KEY_LENGTH: usize = 8;

/// Realistic-looking string families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Words,
    Uuid,
    Timestamp,
    Email,
    Domain,
    Ipv4,
    Ipv6,
    Url,
    ImageUrl,
    FullName,
    Street,
    City,
    State,
    ZipCode,
}

/// How to produce one value of a schema.
///
/// The tree says nothing about how it is executed: the JS renderer turns it
/// into faker calls evaluated per request, the evaluator computes a value
/// once for static output.
#[derive(Debug, Clone, PartialEq)]
pub enum GenExpr {
    /// A fixed value, emitted verbatim
    Literal(Value),
    /// Random choice among literals (`enum`)
    Pick(Vec<Value>),
    /// Random choice among sub-expressions (type lists, `oneOf`, `anyOf`)
    OneOf(Vec<GenExpr>),
    /// Random integer; a missing bound is left to the runtime default
    Int { min: Option<i64>, max: Option<i64> },
    Bool,
    Text(TextKind),
    /// Random letters with a length in `min..=max`
    Alpha { min: usize, max: usize },
    /// String matching a regular expression (already validated)
    Pattern(String),
    /// Object literal in declaration order
    Object(Vec<(String, GenExpr)>),
    /// Fixed number of random keys mapped to generated values
    Map { entries: usize, value: Box<GenExpr> },
    /// List with a random length in `min..=max`
    Array { min: usize, max: usize, item: Box<GenExpr> },
    /// Deferred call to the external AI collaborator with the operation description
    Ask(Value),
    Null,
}

impl GenExpr {
    /// True if any node in the tree is an external call
    pub fn contains_ask(&self) -> bool {
        match self {
            GenExpr::Ask(_) => true,
            GenExpr::OneOf(branches) => branches.iter().any(GenExpr::contains_ask),
            GenExpr::Object(fields) => fields.iter().any(|(_, e)| e.contains_ask()),
            GenExpr::Map { value, .. } => value.contains_ask(),
            GenExpr::Array { item, .. } => item.contains_ask(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains_ask_looks_through_containers() {
        let expr = GenExpr::Object(vec![(
            "items".into(),
            GenExpr::Array {
                min: 1,
                max: 2,
                item: Box::new(GenExpr::Ask(json!({}))),
            },
        )]);
        assert!(expr.contains_ask());
        assert!(!GenExpr::Text(TextKind::Words).contains_ask());
    }
}

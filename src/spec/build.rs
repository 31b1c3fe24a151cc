//! Operation extraction from the path table and conversion into the
//! emitter's [`Operation`] model.

use super::load::ApiDocument;
use super::normalize::SchemaNormalizer;
use super::resolve::{RefResolver, ResolutionStack};
use super::types::{Operation, OperationDefinition, ResponseMap, SchemaNode, OPERATION_VERBS};
use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Split an identifier into words on separators and case boundaries.
///
/// `getHTTPStatus` → `get`, `HTTP`, `Status`; `pets/{pet_id}` → `pets`, `pet`, `id`.
fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Convert arbitrary text to a camel-case identifier
///
/// ```
/// use oas_mockgen::spec::camel_case;
/// assert_eq!(camel_case("get/pets/{pet_id}"), "getPetsPetId");
/// assert_eq!(camel_case("listPets"), "listPets");
/// ```
pub fn camel_case(input: &str) -> String {
    let mut out = String::new();
    for (i, word) in split_words(input).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            out.push_str(&upper_first(&lower));
        }
    }
    out
}

/// Upper-case the first character and keep the rest as is
pub fn upper_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert an OpenAPI path to Express syntax with camel-cased parameters.
///
/// `/pets/{pet_id}` → `/pets/:petId`. An unclosed brace is copied verbatim.
pub fn to_express_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        let name = &rest[open + 1..open + close];
        out.push(':');
        out.push_str(&camel_case(name));
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

fn unique_identifier(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{name}_{counter}");
        if seen.insert(candidate.clone()) {
            warn!(identifier = %name, replacement = %candidate, "duplicate operation identifier");
            return candidate;
        }
        counter += 1;
    }
}

fn parse_verb(verb: &str) -> Option<Method> {
    Method::from_bytes(verb.to_ascii_uppercase().as_bytes()).ok()
}

/// Walk `paths` and produce one definition per (path, verb) pair.
///
/// Verbs are taken in the order they appear inside each path item; keys that
/// are not HTTP verbs (`parameters`, `summary`, extensions) are skipped. The
/// identifier is the camel-cased `operationId`, or `verb/path` when absent,
/// with a numeric suffix on collision.
pub fn extract_operation_definitions(document: &ApiDocument) -> Vec<OperationDefinition> {
    let mut definitions = Vec::new();
    let mut seen = HashSet::new();
    let Some(paths) = document.paths() else {
        warn!("document has no `paths` object; nothing to generate");
        return definitions;
    };

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (key, operation) in item {
            if !OPERATION_VERBS.contains(&key.as_str()) {
                continue;
            }
            let Some(verb) = parse_verb(key) else {
                continue;
            };
            let base = match operation.get("operationId").and_then(Value::as_str) {
                Some(id) if !id.trim().is_empty() => camel_case(id),
                _ => camel_case(&format!("{key}/{path}")),
            };
            let responses = operation
                .get("responses")
                .and_then(Value::as_object)
                .map(|r| r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            definitions.push(OperationDefinition {
                path: path.clone(),
                verb,
                id: unique_identifier(&mut seen, &base),
                responses,
            });
        }
    }
    debug!(count = definitions.len(), "extracted operation definitions");
    definitions
}

/// Name of the generated function returning one response body
pub fn response_function_name(operation_id: &str, code: &str) -> String {
    format!("get{}{}Response", upper_first(operation_id), upper_first(code))
}

/// The media-level example: `example`, else the first `examples.*.value`
fn media_example(resolver: &RefResolver<'_>, media: &Value) -> Option<Value> {
    if let Some(example) = media.get("example").filter(|v| !v.is_null()) {
        return Some(example.clone());
    }
    let examples = media.get("examples")?.as_object()?;
    examples.values().find_map(|entry| {
        let mut stack = ResolutionStack::new();
        resolver
            .resolve_object(entry, &mut stack)
            .and_then(|e| e.get("value"))
            .filter(|v| !v.is_null())
            .cloned()
    })
}

fn build_response_map(
    normalizer: &SchemaNormalizer<'_, '_>,
    resolver: &RefResolver<'_>,
    definition: &OperationDefinition,
    code: &str,
    raw: &Value,
) -> ResponseMap {
    let mut stack = ResolutionStack::new();
    let content = resolver
        .resolve_object(raw, &mut stack)
        .and_then(|response| response.get("content"))
        .and_then(Value::as_object)
        .filter(|content| !content.is_empty());

    let Some(content) = content else {
        debug!(operation = %definition.id, code = %code, "response has no content");
        return ResponseMap {
            code: code.to_string(),
            id: String::new(),
            responses: IndexMap::new(),
        };
    };

    let mut responses = IndexMap::new();
    for (media_type, media) in content {
        let mut schema = match media.get("schema") {
            Some(raw_schema) => normalizer.normalize(&SchemaNode::from_value(raw_schema)),
            None => SchemaNode::default(),
        };
        if let Some(example) = media_example(resolver, media) {
            schema.example = Some(example);
        }
        responses.insert(media_type.clone(), schema);
    }

    ResponseMap {
        code: code.to_string(),
        id: response_function_name(&definition.id, code),
        responses,
    }
}

/// Resolve every definition's responses into the emitter's operation model.
///
/// Paths are converted to Express syntax; each response's schemas are
/// resolved and normalized with a fresh resolution stack.
pub fn build_operations(document: &ApiDocument, definitions: &[OperationDefinition]) -> Vec<Operation> {
    let resolver = RefResolver::new(&document.raw);
    let normalizer = SchemaNormalizer::new(&resolver);

    let operations: Vec<Operation> = definitions
        .iter()
        .map(|definition| {
            let response = definition
                .responses
                .iter()
                .map(|(code, raw)| build_response_map(&normalizer, &resolver, definition, code, raw))
                .collect();
            Operation {
                verb: definition.verb.clone(),
                path: to_express_path(&definition.path),
                response,
            }
        })
        .collect();

    let cycles = resolver.cycles();
    if !cycles.is_empty() {
        warn!(count = cycles.len(), "circular references were cut while building operations");
    }
    operations
}

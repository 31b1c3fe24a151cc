//! The dynamic-mode interpreter: renders expressions as faker JavaScript.

use super::expr::{GenExpr, TextKind, MAP_KEY_LENGTH};
use serde_json::Value;

/// Serialises expressions to JavaScript built on `@faker-js/faker` (v8 API).
#[derive(Debug, Clone, Copy)]
pub struct JsRenderer {
    indent: usize,
}

impl Default for JsRenderer {
    fn default() -> Self {
        JsRenderer { indent: 2 }
    }
}

fn faker_call(kind: TextKind) -> &'static str {
    match kind {
        TextKind::Words => "faker.lorem.words()",
        TextKind::Uuid => "faker.string.uuid()",
        TextKind::Timestamp => "faker.date.past()",
        TextKind::Email => "faker.internet.email()",
        TextKind::Domain => "faker.internet.domainName()",
        TextKind::Ipv4 => "faker.internet.ipv4()",
        TextKind::Ipv6 => "faker.internet.ipv6()",
        TextKind::Url => "faker.internet.url()",
        TextKind::ImageUrl => "faker.image.url()",
        TextKind::FullName => "faker.person.fullName()",
        TextKind::Street => "faker.location.street()",
        TextKind::City => "faker.location.city()",
        TextKind::State => "faker.location.state()",
        TextKind::ZipCode => "faker.location.zipCode()",
    }
}

/// JSON text for a string, which is also a valid JS string literal
pub fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

impl JsRenderer {
    /// Render `expr` as a JS expression; nested lines start at `depth` levels.
    pub fn render(&self, expr: &GenExpr, depth: usize) -> String {
        let mut out = String::new();
        self.write(expr, depth, &mut out);
        out
    }

    fn pad(&self, depth: usize) -> String {
        " ".repeat(self.indent * depth)
    }

    fn write(&self, expr: &GenExpr, depth: usize, out: &mut String) {
        match expr {
            GenExpr::Literal(value) => out.push_str(&value.to_string()),
            GenExpr::Pick(values) => {
                out.push_str(&format!(
                    "faker.helpers.arrayElement({})",
                    Value::Array(values.clone())
                ));
            }
            GenExpr::OneOf(branches) => {
                out.push_str("faker.helpers.arrayElement([");
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(branch, depth, out);
                }
                out.push_str("])");
            }
            GenExpr::Int { min, max } => {
                let bounds: Vec<String> = [("min", min), ("max", max)]
                    .into_iter()
                    .filter_map(|(name, v)| v.map(|v| format!("{name}: {v}")))
                    .collect();
                if bounds.is_empty() {
                    out.push_str("faker.number.int()");
                } else {
                    out.push_str(&format!("faker.number.int({{ {} }})", bounds.join(", ")));
                }
            }
            GenExpr::Bool => out.push_str("faker.datatype.boolean()"),
            GenExpr::Text(kind) => out.push_str(faker_call(*kind)),
            GenExpr::Alpha { min, max } => {
                out.push_str(&format!(
                    "faker.string.alpha({{ length: {{ min: {min}, max: {max} }} }})"
                ));
            }
            GenExpr::Pattern(source) => {
                out.push_str(&format!("faker.helpers.fromRegExp({})", js_string(source)));
            }
            GenExpr::Object(fields) => {
                if fields.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str("{\n");
                for (key, field) in fields {
                    out.push_str(&self.pad(depth + 1));
                    out.push_str(&js_string(key));
                    out.push_str(": ");
                    self.write(field, depth + 1, out);
                    out.push_str(",\n");
                }
                out.push_str(&self.pad(depth));
                out.push('}');
            }
            GenExpr::Map { entries, value } => {
                out.push_str(&format!(
                    "Object.fromEntries(Array.from({{ length: {entries} }}, () => [faker.string.alphanumeric({MAP_KEY_LENGTH}), "
                ));
                self.write(value, depth, out);
                out.push_str("]))");
            }
            GenExpr::Array { min, max, item } => {
                out.push_str(&format!(
                    "[...new Array(faker.number.int({{ min: {min}, max: {max} }})).keys()].map((_) => ("
                ));
                self.write(item, depth, out);
                out.push_str("))");
            }
            GenExpr::Ask(operation) => {
                out.push_str(&format!("await ask({operation})"));
            }
            GenExpr::Null => out.push_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MAX_SAFE_INTEGER;
    use serde_json::json;

    fn render(expr: &GenExpr) -> String {
        JsRenderer::default().render(expr, 0)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render(&GenExpr::Bool), "faker.datatype.boolean()");
        assert_eq!(render(&GenExpr::Null), "null");
        assert_eq!(render(&GenExpr::Literal(json!({"a": [1, "x"]}))), r#"{"a":[1,"x"]}"#);
        assert_eq!(
            render(&GenExpr::Pick(vec![json!("a"), json!("b")])),
            r#"faker.helpers.arrayElement(["a","b"])"#
        );
    }

    #[test]
    fn test_int_renders_only_given_bounds() {
        assert_eq!(render(&GenExpr::Int { min: None, max: None }), "faker.number.int()");
        assert_eq!(
            render(&GenExpr::Int { min: Some(1), max: None }),
            "faker.number.int({ min: 1 })"
        );
        assert_eq!(
            render(&GenExpr::Int { min: Some(1), max: Some(5) }),
            "faker.number.int({ min: 1, max: 5 })"
        );
        assert_eq!(
            render(&GenExpr::Int { min: Some(-MAX_SAFE_INTEGER), max: Some(-5) }),
            "faker.number.int({ min: -9007199254740991, max: -5 })"
        );
    }

    #[test]
    fn test_pattern_is_quoted() {
        assert_eq!(
            render(&GenExpr::Pattern(r"^\d/x$".into())),
            r#"faker.helpers.fromRegExp("^\\d/x$")"#
        );
    }

    #[test]
    fn test_nested_object_and_array() {
        let expr = GenExpr::Object(vec![
            ("id".into(), GenExpr::Text(TextKind::Uuid)),
            (
                "tags".into(),
                GenExpr::Array { min: 1, max: 3, item: Box::new(GenExpr::Text(TextKind::Words)) },
            ),
        ]);
        assert_eq!(
            render(&expr),
            "{\n  \"id\": faker.string.uuid(),\n  \"tags\": [...new Array(faker.number.int({ min: 1, max: 3 })).keys()].map((_) => (faker.lorem.words())),\n}"
        );
    }

    #[test]
    fn test_map_and_ask() {
        assert_eq!(
            render(&GenExpr::Map { entries: 5, value: Box::new(GenExpr::Bool) }),
            "Object.fromEntries(Array.from({ length: 5 }, () => [faker.string.alphanumeric(8), faker.datatype.boolean()]))"
        );
        assert_eq!(
            render(&GenExpr::Ask(json!({"path": "/pets"}))),
            r#"await ask({"path":"/pets"})"#
        );
    }
}

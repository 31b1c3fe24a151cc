//! Schema nodes and the operation model.

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// HTTP verbs recognised as operations inside an OpenAPI path item, in document order.
pub const OPERATION_VERBS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A JSON Schema type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
    /// Any tag outside the JSON Schema vocabulary (`any`, `file`, ...)
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::Object => "object",
            TypeTag::Array => "array",
            TypeTag::Null => "null",
            TypeTag::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// The `type` keyword: either one tag or a list of tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(TypeTag),
    Multiple(Vec<TypeTag>),
}

/// The `items` keyword: a single element schema or a positional tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Single(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
}

/// The `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// A JSON-Schema-like node as it appears in an OpenAPI document.
///
/// Only the keywords the generator models are kept; everything else in the
/// document is ignored on deserialisation. `properties` keeps declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaNode {
    /// Parse a schema from a raw document fragment.
    ///
    /// Malformed keywords never abort generation: the node degrades to an
    /// empty schema and a warning is logged.
    pub fn from_value(value: &Value) -> SchemaNode {
        match serde_json::from_value::<SchemaNode>(value.clone()) {
            Ok(node) => node,
            Err(err) => {
                tracing::warn!(error = %err, "unparseable schema; using an empty schema");
                SchemaNode::default()
            }
        }
    }

    /// A node with only a `type` keyword
    pub fn of_type(tag: TypeTag) -> SchemaNode {
        SchemaNode {
            schema_type: Some(SchemaType::Single(tag)),
            ..SchemaNode::default()
        }
    }

    /// True when no keyword at all is set; this is what a broken cycle resolves to.
    pub fn is_empty(&self) -> bool {
        self == &SchemaNode::default()
    }

    /// The single concrete type tag, if the node declares exactly one
    pub fn single_type(&self) -> Option<TypeTag> {
        match &self.schema_type {
            Some(SchemaType::Single(tag)) => Some(*tag),
            Some(SchemaType::Multiple(tags)) if tags.len() == 1 => tags.first().copied(),
            _ => None,
        }
    }

    /// The declared type list when `type` is given as more than one tag
    pub fn type_list(&self) -> Option<&[TypeTag]> {
        match &self.schema_type {
            Some(SchemaType::Multiple(tags)) if tags.len() > 1 => Some(tags.as_slice()),
            _ => None,
        }
    }

    /// The schema to use for additional properties, if one is declared
    pub fn additional_schema(&self) -> Option<&SchemaNode> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Overlay `other` onto `self` with last-wins semantics.
    ///
    /// Scalar keywords set on `other` replace those on `self`; `properties`
    /// are merged key by key so a property declared in both takes the later
    /// schema while keeping its first position.
    pub fn merge_from(&mut self, other: SchemaNode) {
        let SchemaNode {
            reference,
            schema_type,
            format,
            enum_values,
            properties,
            items,
            additional_properties,
            all_of,
            one_of,
            any_of,
            min_items,
            max_items,
            min_length,
            max_length,
            minimum,
            maximum,
            pattern,
            example,
            nullable,
            title,
            description,
        } = other;

        macro_rules! overlay {
            ($($field:ident),*) => {
                $( if $field.is_some() { self.$field = $field; } )*
            };
        }
        overlay!(
            reference,
            schema_type,
            format,
            enum_values,
            items,
            additional_properties,
            all_of,
            one_of,
            any_of,
            min_items,
            max_items,
            min_length,
            max_length,
            minimum,
            maximum,
            pattern,
            example,
            nullable,
            title,
            description
        );

        if let Some(props) = properties {
            let target = self.properties.get_or_insert_with(IndexMap::new);
            for (name, schema) in props {
                target.insert(name, schema);
            }
        }
    }
}

/// One (path, verb) pair from the document before schema resolution
#[derive(Debug, Clone)]
pub struct OperationDefinition {
    /// Path in OpenAPI brace syntax (`/pets/{id}`)
    pub path: String,
    pub verb: Method,
    /// Stable camel-case identifier
    pub id: String,
    /// Status code → raw response object, in document order
    pub responses: IndexMap<String, Value>,
}

/// The resolved content of one declared status code
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMap {
    pub code: String,
    /// Name of the generated body function; empty when the response has no body
    pub id: String,
    /// Media type → normalized schema
    pub responses: IndexMap<String, SchemaNode>,
}

impl ResponseMap {
    /// True when the response carries no usable content
    pub fn is_empty_body(&self) -> bool {
        self.id.is_empty()
    }

    /// The schema used for the generated body.
    ///
    /// `application/json` wins, then any `+json` / `json` media type, then the
    /// first declared one.
    pub fn body_schema(&self) -> Option<(&str, &SchemaNode)> {
        self.responses
            .get_key_value("application/json")
            .or_else(|| self.responses.iter().find(|(mt, _)| mt.contains("json")))
            .or_else(|| self.responses.first())
            .map(|(mt, schema)| (mt.as_str(), schema))
    }

    /// The numeric status emitted for this response.
    ///
    /// `default` maps to 200 and `2XX`..`5XX` wildcards to `N00`. A fetch
    /// `Response` only accepts `200..=599`; anything else falls back to 200.
    pub fn status(&self) -> u16 {
        if let Ok(code) = self.code.parse::<u16>() {
            return if (200..=599).contains(&code) { code } else { 200 };
        }
        match self.code.as_bytes() {
            [class @ b'2'..=b'5', x, y]
                if x.eq_ignore_ascii_case(&b'x') && y.eq_ignore_ascii_case(&b'x') =>
            {
                u16::from(class - b'0') * 100
            }
            _ => 200,
        }
    }
}

/// The unit consumed by the handler emitter
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub verb: Method,
    /// Express-style path (`/pets/:id`)
    pub path: String,
    pub response: Vec<ResponseMap>,
}

impl Operation {
    /// Lower-case verb as used by the interception library (`get`, `post`, ...)
    pub fn verb_name(&self) -> String {
        self.verb.as_str().to_ascii_lowercase()
    }

    /// Stable per-route key used by the rotation counter (`get /pets/:id`)
    pub fn route_key(&self) -> String {
        format!("{} {}", self.verb_name(), self.path)
    }
}

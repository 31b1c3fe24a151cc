//! Handler emission: route ordering, per-route outcome rotation and the
//! per-response body functions.

use super::compile::Compiler;
use super::eval::Evaluator;
use super::expr::{GenExpr, MAX_SAFE_INTEGER};
use super::render::JsRenderer;
use crate::spec::{Operation, ResponseMap};
use http::Method;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn is_dynamic(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('{') || segment == "*"
}

fn dynamic_count(path: &str) -> usize {
    segments(path).filter(|s| is_dynamic(s)).count()
}

/// Path with every dynamic segment replaced by `:`
fn normalized_path(path: &str) -> String {
    let parts: Vec<&str> = segments(path)
        .map(|s| if is_dynamic(s) { ":" } else { s })
        .collect();
    format!("/{}", parts.join("/"))
}

/// Total order used for "first match wins" routing.
///
/// Fewer dynamic segments first, then more segments, then verb, then the
/// normalized path; the raw path breaks any remaining tie.
pub fn compare_operations(a: &Operation, b: &Operation) -> Ordering {
    dynamic_count(&a.path)
        .cmp(&dynamic_count(&b.path))
        .then_with(|| segments(&b.path).count().cmp(&segments(&a.path).count()))
        .then_with(|| a.verb_name().cmp(&b.verb_name()))
        .then_with(|| normalized_path(&a.path).cmp(&normalized_path(&b.path)))
        .then_with(|| a.path.cmp(&b.path))
}

pub fn sort_operations(operations: &mut [Operation]) {
    operations.sort_by(compare_operations);
}

/// In-process model of the rotation counter emitted into the handlers module.
///
/// `next` returns the current count for a route and then increments it,
/// wrapping to 0 at `Number.MAX_SAFE_INTEGER`.
#[derive(Debug, Default, Clone)]
pub struct RotationCounter {
    counters: HashMap<String, i64>,
}

impl RotationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `key` at an arbitrary count
    pub fn with_start(mut self, key: &str, start: i64) -> Self {
        self.counters.insert(key.to_string(), start);
        self
    }

    pub fn next(&mut self, key: &str) -> i64 {
        let slot = self.counters.entry(key.to_string()).or_insert(0);
        let current = *slot;
        *slot = if current >= MAX_SAFE_INTEGER { 0 } else { current + 1 };
        current
    }

    /// Index of the outcome served for the next call on `key`
    pub fn select(&mut self, key: &str, outcomes: usize) -> Option<usize> {
        if outcomes == 0 {
            return None;
        }
        let count = usize::try_from(self.next(key)).unwrap_or_default();
        Some(count % outcomes)
    }
}

/// Flags that change what the emitted bodies do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Bake bodies once at generation time
    pub static_mode: bool,
    /// Delegate bodies to the AI collaborator
    pub ai: bool,
    /// Merge JSON request bodies into JSON responses for POST/PUT/PATCH
    pub echo_request_body: bool,
    /// Seed for baking; random when absent
    pub seed: Option<u64>,
}

/// One (status, body) pair a handler can serve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: u16,
    /// Body function name; `None` serves an empty body
    pub body_fn: Option<String>,
}

/// One route handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerEntry {
    pub verb: String,
    pub path: String,
    pub route_key: String,
    pub outcomes: Vec<Outcome>,
    pub echo_body: bool,
}

/// A generated function returning one response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFunction {
    pub name: String,
    /// JavaScript expression returned by the function
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedHandlers {
    pub handlers: Vec<HandlerEntry>,
    pub functions: Vec<ResponseFunction>,
}

fn echoes(verb: &Method) -> bool {
    *verb == Method::POST || *verb == Method::PUT || *verb == Method::PATCH
}

/// Builds handler entries and body functions from operations
pub struct HandlerEmitter {
    compiler: Compiler,
    renderer: JsRenderer,
    options: EmitOptions,
    evaluator: Evaluator<StdRng>,
}

impl HandlerEmitter {
    pub fn new(compiler: Compiler, options: EmitOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        HandlerEmitter {
            compiler,
            renderer: JsRenderer::default(),
            options,
            evaluator: Evaluator::new(rng),
        }
    }

    /// Order `operations` and emit one handler per operation plus one body
    /// function per response that has content.
    pub fn emit(&mut self, mut operations: Vec<Operation>) -> EmittedHandlers {
        sort_operations(&mut operations);
        let mut emitted = EmittedHandlers::default();

        for operation in &operations {
            let mut outcomes = Vec::with_capacity(operation.response.len());
            for response in &operation.response {
                let status = response.status();
                if status == 204 || response.is_empty_body() {
                    outcomes.push(Outcome { status, body_fn: None });
                    continue;
                }
                let expr = self.body_expression(operation, response);
                emitted.functions.push(ResponseFunction {
                    name: response.id.clone(),
                    body: self.renderer.render(&expr, 1),
                });
                outcomes.push(Outcome {
                    status,
                    body_fn: Some(response.id.clone()),
                });
            }
            debug!(route = %operation.route_key(), outcomes = outcomes.len(), "emitted handler");
            emitted.handlers.push(HandlerEntry {
                verb: operation.verb_name(),
                path: operation.path.clone(),
                route_key: operation.route_key(),
                outcomes,
                echo_body: self.options.echo_request_body && echoes(&operation.verb),
            });
        }
        emitted
    }

    fn body_expression(&mut self, operation: &Operation, response: &ResponseMap) -> GenExpr {
        let expr = if self.options.ai {
            GenExpr::Ask(ask_payload(operation, response))
        } else {
            match response.body_schema() {
                Some((_, schema)) => self.compiler.compile(schema, None),
                None => GenExpr::Null,
            }
        };
        if self.options.static_mode {
            self.evaluator.bake(&expr)
        } else {
            expr
        }
    }
}

/// The operation description handed to `ask`
fn ask_payload(operation: &Operation, response: &ResponseMap) -> Value {
    let (media_type, schema) = match response.body_schema() {
        Some((mt, schema)) => (
            Value::String(mt.to_string()),
            serde_json::to_value(schema).unwrap_or(Value::Null),
        ),
        None => (Value::Null, Value::Null),
    };
    json!({
        "verb": operation.verb_name(),
        "path": operation.path,
        "code": response.code,
        "mediaType": media_type,
        "schema": schema,
    })
}

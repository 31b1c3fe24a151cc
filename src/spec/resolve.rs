//! `$ref` resolution with cycle breaking.
//!
//! Resolution is a depth-first walk. Every reference being followed is pushed
//! onto a [`ResolutionStack`] through a [`StackFrame`] guard; dropping the guard
//! pops it again, so the stack returns to its previous length on every exit path
//! and sibling branches that share a reference never see a false cycle.

use super::types::SchemaNode;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// Ordered set of reference identifiers currently being resolved
#[derive(Debug, Default)]
pub struct ResolutionStack {
    refs: Vec<String>,
}

impl ResolutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Push `reference` for the lifetime of the returned frame.
    ///
    /// # Errors
    ///
    /// Returns the cycle path (from the first occurrence of `reference` to the
    /// repeated one) without touching the stack if `reference` is already in flight.
    pub fn enter(&mut self, reference: &str) -> Result<StackFrame<'_>, CyclePath> {
        if let Some(start) = self.refs.iter().position(|r| r == reference) {
            let mut path: Vec<String> = self.refs[start..].to_vec();
            path.push(reference.to_string());
            return Err(CyclePath(path));
        }
        self.refs.push(reference.to_string());
        Ok(StackFrame { stack: self })
    }
}

/// Guard for one pushed reference; pops it on drop
#[derive(Debug)]
pub struct StackFrame<'s> {
    stack: &'s mut ResolutionStack,
}

impl Deref for StackFrame<'_> {
    type Target = ResolutionStack;

    fn deref(&self) -> &ResolutionStack {
        self.stack
    }
}

impl DerefMut for StackFrame<'_> {
    fn deref_mut(&mut self) -> &mut ResolutionStack {
        self.stack
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.refs.pop();
    }
}

/// The chain of references that closed a cycle, e.g. `A -> B -> A`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(pub Vec<String>);

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Resolves local `$ref` pointers against one document.
///
/// Non-memoizing: the same reference reached from two independent branches is
/// resolved twice. Cycles found along the way are recorded and can be read back
/// with [`RefResolver::cycles`].
#[derive(Debug)]
pub struct RefResolver<'a> {
    document: &'a Value,
    cycles: RefCell<Vec<CyclePath>>,
}

impl<'a> RefResolver<'a> {
    pub fn new(document: &'a Value) -> Self {
        RefResolver {
            document,
            cycles: RefCell::new(Vec::new()),
        }
    }

    /// Every cycle detected so far, in detection order
    pub fn cycles(&self) -> Vec<CyclePath> {
        self.cycles.borrow().clone()
    }

    /// Look up the raw document fragment a local reference points at
    pub fn lookup_raw(&self, reference: &str) -> Option<&'a Value> {
        let pointer = reference.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(self.document);
        }
        self.document.pointer(pointer)
    }

    /// Resolve a schema node to a concrete (non-`$ref`) node.
    ///
    /// Reference chains are followed; a reference already on `stack` yields an
    /// empty node and a warning with the cycle path. Keywords written next to a
    /// `$ref` are laid over the target, so a sibling `example` still wins.
    pub fn resolve(&self, node: &SchemaNode, stack: &mut ResolutionStack) -> SchemaNode {
        self.resolve_with(node, stack, |concrete, _| concrete.clone())
    }

    /// Resolve `node` and run `then` on the concrete schema while every
    /// reference on the way is still held on the stack.
    ///
    /// This is how callers walk the subtree under a reference: anything reached
    /// from inside `then` that points back at an in-flight reference is a cycle.
    pub fn resolve_with<F>(&self, node: &SchemaNode, stack: &mut ResolutionStack, then: F) -> SchemaNode
    where
        F: FnOnce(&SchemaNode, &mut ResolutionStack) -> SchemaNode,
    {
        let Some(reference) = node.reference.as_deref() else {
            return then(node, stack);
        };

        let mut frame = match stack.enter(reference) {
            Ok(frame) => frame,
            Err(cycle) => {
                warn!(cycle = %cycle, "circular $ref detected; substituting an empty schema");
                self.cycles.borrow_mut().push(cycle);
                return SchemaNode::default();
            }
        };

        let Some(raw) = self.lookup_raw(reference) else {
            warn!(reference = %reference, "unresolvable $ref; substituting an empty schema");
            return SchemaNode::default();
        };
        debug!(reference = %reference, depth = frame.len(), "resolving $ref");

        let mut target = SchemaNode::from_value(raw);
        let mut siblings = node.clone();
        siblings.reference = None;
        target.merge_from(siblings);
        self.resolve_with(&target, &mut frame, then)
    }

    /// Resolve a raw JSON object that may be a `$ref` (response objects,
    /// parameters, ...) to the concrete object it points at.
    ///
    /// Returns `None` on a cycle or a dangling pointer.
    pub fn resolve_object(&self, value: &'a Value, stack: &mut ResolutionStack) -> Option<&'a Value> {
        let Some(reference) = value.get("$ref").and_then(Value::as_str) else {
            return Some(value);
        };
        let mut frame = match stack.enter(reference) {
            Ok(frame) => frame,
            Err(cycle) => {
                warn!(cycle = %cycle, "circular $ref detected in response object");
                self.cycles.borrow_mut().push(cycle);
                return None;
            }
        };
        let Some(target) = self.lookup_raw(reference) else {
            warn!(reference = %reference, "unresolvable response $ref");
            return None;
        };
        self.resolve_object(target, &mut frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::types::TypeTag;
    use serde_json::json;

    fn node_ref(target: &str) -> SchemaNode {
        SchemaNode {
            reference: Some(target.to_string()),
            ..SchemaNode::default()
        }
    }

    #[test]
    fn test_frame_pops_on_drop() {
        let mut stack = ResolutionStack::new();
        {
            let mut frame = stack.enter("#/a").unwrap();
            assert_eq!(frame.len(), 1);
            {
                let inner = frame.enter("#/b").unwrap();
                assert_eq!(inner.len(), 2);
            }
            assert_eq!(frame.len(), 1);
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_enter_reports_cycle_from_first_occurrence() {
        let mut stack = ResolutionStack::new();
        let mut a = stack.enter("#/x").unwrap();
        let mut b = a.enter("#/a").unwrap();
        let mut c = b.enter("#/b").unwrap();
        let cycle = c.enter("#/a").unwrap_err();
        assert_eq!(cycle.to_string(), "#/a -> #/b -> #/a");
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_resolve_follows_reference_chains() {
        let doc = json!({
            "components": { "schemas": {
                "Alias": { "$ref": "#/components/schemas/Pet" },
                "Pet": { "type": "object", "description": "Pet" }
            }}
        });
        let resolver = RefResolver::new(&doc);
        let mut stack = ResolutionStack::new();
        let resolved = resolver.resolve(&node_ref("#/components/schemas/Alias"), &mut stack);
        assert_eq!(resolved.single_type(), Some(TypeTag::Object));
        assert_eq!(resolved.description.as_deref(), Some("Pet"));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_sibling_keywords_override_the_target() {
        let doc = json!({
            "components": { "schemas": {
                "Alias": { "$ref": "#/components/schemas/Pet", "description": "Alias" },
                "Pet": { "type": "object", "description": "Pet", "example": { "id": 1 } }
            }}
        });
        let resolver = RefResolver::new(&doc);
        let mut stack = ResolutionStack::new();
        let node = SchemaNode::from_value(&json!({
            "$ref": "#/components/schemas/Alias",
            "example": { "id": 7 }
        }));
        let resolved = resolver.resolve(&node, &mut stack);
        assert_eq!(resolved.single_type(), Some(TypeTag::Object));
        assert_eq!(resolved.example, Some(json!({ "id": 7 })));
        assert_eq!(resolved.description.as_deref(), Some("Alias"));
        assert!(resolved.reference.is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_self_reference_terminates_with_empty_node() {
        let doc = json!({
            "components": { "schemas": {
                "Loop": { "$ref": "#/components/schemas/Loop" }
            }}
        });
        let resolver = RefResolver::new(&doc);
        let mut stack = ResolutionStack::new();
        let resolved = resolver.resolve(&node_ref("#/components/schemas/Loop"), &mut stack);
        assert!(resolved.is_empty());
        assert!(stack.is_empty());
        assert_eq!(
            resolver.cycles(),
            vec![CyclePath(vec![
                "#/components/schemas/Loop".to_string(),
                "#/components/schemas/Loop".to_string()
            ])]
        );
    }

    #[test]
    fn test_dangling_reference_is_empty_and_pops() {
        let doc = json!({});
        let resolver = RefResolver::new(&doc);
        let mut stack = ResolutionStack::new();
        let resolved = resolver.resolve(&node_ref("#/components/schemas/Nope"), &mut stack);
        assert!(resolved.is_empty());
        assert!(stack.is_empty());
        assert!(resolver.cycles().is_empty());
    }

    #[test]
    fn test_external_reference_is_not_followed() {
        let doc = json!({});
        let resolver = RefResolver::new(&doc);
        assert!(resolver.lookup_raw("other.yaml#/Pet").is_none());
    }

    #[test]
    fn test_resolve_object_follows_response_refs() {
        let doc = json!({
            "paths": { "/pets": { "get": { "responses": {
                "404": { "$ref": "#/components/responses/NotFound" }
            }}}},
            "components": { "responses": {
                "NotFound": { "$ref": "#/components/responses/Missing" },
                "Missing": { "description": "missing" }
            }}
        });
        let resolver = RefResolver::new(&doc);
        let mut stack = ResolutionStack::new();
        let response = doc.pointer("/paths/~1pets/get/responses/404").unwrap();
        let resolved = resolver.resolve_object(response, &mut stack).unwrap();
        assert_eq!(resolved.get("description"), Some(&json!("missing")));
        assert!(stack.is_empty());
    }
}

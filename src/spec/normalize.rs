//! Recursive schema normalization over resolved references.

use super::resolve::{RefResolver, ResolutionStack};
use super::types::{AdditionalProperties, Items, SchemaNode, SchemaType, TypeTag};

/// Expands a schema into a fully resolved tree.
///
/// Walks depth-first: references are resolved on the way down, `allOf` is
/// merged (last branch wins on conflicting keywords), `oneOf`/`anyOf` branches,
/// array items, properties and schema-typed `additionalProperties` are
/// normalized in place.
pub struct SchemaNormalizer<'r, 'a> {
    resolver: &'r RefResolver<'a>,
}

impl<'r, 'a> SchemaNormalizer<'r, 'a> {
    pub fn new(resolver: &'r RefResolver<'a>) -> Self {
        SchemaNormalizer { resolver }
    }

    /// Normalize one top-level schema with a fresh resolution stack
    pub fn normalize(&self, schema: &SchemaNode) -> SchemaNode {
        let mut stack = ResolutionStack::new();
        let normalized = self.normalize_in(schema, &mut stack);
        debug_assert!(stack.is_empty(), "resolution stack leaked frames");
        normalized
    }

    fn normalize_in(&self, schema: &SchemaNode, stack: &mut ResolutionStack) -> SchemaNode {
        self.resolver
            .resolve_with(schema, stack, |node, stack| self.normalize_node(node, stack))
    }

    fn normalize_node(&self, node: &SchemaNode, stack: &mut ResolutionStack) -> SchemaNode {
        let mut node = node.clone();

        if let Some(branches) = node.all_of.take() {
            return self.merge_all_of(node, &branches, stack);
        }

        if let Some(branches) = node.one_of.take() {
            node.one_of = Some(self.normalize_all(&branches, stack));
        }
        if let Some(branches) = node.any_of.take() {
            node.any_of = Some(self.normalize_all(&branches, stack));
        }

        match node.items.take() {
            Some(Items::Single(item)) => {
                node.items = Some(Items::Single(Box::new(self.normalize_in(&item, stack))));
            }
            Some(Items::Tuple(items)) => {
                node.items = Some(Items::Tuple(self.normalize_all(&items, stack)));
            }
            None => {}
        }

        match node.properties.take() {
            Some(props) => {
                let resolved = props
                    .iter()
                    .map(|(name, prop)| (name.clone(), self.normalize_in(prop, stack)))
                    .collect();
                node.properties = Some(resolved);
            }
            None => {
                if let Some(AdditionalProperties::Schema(extra)) = node.additional_properties.take() {
                    node.additional_properties = Some(AdditionalProperties::Schema(Box::new(
                        self.normalize_in(&extra, stack),
                    )));
                }
            }
        }

        apply_nullable(&mut node);
        node
    }

    fn normalize_all(&self, schemas: &[SchemaNode], stack: &mut ResolutionStack) -> Vec<SchemaNode> {
        schemas.iter().map(|s| self.normalize_in(s, stack)).collect()
    }

    /// Merge `allOf` branches in declaration order, then the node's own
    /// sibling keywords, and normalize the result.
    fn merge_all_of(
        &self,
        siblings: SchemaNode,
        branches: &[SchemaNode],
        stack: &mut ResolutionStack,
    ) -> SchemaNode {
        let mut merged = SchemaNode::default();
        for branch in branches {
            merged.merge_from(self.normalize_in(branch, stack));
        }
        merged.merge_from(siblings);
        if merged.schema_type.is_none() && merged.properties.is_some() {
            merged.schema_type = Some(SchemaType::Single(TypeTag::Object));
        }
        self.normalize_node(&merged, stack)
    }
}

/// OpenAPI 3.0 `nullable: true` becomes a `null` entry in the type list.
fn apply_nullable(node: &mut SchemaNode) {
    if node.nullable != Some(true) {
        return;
    }
    node.nullable = None;
    node.schema_type = match node.schema_type.take() {
        Some(SchemaType::Single(TypeTag::Null)) => Some(SchemaType::Single(TypeTag::Null)),
        Some(SchemaType::Single(tag)) => Some(SchemaType::Multiple(vec![tag, TypeTag::Null])),
        Some(SchemaType::Multiple(mut tags)) => {
            if !tags.contains(&TypeTag::Null) {
                tags.push(TypeTag::Null);
            }
            Some(SchemaType::Multiple(tags))
        }
        None => None,
    };
}

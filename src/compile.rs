//! Recursive schema compiler: type graph → `SchemaNode`.
//!
//! The walk mirrors the source structure one-to-one except for two
//! policies:
//! - Cycle guard: the set of type names on the active recursion path is
//!   threaded through the walk; re-entering one of them emits a bounded
//!   `Reference` placeholder instead of recursing.
//! - Degradation: a provider error while describing a type degrades
//!   that branch alone to a permissive string schema. Siblings and the
//!   rest of the document are untouched.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ir::SchemaNode;
use crate::mapper;
use crate::typegraph::{TypeGraph, TypeRef};

/// Compile one (possibly absent) type reference. Absent references
/// compile to an empty object schema. Never fails; see the degradation
/// policy above.
pub fn compile(graph: &dyn TypeGraph, ty: Option<&TypeRef>) -> SchemaNode {
    let mut on_path = HashSet::new();
    compile_node(graph, ty, &mut on_path)
}

fn compile_node(
    graph: &dyn TypeGraph,
    ty: Option<&TypeRef>,
    on_path: &mut HashSet<String>,
) -> SchemaNode {
    let Some(ty) = ty else {
        return SchemaNode::empty_object();
    };

    if on_path.contains(ty.name()) {
        return SchemaNode::Reference { name: ty.name().to_owned() };
    }

    let (elements, attributes) = match (graph.elements(ty), graph.attributes(ty)) {
        (Ok(elements), Ok(attributes)) => (elements, attributes),
        (Err(err), _) | (_, Err(err)) => {
            tracing::debug!(ty = ty.name(), %err, "degrading unclassifiable type to string");
            return SchemaNode::string();
        }
    };

    // Pure primitive: nothing nested, classify by declared name.
    if elements.is_empty() && attributes.is_empty() {
        return mapper::map_primitive(ty.name());
    }

    on_path.insert(ty.name().to_owned());

    let mut properties = IndexMap::new();
    let mut required = Vec::new();

    // Attributes first; a same-named element below overwrites its slot
    // (last write wins).
    for attr in &attributes {
        properties.insert(attr.name.clone(), mapper::map_primitive(attr.ty.name()));
    }

    for element in &elements {
        let child = compile_node(graph, Some(&element.ty), on_path);
        let child = if element.is_repeated() {
            SchemaNode::Array { items: Box::new(child) }
        } else {
            child
        };
        properties.insert(element.name.clone(), child);

        if element.min_occurs > 0 && !required.contains(&element.name) {
            required.push(element.name.clone());
        }
    }

    // Attribute-bearing leaf: keep a slot for the element's text content.
    if !attributes.is_empty() && elements.is_empty() {
        properties.insert("_value".to_string(), SchemaNode::string());
    }

    on_path.remove(ty.name());

    SchemaNode::Object { properties, required }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

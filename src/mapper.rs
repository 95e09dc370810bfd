//! XSD primitive name → JSON Schema primitive.
//!
//! Matching is case-insensitive substring containment over the declared
//! type name (so `xs:int`, `tns:OrderInt`, `unsignedLong` all land on
//! integer). Because the keyword families overlap, order matters:
//! integer and numeric families first, datetime before the plain-string
//! fallback.

use crate::ir::{JsonType, SchemaNode};

const INTEGER_KEYWORDS: &[&str] = &["int", "long", "short", "integer"];
const NUMBER_KEYWORDS: &[&str] = &["decimal", "float", "double", "number"];

/// Total: every name maps to some primitive, unrecognized ones to a
/// plain string.
pub fn map_primitive(type_name: &str) -> SchemaNode {
    let t = type_name.to_ascii_lowercase();

    if INTEGER_KEYWORDS.iter().any(|k| t.contains(k)) {
        return SchemaNode::primitive(JsonType::Integer);
    }
    if NUMBER_KEYWORDS.iter().any(|k| t.contains(k)) {
        return SchemaNode::primitive(JsonType::Number);
    }
    if t.contains("boolean") {
        return SchemaNode::primitive(JsonType::Boolean);
    }
    if t.contains("datetime") || t.contains("date") {
        return SchemaNode::Primitive {
            json_type: JsonType::String,
            format: Some("date-time".to_string()),
        };
    }
    SchemaNode::string()
}

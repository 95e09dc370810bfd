//! Strongly-typed schema IR plus its canonical JSON text form.
//!
//! The compiler produces `SchemaNode` trees, the editor round-trips them
//! through text, and the assembler embeds them into the final document.
//! Render → parse must reproduce an equivalent node, so both sides agree
//! on one representation.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// `$ref` target prefix used for cycle placeholders.
pub const REF_PREFIX: &str = "#/components/schemas/";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// The JSON Schema primitive kinds we emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(JsonType::String),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "boolean" => Some(JsonType::Boolean),
            _ => None,
        }
    }
}

/// A finite JSON-Schema-shaped tree. Immutable once built; edits replace
/// a stored node wholesale, never patch it in place.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Primitive {
        json_type: JsonType,
        format: Option<String>,
    },
    Object {
        /// Property order follows source declaration order.
        properties: IndexMap<String, SchemaNode>,
        required: Vec<String>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    /// Bounded placeholder emitted where the compiler re-enters a type
    /// already on the active recursion path.
    Reference {
        name: String,
    },
}

/// Why a submitted schema text was rejected. The previously stored node
/// stays in place whenever one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum SchemaParseError {
    #[error("at {path}: {message}")]
    Json { path: String, message: String },
    #[error("at {path}: a schema needs a \"type\" or \"$ref\"")]
    MissingType { path: String },
    #[error("at {path}: array schema without \"items\"")]
    MissingItems { path: String },
    #[error("at {path}: unsupported schema type `{ty}`")]
    UnsupportedType { path: String, ty: String },
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn primitive(json_type: JsonType) -> Self {
        SchemaNode::Primitive { json_type, format: None }
    }

    /// Permissive plain string, also the degradation target.
    pub fn string() -> Self {
        Self::primitive(JsonType::String)
    }

    /// `{"type": "object", "properties": {}}`
    pub fn empty_object() -> Self {
        SchemaNode::Object { properties: IndexMap::new(), required: Vec::new() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RENDER
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn to_value(&self) -> Value {
        match self {
            SchemaNode::Primitive { json_type, format } => {
                let mut o = json!({ "type": json_type.as_str() });
                if let Some(f) = format {
                    o["format"] = Value::from(f.clone());
                }
                o
            }

            SchemaNode::Object { properties, required } => {
                let mut props = Map::new();
                for (name, child) in properties {
                    props.insert(name.clone(), child.to_value());
                }
                let mut o = Map::new();
                o.insert("type".into(), Value::from("object"));
                o.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    o.insert(
                        "required".into(),
                        Value::Array(required.iter().cloned().map(Value::from).collect()),
                    );
                }
                Value::Object(o)
            }

            SchemaNode::Array { items } => json!({
                "type": "array",
                "items": items.to_value(),
            }),

            SchemaNode::Reference { name } => json!({
                "$ref": format!("{REF_PREFIX}{name}"),
            }),
        }
    }

    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).expect("a JSON value always renders")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSE
// ————————————————————————————————————————————————————————————————————————————

/// Serde-level view of one schema object. Converted into `SchemaNode`
/// with structural checks after deserialization.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    json_type: Option<String>,
    properties: Option<IndexMap<String, RawSchema>>,
    required: Option<Vec<String>>,
    items: Option<Box<RawSchema>>,
    format: Option<String>,
    /// Tolerated on input, not part of the IR.
    #[serde(rename = "description")]
    _description: Option<String>,
}

impl SchemaNode {
    /// Parse the canonical text form back into a node. Total failure:
    /// either the whole text parses or an error naming the offending
    /// JSON path is returned.
    pub fn parse(src: &str) -> Result<Self, SchemaParseError> {
        let de = &mut serde_json::Deserializer::from_str(src);
        let raw: RawSchema =
            serde_path_to_error::deserialize(de).map_err(|err| SchemaParseError::Json {
                path: err.path().to_string(),
                message: err.into_inner().to_string(),
            })?;
        raw.into_node("$")
    }
}

impl RawSchema {
    fn into_node(self, path: &str) -> Result<SchemaNode, SchemaParseError> {
        if let Some(target) = self.reference {
            let name = target.strip_prefix(REF_PREFIX).unwrap_or(&target).to_owned();
            return Ok(SchemaNode::Reference { name });
        }

        let Some(ty) = self.json_type else {
            return Err(SchemaParseError::MissingType { path: path.to_owned() });
        };

        match ty.as_str() {
            "object" => {
                let mut properties = IndexMap::new();
                for (name, raw) in self.properties.unwrap_or_default() {
                    let child_path = format!("{path}.properties.{name}");
                    let child = raw.into_node(&child_path)?;
                    properties.insert(name, child);
                }
                Ok(SchemaNode::Object {
                    properties,
                    required: self.required.unwrap_or_default(),
                })
            }

            "array" => {
                let raw_items = self.items.ok_or_else(|| SchemaParseError::MissingItems {
                    path: path.to_owned(),
                })?;
                let items = raw_items.into_node(&format!("{path}.items"))?;
                Ok(SchemaNode::Array { items: Box::new(items) })
            }

            other => match JsonType::from_name(other) {
                Some(json_type) => Ok(SchemaNode::Primitive { json_type, format: self.format }),
                None => Err(SchemaParseError::UnsupportedType {
                    path: path.to_owned(),
                    ty: other.to_owned(),
                }),
            },
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

//! Narrow capability interface over the external type graph.
//!
//! The real WSDL/XSD parser stays behind `TypeGraph`/`ServiceModel`;
//! the compiler only ever asks "list child elements" and "list
//! attributes" of a named type, so any concrete provider can be swapped
//! in without touching it. `InMemoryModel` is the serde-backed provider
//! used by the CLI and the tests.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A named reference into the type graph. The declared name is also the
/// type's identity for cycle detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        TypeRef(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Declared maximum occurrence of an element: a finite count or
/// `unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurs {
    Bounded(u64),
    Unbounded,
}

/// One child element of a complex type, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default = "default_occurs")]
    pub min_occurs: u64,
    #[serde(default = "default_max_occurs")]
    pub max_occurs: Occurs,
}

impl ElementDecl {
    /// Repeatable elements compile to array schemas.
    pub fn is_repeated(&self) -> bool {
        match self.max_occurs {
            Occurs::Unbounded => true,
            Occurs::Bounded(n) => n > 1,
        }
    }
}

/// One attribute of a complex type, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// One operation discovered in the service description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDecl {
    pub name: String,
    /// Owning service group, becomes the record's tag.
    pub service: String,
    #[serde(default)]
    pub request: Option<TypeRef>,
    #[serde(default)]
    pub response: Option<TypeRef>,
}

/// Provider-side failure while describing a single type. The compiler
/// degrades the affected branch, never the whole document.
#[derive(Debug, thiserror::Error)]
pub enum TypeGraphError {
    #[error("malformed type `{0}`")]
    Malformed(String),
}

/// Read-only view over the type graph.
pub trait TypeGraph {
    /// Child elements of `ty`, in declaration order. Builtin or
    /// otherwise element-free names answer with an empty list.
    fn elements(&self, ty: &TypeRef) -> Result<Vec<ElementDecl>, TypeGraphError>;

    /// Attributes of `ty`, in declaration order.
    fn attributes(&self, ty: &TypeRef) -> Result<Vec<AttributeDecl>, TypeGraphError>;
}

/// A full service description: the type graph plus the operations
/// defined over it.
pub trait ServiceModel: TypeGraph + std::fmt::Debug {
    fn operations(&self) -> Vec<OperationDecl>;
}

// ————————————————————————————————————————————————————————————————————————————
// IN-MEMORY PROVIDER
// ————————————————————————————————————————————————————————————————————————————

/// The body of one named complex type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    #[serde(default)]
    pub elements: Vec<ElementDecl>,
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
}

/// Serde-backed service model. Types absent from `types` are treated as
/// builtins (empty element/attribute lists), which routes them to the
/// primitive mapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryModel {
    #[serde(default)]
    pub types: IndexMap<String, TypeDecl>,
    #[serde(default)]
    pub operations: Vec<OperationDecl>,
}

impl TypeGraph for InMemoryModel {
    fn elements(&self, ty: &TypeRef) -> Result<Vec<ElementDecl>, TypeGraphError> {
        Ok(self.types.get(ty.name()).map(|t| t.elements.clone()).unwrap_or_default())
    }

    fn attributes(&self, ty: &TypeRef) -> Result<Vec<AttributeDecl>, TypeGraphError> {
        Ok(self.types.get(ty.name()).map(|t| t.attributes.clone()).unwrap_or_default())
    }
}

impl ServiceModel for InMemoryModel {
    fn operations(&self) -> Vec<OperationDecl> {
        self.operations.clone()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SERDE FOR OCCURS
// ————————————————————————————————————————————————————————————————————————————

fn default_occurs() -> u64 {
    1
}

fn default_max_occurs() -> Occurs {
    Occurs::Bounded(1)
}

// `max_occurs` reads as a count or the literal string "unbounded",
// matching the XSD attribute value space.
impl Serialize for Occurs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Occurs::Bounded(n) => serializer.serialize_u64(*n),
            Occurs::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for Occurs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u64),
            Keyword(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Occurs::Bounded(n)),
            Raw::Keyword(s) if s == "unbounded" => Ok(Occurs::Unbounded),
            Raw::Keyword(other) => {
                Err(D::Error::custom(format!("expected a count or \"unbounded\", got `{other}`")))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

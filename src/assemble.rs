//! Folds the included operation records into the final OpenAPI document.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::ir::SchemaNode;
use crate::registry::OperationRegistry;

/// Conventional name of the exported artifact.
pub const EXPORT_FILE_NAME: &str = "swagger.json";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        DocumentInfo {
            title: "Restructured REST API".to_string(),
            version: "1.0.0".to_string(),
            description: "Auto-generated REST facade from SOAP WSDL.".to_string(),
        }
    }
}

/// One `post` entry in the final document.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub tag: String,
    pub summary: String,
    pub request: SchemaNode,
    pub response: SchemaNode,
}

/// The assembled API description. Rebuilt from scratch on every
/// finalize; never merged into a previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub info: DocumentInfo,
    pub paths: IndexMap<String, PathEntry>,
}

// ————————————————————————————————————————————————————————————————————————————
// ASSEMBLY
// ————————————————————————————————————————————————————————————————————————————

/// Exactly one path per included record, keyed `/{name}`, in registry
/// order. Excluded records are omitted entirely.
pub fn assemble(info: &DocumentInfo, registry: &OperationRegistry) -> Document {
    let mut paths = IndexMap::new();
    for record in registry.iter().filter(|r| r.include) {
        paths.insert(
            format!("/{}", record.name),
            PathEntry {
                tag: record.tag.clone(),
                summary: record.name.clone(),
                request: record.request.clone(),
                response: record.response.clone(),
            },
        );
    }
    Document { info: info.clone(), paths }
}

impl Document {
    /// Render the OpenAPI-3.0-shaped JSON value. Deterministic: path
    /// and property order are preserved end to end.
    pub fn to_json(&self) -> Value {
        let mut paths = Map::new();
        for (path, entry) in &self.paths {
            paths.insert(
                path.clone(),
                json!({
                    "post": {
                        "tags": [entry.tag],
                        "summary": entry.summary,
                        "requestBody": {
                            "content": {
                                "application/json": { "schema": entry.request.to_value() }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Success",
                                "content": {
                                    "application/json": { "schema": entry.response.to_value() }
                                }
                            }
                        }
                    }
                }),
            );
        }
        json!({
            "openapi": "3.0.0",
            "info": {
                "title": self.info.title,
                "version": self.info.version,
                "description": self.info.description,
            },
            "paths": paths,
        })
    }

    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).expect("a JSON value always renders")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

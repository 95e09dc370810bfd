//! Editable intermediate model: one record per discovered operation.
//!
//! Records are populated once at ingest and only ever change through
//! the guarded edit operations here. A failed edit never replaces a
//! valid stored schema, and never touches any other record.

use indexmap::IndexMap;

use crate::compile;
use crate::ir::{SchemaNode, SchemaParseError};
use crate::typegraph::ServiceModel;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One operation's editable state.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub name: String,
    pub request: SchemaNode,
    pub response: SchemaNode,
    pub include: bool,
    /// Owning service group.
    pub tag: String,
}

/// Which half of a record an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPart {
    Request,
    Response,
}

impl std::fmt::Display for SchemaPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaPart::Request => f.write_str("request"),
            SchemaPart::Response => f.write_str("response"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("operation `{operation}`: invalid {part} schema: {source}")]
    Parse {
        operation: String,
        part: SchemaPart,
        #[source]
        source: SchemaParseError,
    },
}

/// Discovery order is kept, so every later stage iterates the same way.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    records: IndexMap<String, OperationRecord>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl OperationRegistry {
    /// Compile every discovered operation into a record. `include`
    /// defaults to true; the tag is the owning service name. A
    /// duplicated operation name keeps its discovery position and takes
    /// the later declaration's schemas.
    pub fn populate(model: &dyn ServiceModel) -> Self {
        let mut records = IndexMap::new();
        for op in model.operations() {
            let request = compile::compile(model, op.request.as_ref());
            let response = compile::compile(model, op.response.as_ref());
            records.insert(
                op.name.clone(),
                OperationRecord {
                    name: op.name,
                    request,
                    response,
                    include: true,
                    tag: op.service,
                },
            );
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&OperationRecord> {
        self.records.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.values()
    }

    /// Parse `text` and, only on success, replace the targeted schema.
    pub fn edit_schema(
        &mut self,
        name: &str,
        part: SchemaPart,
        text: &str,
    ) -> Result<(), EditError> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| EditError::UnknownOperation(name.to_owned()))?;
        let parsed = SchemaNode::parse(text).map_err(|source| EditError::Parse {
            operation: name.to_owned(),
            part,
            source,
        })?;
        match part {
            SchemaPart::Request => record.request = parsed,
            SchemaPart::Response => record.response = parsed,
        }
        Ok(())
    }

    pub fn set_include(&mut self, name: &str, include: bool) -> Result<(), EditError> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| EditError::UnknownOperation(name.to_owned()))?;
        record.include = include;
        Ok(())
    }

    pub fn set_tag(&mut self, name: &str, tag: impl Into<String>) -> Result<(), EditError> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| EditError::UnknownOperation(name.to_owned()))?;
        record.tag = tag.into();
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

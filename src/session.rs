//! Three-stage pipeline: ingest → edit → finalize.
//!
//! One `Session` value holds everything a pipeline run owns, so several
//! sessions stay isolated and a session is trivially testable. There is
//! deliberately no way to recompile a single operation from source after
//! ingest; edits are the only path that changes a schema.

use crate::assemble::{self, Document, DocumentInfo};
use crate::registry::{EditError, OperationRegistry, SchemaPart};
use crate::typegraph::ServiceModel;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Edit,
    Finalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Ingest => f.write_str("ingest"),
            Stage::Edit => f.write_str("edit"),
            Stage::Finalize => f.write_str("finalize"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("expected the {expected} stage, currently in {actual}")]
    WrongStage { expected: Stage, actual: Stage },
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Debug)]
pub struct Session {
    stage: Stage,
    info: DocumentInfo,
    registry: OperationRegistry,
    document: Option<Document>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Session {
    pub fn new(info: DocumentInfo) -> Self {
        Session {
            stage: Stage::Ingest,
            info,
            registry: OperationRegistry::default(),
            document: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// The last finalized document, if any.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), SessionError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(SessionError::WrongStage { expected, actual: self.stage })
        }
    }

    /// Ingest → edit: compile the service model into operation records.
    /// Valid only in the ingest stage; a loader failure upstream simply
    /// never reaches this point, leaving the session where it was.
    pub fn ingest(&mut self, model: &dyn ServiceModel) -> Result<(), SessionError> {
        self.expect_stage(Stage::Ingest)?;
        self.registry = OperationRegistry::populate(model);
        self.stage = Stage::Edit;
        tracing::info!(operations = self.registry.len(), "ingest complete, entering edit");
        Ok(())
    }

    /// Replace one operation's request or response schema from text.
    /// Accepted only while editing.
    pub fn edit_schema(
        &mut self,
        name: &str,
        part: SchemaPart,
        text: &str,
    ) -> Result<(), SessionError> {
        self.expect_stage(Stage::Edit)?;
        self.registry.edit_schema(name, part, text)?;
        Ok(())
    }

    pub fn set_include(&mut self, name: &str, include: bool) -> Result<(), SessionError> {
        self.expect_stage(Stage::Edit)?;
        self.registry.set_include(name, include)?;
        Ok(())
    }

    pub fn set_tag(&mut self, name: &str, tag: impl Into<String>) -> Result<(), SessionError> {
        self.expect_stage(Stage::Edit)?;
        self.registry.set_tag(name, tag)?;
        Ok(())
    }

    /// Edit → finalize: assemble the document from the current records.
    /// Each call rebuilds the document wholesale.
    pub fn finalize(&mut self) -> Result<&Document, SessionError> {
        self.expect_stage(Stage::Edit)?;
        let document = assemble::assemble(&self.info, &self.registry);
        self.stage = Stage::Finalize;
        tracing::info!(paths = document.paths.len(), "document assembled");
        Ok(self.document.insert(document))
    }

    /// Finalize → edit: data-wise a no-op. Records keep every prior
    /// edit; nothing is recompiled from source.
    pub fn back_to_edit(&mut self) -> Result<(), SessionError> {
        self.expect_stage(Stage::Finalize)?;
        self.stage = Stage::Edit;
        Ok(())
    }

    /// Reachable from any stage: drop all records and the document and
    /// return to ingest.
    pub fn restart(&mut self) {
        self.registry = OperationRegistry::default();
        self.document = None;
        self.stage = Stage::Ingest;
        tracing::info!("session restarted");
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(DocumentInfo::default())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{JsonType, SchemaNode};
    use crate::typegraph::{InMemoryModel, OperationDecl, TypeRef};

    fn sample_model() -> InMemoryModel {
        let mut model = InMemoryModel::default();
        model.operations = vec![
            OperationDecl {
                name: "A".to_string(),
                service: "Svc".to_string(),
                request: Some(TypeRef::new("xs:string")),
                response: Some(TypeRef::new("xs:string")),
            },
            OperationDecl {
                name: "B".to_string(),
                service: "Svc".to_string(),
                request: None,
                response: None,
            },
        ];
        model
    }

    #[test]
    fn happy_path_walks_all_three_stages() {
        let mut session = Session::default();
        assert_eq!(session.stage(), Stage::Ingest);

        session.ingest(&sample_model()).unwrap();
        assert_eq!(session.stage(), Stage::Edit);
        assert_eq!(session.registry().len(), 2);

        let document = session.finalize().unwrap();
        assert_eq!(document.paths.len(), 2);
        assert_eq!(session.stage(), Stage::Finalize);
    }

    #[test]
    fn edits_are_rejected_outside_the_edit_stage() {
        let mut session = Session::default();
        let err = session
            .edit_schema("A", SchemaPart::Request, r#"{ "type": "string" }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::WrongStage { expected: Stage::Edit, actual: Stage::Ingest }
        ));

        session.ingest(&sample_model()).unwrap();
        session.finalize().unwrap();
        assert!(session.set_include("A", false).is_err());
    }

    #[test]
    fn double_ingest_is_rejected() {
        let mut session = Session::default();
        session.ingest(&sample_model()).unwrap();
        let err = session.ingest(&sample_model()).unwrap_err();
        assert!(matches!(err, SessionError::WrongStage { .. }));
    }

    #[test]
    fn back_to_edit_preserves_edits_and_refinalizes_with_them() {
        let mut session = Session::default();
        session.ingest(&sample_model()).unwrap();
        session
            .edit_schema("A", SchemaPart::Response, r#"{ "type": "integer" }"#)
            .unwrap();
        session.finalize().unwrap();

        session.back_to_edit().unwrap();
        assert_eq!(session.stage(), Stage::Edit);
        // prior edit survived the round trip through finalize
        assert_eq!(
            session.registry().get("A").unwrap().response,
            SchemaNode::primitive(JsonType::Integer)
        );

        session.set_include("B", false).unwrap();
        let document = session.finalize().unwrap();
        assert!(!document.paths.contains_key("/B"));
        assert_eq!(
            document.paths["/A"].response,
            SchemaNode::primitive(JsonType::Integer)
        );
    }

    #[test]
    fn restart_clears_everything_from_any_stage() {
        // from edit
        let mut session = Session::default();
        session.ingest(&sample_model()).unwrap();
        session.restart();
        assert_eq!(session.stage(), Stage::Ingest);
        assert!(session.registry().is_empty());
        assert!(session.document().is_none());

        // from finalize
        let mut session = Session::default();
        session.ingest(&sample_model()).unwrap();
        session.finalize().unwrap();
        session.restart();
        assert_eq!(session.stage(), Stage::Ingest);
        assert!(session.registry().is_empty());
        assert!(session.document().is_none());

        // from ingest (trivial but allowed)
        let mut session = Session::default();
        session.restart();
        assert_eq!(session.stage(), Stage::Ingest);
    }

    #[test]
    fn restarted_session_accepts_a_fresh_ingest() {
        let mut session = Session::default();
        session.ingest(&sample_model()).unwrap();
        session.restart();
        session.ingest(&sample_model()).unwrap();
        assert_eq!(session.stage(), Stage::Edit);
        assert_eq!(session.registry().len(), 2);
    }
}

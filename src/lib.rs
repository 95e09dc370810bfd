//! WSDL-shaped service descriptions → editable JSON Schema → OpenAPI 3.0.
//!
//! The pipeline is three linear stages: ingest a service model and
//! compile every operation's request/response type into a schema tree,
//! let the user edit the per-operation records, then assemble the
//! included ones into a `swagger.json`-shaped document.

pub mod assemble;
pub mod cli;
pub mod compile;
pub mod ingest;
pub mod ir;
pub mod mapper;
pub mod registry;
pub mod session;
pub mod typegraph;

//! Minimal CLI: ingest → (schema | convert)
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use colored::Colorize as _;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;

use crate::assemble::DocumentInfo;
use crate::ingest::{self, JsonModelLoader, Upload};
use crate::registry::SchemaPart;
use crate::session::Session;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// turn a WSDL-shaped service model into an editable OpenAPI 3.0 document
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ingest and print the compiled per-operation schemas (the edit-stage view)
    Schema(SchemaOut),
    /// run the full pipeline and emit the final OpenAPI document
    Convert(ConvertOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more service-model inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// Entry-point file name when several inputs are eligible
    #[arg(long)]
    entry_point: Option<String>,
}

#[derive(Args, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// document title
    #[arg(long, default_value = "Restructured REST API")]
    title: String,

    /// document version
    #[arg(long, default_value = "1.0.0")]
    version: String,

    /// per-operation edits file (JSON: operation name → patch)
    #[arg(long)]
    edits: Option<PathBuf>,

    /// operation to leave out of the final document (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// output file
    #[arg(short, long, default_value = crate::assemble::EXPORT_FILE_NAME)]
    out: PathBuf,

    /// print to stdout instead of writing --out
    #[arg(long)]
    stdout: bool,
}

/// One entry of the edits file. Absent fields leave the record as is.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct OperationPatch {
    request: Option<serde_json::Value>,
    response: Option<serde_json::Value>,
    include: Option<bool>,
    tag: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => run_schema(target),
            Command::Convert(target) => run_convert(target),
        }
    }
}

impl InputSettings {
    fn stage_uploads(&self) -> anyhow::Result<Vec<Upload>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut uploads = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let name = source_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("input has no file name: {}", source_path.display()))?;
            let contents = std::fs::read(&source_path)
                .with_context(|| format!("reading {}", source_path.display()))?;
            uploads.push(Upload::new(name, contents));
        }
        Ok(uploads)
    }

    fn ingest_session(&self) -> anyhow::Result<Session> {
        let uploads = self.stage_uploads()?;
        let model = ingest::ingest(&JsonModelLoader, &uploads, self.entry_point.as_deref())?;
        let mut session = Session::default();
        session.ingest(&*model)?;
        Ok(session)
    }
}

fn run_schema(target: &SchemaOut) -> anyhow::Result<()> {
    let session = target.input_settings.ingest_session()?;

    let mut view = serde_json::Map::new();
    for record in session.registry().iter() {
        view.insert(
            record.name.clone(),
            json!({
                "tag": record.tag,
                "include": record.include,
                "request": record.request.to_value(),
                "response": record.response.to_value(),
            }),
        );
    }
    let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(view))?;
    write_out(target.out.as_deref(), &rendered)
}

fn run_convert(target: &ConvertOut) -> anyhow::Result<()> {
    let info = DocumentInfo {
        title: target.title.clone(),
        version: target.version.clone(),
        ..DocumentInfo::default()
    };
    let mut session = Session::new(info);
    {
        let uploads = target.input_settings.stage_uploads()?;
        let model = ingest::ingest(
            &JsonModelLoader,
            &uploads,
            target.input_settings.entry_point.as_deref(),
        )?;
        session.ingest(&*model)?;
    }

    if let Some(edits_path) = target.edits.as_ref() {
        apply_edits_file(&mut session, edits_path)?;
    }
    for name in &target.exclude {
        if let Err(err) = session.set_include(name, false) {
            eprintln!("{} {err}", "warning:".yellow());
        }
    }

    let document = session.finalize()?;
    let rendered = document.to_pretty();
    if target.stdout {
        println!("{rendered}");
        Ok(())
    } else {
        write_out(Some(&target.out), &rendered)
    }
}

/// Apply the patches one operation at a time. A bad patch is reported
/// and skipped; every other operation still goes through.
fn apply_edits_file(session: &mut Session, path: &std::path::Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading edits file {}", path.display()))?;
    let patches: IndexMap<String, OperationPatch> = serde_json::from_str(&source)
        .with_context(|| format!("parsing edits file {}", path.display()))?;

    for (name, patch) in patches {
        let mut apply = || -> anyhow::Result<()> {
            if let Some(request) = &patch.request {
                session.edit_schema(&name, SchemaPart::Request, &request.to_string())?;
            }
            if let Some(response) = &patch.response {
                session.edit_schema(&name, SchemaPart::Response, &response.to_string())?;
            }
            if let Some(include) = patch.include {
                session.set_include(&name, include)?;
            }
            if let Some(tag) = &patch.tag {
                session.set_tag(&name, tag.clone())?;
            }
            Ok(())
        };
        if let Err(err) = apply() {
            eprintln!("{} {name}: {err:#}", "edit rejected:".red());
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_out(out: Option<&std::path::Path>, rendered: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(out, rendered).with_context(|| format!("writing {}", out.display()))?;
            Ok(())
        }
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Explicit glob that matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    use crate::ir::{JsonType, SchemaNode};
    use crate::typegraph::{InMemoryModel, OperationDecl, TypeRef};

    fn edit_stage_session() -> Session {
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
                request: Some(TypeRef::new("xs:string")),
                response: None,
            },
        ];
        let mut session = Session::default();
        session.ingest(&model).unwrap();
        session
    }

    #[test]
    fn edits_file_failures_are_isolated_per_operation() {
        let mut session = edit_stage_session();
        let before_a = session.registry().get("A").unwrap().clone();

        // A's patch is structurally invalid, B's is fine.
        let mut edits = tempfile::NamedTempFile::new().unwrap();
        edits
            .write_all(
                br#"{
                    "A": { "request": { "type": "array" } },
                    "B": { "request": { "type": "integer" }, "include": false }
                }"#,
            )
            .unwrap();

        apply_edits_file(&mut session, edits.path()).unwrap();

        // the bad patch changed nothing on A
        assert_eq!(session.registry().get("A").unwrap(), &before_a);
        // the good patch went through in full
        let b = session.registry().get("B").unwrap();
        assert_eq!(b.request, SchemaNode::primitive(JsonType::Integer));
        assert!(!b.include);
    }

    #[test]
    fn edits_file_tolerates_unknown_operations() {
        let mut session = edit_stage_session();
        let mut edits = tempfile::NamedTempFile::new().unwrap();
        edits
            .write_all(
                br#"{
                    "Missing": { "include": false },
                    "A": { "tag": "Renamed" }
                }"#,
            )
            .unwrap();

        apply_edits_file(&mut session, edits.path()).unwrap();
        assert_eq!(session.registry().get("A").unwrap().tag, "Renamed");
    }

    #[test]
    fn unreadable_edits_file_is_a_hard_error() {
        let mut session = edit_stage_session();
        let err = apply_edits_file(&mut session, std::path::Path::new("/no/such/edits.json"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("edits file"));
    }
}

//! Upload staging and service-description loading.
//!
//! Uploaded artifacts land in a transient scoped workspace (a temp
//! directory) so a loader that resolves cross-file imports can see them
//! side by side under their original names. The workspace is released
//! on drop, on every exit path, success or failure.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::typegraph::{InMemoryModel, ServiceModel};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One uploaded artifact, by original file name.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub contents: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Upload { name: name.into(), contents: contents.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no eligible entry point among the uploaded files (expected a .{extension})")]
    MissingEntryPoint { extension: String },
    #[error("named entry point `{0}` is not an eligible upload")]
    UnknownEntryPoint(String),
    #[error("failed to load the service description")]
    Parse(#[source] anyhow::Error),
    #[error("workspace I/O failed")]
    Io(#[from] std::io::Error),
}

/// The black-box parser seam. A real WSDL/XSD parser plugs in here;
/// `JsonModelLoader` is the built-in provider.
pub trait ServiceLoader {
    /// File extension (without the dot) of an eligible entry point.
    fn entry_extension(&self) -> &str {
        "wsdl"
    }

    /// Parse the staged entry point into a service model. Sibling files
    /// staged next to it are available for import resolution.
    fn load(&self, entry_point: &Path) -> anyhow::Result<Box<dyn ServiceModel>>;
}

/// Loads an `InMemoryModel` from its JSON form.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelLoader;

impl ServiceLoader for JsonModelLoader {
    fn entry_extension(&self) -> &str {
        "json"
    }

    fn load(&self, entry_point: &Path) -> anyhow::Result<Box<dyn ServiceModel>> {
        let source = std::fs::read_to_string(entry_point)
            .with_context(|| format!("reading {}", entry_point.display()))?;
        let model: InMemoryModel = serde_json::from_str(&source)
            .with_context(|| format!("parsing service model {}", entry_point.display()))?;
        Ok(Box::new(model))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// WORKSPACE
// ————————————————————————————————————————————————————————————————————————————

/// Transient staging directory. Dropping it removes the directory and
/// everything staged into it.
#[derive(Debug)]
pub struct Workspace {
    dir: tempfile::TempDir,
    staged: Vec<String>,
}

impl Workspace {
    pub fn new() -> std::io::Result<Self> {
        Ok(Workspace { dir: tempfile::TempDir::new()?, staged: Vec::new() })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write one upload under its original file name. The name must be
    /// a bare file name; anything path-like stays outside the workspace.
    pub fn stage(&mut self, upload: &Upload) -> std::io::Result<PathBuf> {
        if upload.name.is_empty()
            || upload.name.contains(['/', '\\'])
            || upload.name == "."
            || upload.name == ".."
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid upload name `{}`", upload.name),
            ));
        }
        let path = self.dir.path().join(&upload.name);
        let mut file = std::fs::File::create(&path)?;
        file.write_all(&upload.contents)?;
        self.staged.push(upload.name.clone());
        Ok(path)
    }

    /// Staged file names carrying the given extension, in staging order.
    pub fn candidates(&self, extension: &str) -> Vec<&str> {
        self.staged
            .iter()
            .filter(|name| {
                Path::new(name.as_str())
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .map(String::as_str)
            .collect()
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INGEST
// ————————————————————————————————————————————————————————————————————————————

/// Stage the uploads, pick the entry point, run the loader. `entry`
/// selects among several eligible files; when absent the first eligible
/// upload is taken. The workspace is gone by the time this returns,
/// whatever the outcome.
pub fn ingest(
    loader: &dyn ServiceLoader,
    uploads: &[Upload],
    entry: Option<&str>,
) -> Result<Box<dyn ServiceModel>, IngestError> {
    let mut workspace = Workspace::new()?;
    for upload in uploads {
        workspace.stage(upload)?;
    }

    let extension = loader.entry_extension();
    let candidates = workspace.candidates(extension);
    let entry_name = match entry {
        Some(name) => {
            // a named entry point must be one of the eligible uploads
            if !candidates.contains(&name) {
                return Err(IngestError::UnknownEntryPoint(name.to_owned()));
            }
            name
        }
        None => candidates.first().copied().ok_or_else(|| IngestError::MissingEntryPoint {
            extension: extension.to_owned(),
        })?,
    };

    tracing::debug!(entry = entry_name, files = uploads.len(), "loading service description");
    let entry_path = workspace.path_of(entry_name);
    loader.load(&entry_path).map_err(IngestError::Parse)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

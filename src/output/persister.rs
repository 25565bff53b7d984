//! Atomic, never-overwriting artifact writes

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

const SNAPSHOT_DIR: &str = "pages";
const DOWNLOADS_SUFFIX: &str = "_downloads";

/// Errors from writing artifacts to disk
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Artifact path is outside the output root: {0}")]
    InvalidPath(PathBuf),

    #[error("Artifact path is taken by something other than a file: {0}")]
    Occupied(PathBuf),
}

/// What an artifact contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Html,
    Text,
    Pdf,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Html => ".html",
            ArtifactKind::Text => ".txt",
            ArtifactKind::Pdf => ".pdf",
        }
    }
}

/// One file to be written, complete in memory
#[derive(Debug, Clone)]
pub struct PersistedArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub kind: ArtifactKind,
}

impl PersistedArtifact {
    pub fn new(path: PathBuf, bytes: impl Into<Vec<u8>>, kind: ArtifactKind) -> Self {
        Self {
            path,
            bytes: bytes.into(),
            kind,
        }
    }
}

/// Result of a persist call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written,

    /// The target existed; nothing was touched
    AlreadyExists,
}

/// Writes artifacts under one output root and computes their paths
///
/// Layout:
/// - `<root>/<group>/pages/page_<n>.html`
/// - `<root>/<group>/<stem>.html` and `<stem>.txt`
/// - `<root>/<group>/<stem>_downloads/<name>.pdf`
#[derive(Debug, Clone)]
pub struct Persister {
    root: PathBuf,
}

impl Persister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.root.join(group)
    }

    pub fn page_snapshot_path(&self, group: &str, sequence: u32) -> PathBuf {
        self.group_dir(group)
            .join(SNAPSHOT_DIR)
            .join(format!("page_{}.html", sequence))
    }

    pub fn document_path(&self, group: &str, stem: &str, kind: ArtifactKind) -> PathBuf {
        self.group_dir(group)
            .join(format!("{}{}", stem, kind.extension()))
    }

    pub fn attachment_path(&self, group: &str, document_stem: &str, filename: &str) -> PathBuf {
        self.group_dir(group)
            .join(format!("{}{}", document_stem, DOWNLOADS_SUFFIX))
            .join(filename)
    }

    /// Writes the artifact unless its path already exists
    ///
    /// Bytes go to a temporary file in the destination directory first and
    /// are linked into place only when complete, so a crash never leaves a
    /// partial file at the final path.
    pub fn persist(&self, artifact: &PersistedArtifact) -> Result<PersistOutcome, PersistError> {
        let path = &artifact.path;
        if !path.starts_with(&self.root) {
            return Err(PersistError::InvalidPath(path.clone()));
        }
        let parent = path
            .parent()
            .ok_or_else(|| PersistError::InvalidPath(path.clone()))?;

        if path.is_file() {
            tracing::debug!("Artifact already present, skipping: {}", path.display());
            return Ok(PersistOutcome::AlreadyExists);
        }
        if path.exists() {
            return Err(PersistError::Occupied(path.clone()));
        }

        let io_err = |source: io::Error| PersistError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(parent).map_err(io_err)?;

        let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
        temp.write_all(&artifact.bytes).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;

        match temp.persist_noclobber(path) {
            Ok(_) => {
                tracing::debug!(
                    "Wrote {:?} artifact ({} bytes): {}",
                    artifact.kind,
                    artifact.bytes.len(),
                    path.display()
                );
                Ok(PersistOutcome::Written)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!("Artifact appeared concurrently, skipping: {}", path.display());
                Ok(PersistOutcome::AlreadyExists)
            }
            Err(e) => Err(io_err(e.error)),
        }
    }
}

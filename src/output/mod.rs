//! Output module for harvested artifacts
//!
//! This module handles:
//! - Deriving stable filenames from titles and URLs
//! - Rendering extracted documents to plain text
//! - Writing artifacts atomically without overwriting
//! - Recording run statistics

mod filename;
mod persister;
mod render;
pub mod stats;

pub use filename::{attachment_filename, document_stem, sanitize_filename};
pub use persister::{ArtifactKind, PersistError, PersistOutcome, PersistedArtifact, Persister};
pub use render::{render_text, DocumentMeta};
pub use stats::RunStats;

//! URL handling module for Folio-Harvest
//!
//! This module provides link resolution, path segment helpers and origin
//! comparison used by the extractors and the filename sanitizer.

mod domain;
mod resolve;

pub use domain::{extract_domain, same_origin};
pub use resolve::{last_path_segment, resolve_link};

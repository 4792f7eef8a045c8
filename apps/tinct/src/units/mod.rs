//! # Pipeline Units
//!
//! Concrete collectors, formatters and writers for theme generation.
//!
//! - [`ThemeSource`] - reads a theme file, resolves its groups
//! - [`VimFormatter`], [`JsonFormatter`] - render resolved styles
//! - [`FileWriter`], [`StdoutWriter`] - emit the rendered files

mod format;
mod source;
mod write;

pub use format::{JsonFormatter, VimFormatter};
pub use source::ThemeSource;
pub use write::{FileWriter, StdoutWriter};

use crate::theme::{Group, ResolvedStyle, Style};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tinct_core::SourceItems;

/// Artifact produced by every formatter in this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub text: String,
}

/// Merge resolved styles from all sources.
///
/// Sources arrive in priority order, so a later source overrides an
/// earlier one group by group.
pub fn layered_styles(items: &SourceItems) -> BTreeMap<&Group, &Style> {
    let mut merged = BTreeMap::new();
    for resolved in items.of_type::<ResolvedStyle>() {
        merged.insert(&resolved.group, &resolved.style);
    }
    merged
}

//! # tinct
//!
//! Theme generator built on `tinct-core`.
//!
//! - [`theme`] - TOML theme files, includes and layering
//! - [`units`] - concrete collectors, formatters and writers
//! - [`cli`] - command-line interface

pub mod cli;
pub mod theme;
pub mod units;

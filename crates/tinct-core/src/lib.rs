//! # tinct-core
//!
//! The deterministic resolution engine for tinct - THE LOGIC.
//!
//! This crate turns declarative style assignments into resolved
//! `(group, style)` pairs and drives the pluggable pipeline that renders
//! them: collect, then format, then write.
//!
//! ## Layers
//!
//! - `identity` → canonical value → [`Handle`] registry
//! - `graph` → single-link graph with cycle-checked topological order
//! - `resolver` → `set`/`link` assignments over arbitrary group types
//! - `pipeline` → priority-ordered, lazily-evaluated stages
//!
//! ## Architectural Constraints
//!
//! - Single-threaded and synchronous; no async, no I/O
//! - Deterministic: the same registrations always produce the same output
//! - Fatal errors abort the run; duplicate assignments are only diagnostics

// =============================================================================
// MODULES
// =============================================================================

pub mod diagnostics;
pub mod graph;
pub mod identity;
pub mod pipeline;
pub mod resolver;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Handle, TinctError, UnitCategory};

// =============================================================================
// RE-EXPORTS: Resolution Engine
// =============================================================================

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use graph::SingleLinkGraph;
pub use identity::{IdentityKey, IdentityStore};
pub use resolver::{GroupResolver, NodeKind};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use pipeline::{
    Artifact, Collector, Contents, Formatter, Item, Pipeline, PipelineMetadata, RunSummary,
    SourceItems, Stage, Writer,
};

//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the tinct engine:
//! - Identity handles (`Handle`)
//! - Pipeline unit categories (`UnitCategory`)
//! - Error types (`TinctError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// HANDLE
// =============================================================================

/// Dense identifier assigned by the [`IdentityStore`](crate::IdentityStore).
///
/// Handles are assigned in first-save order (0, 1, 2, ...) and double as
/// node indices in the [`SingleLinkGraph`](crate::SingleLinkGraph), which
/// stores one slot per index up to the largest linked one. Indices above
/// [`Handle::MAX_INDEX`] are never linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub usize);

impl Handle {
    /// Largest index the graph will allocate a slot for.
    pub const MAX_INDEX: usize = (1 << 24) - 1;

    /// Create a handle from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Convert a signed index, rejecting negative values and anything
    /// above [`MAX_INDEX`](Self::MAX_INDEX).
    pub fn from_index(index: i64) -> Result<Self, TinctError> {
        let raw = usize::try_from(index)
            .map_err(|_| TinctError::InvalidArgument(format!("negative node index {index}")))?;
        if raw > Self::MAX_INDEX {
            return Err(TinctError::InvalidArgument(format!(
                "node index {index} exceeds {}",
                Self::MAX_INDEX
            )));
        }
        Ok(Self(raw))
    }

    /// Whether the graph accepts this handle as a node.
    #[must_use]
    pub const fn is_linkable(self) -> bool {
        self.0 <= Self::MAX_INDEX
    }

    /// Get the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// UNIT CATEGORY
// =============================================================================

/// The three kinds of pluggable pipeline units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    Collector,
    Formatter,
    Writer,
}

impl UnitCategory {
    /// Lowercase name used in messages and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            UnitCategory::Collector => "collector",
            UnitCategory::Formatter => "formatter",
            UnitCategory::Writer => "writer",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the tinct engine.
///
/// - No silent failures: everything except duplicate assignments is fatal
/// - Use `Result<T, TinctError>` for fallible operations
/// - Duplicate assignments are reported through
///   [`Diagnostics`](crate::Diagnostics), not returned
#[derive(Debug, Error)]
pub enum TinctError {
    /// A malformed argument, such as a negative graph index.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Two units of the same category share a name.
    #[error("Duplicate {category} name: {name}")]
    DuplicateName {
        category: UnitCategory,
        name: String,
    },

    /// A group already has an outgoing assignment.
    #[error("Duplicate assignment for group {group}")]
    DuplicateAssignment { group: String },

    /// Topological resolution found a cycle.
    #[error("Cycle detected: {}", render_path(.path))]
    CycleDetected { path: Vec<Handle> },

    /// An alias never resolves to a terminal value.
    #[error("Unresolved group: {0}")]
    UnresolvedGroup(String),

    /// The handle was never assigned by the identity store.
    #[error("Handle out of range: {0}")]
    OutOfRange(Handle),

    /// The stored value has a different type than requested.
    #[error("Type mismatch for {handle}: expected {expected}, found {found}")]
    TypeMismatch {
        handle: Handle,
        expected: &'static str,
        found: &'static str,
    },

    /// A registration or query was attempted in the wrong stage.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A query that must not be empty returned nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A pipeline unit failed while executing.
    #[error("{category} '{name}' failed: {source}")]
    UnitFailed {
        category: UnitCategory,
        name: String,
        source: Box<TinctError>,
    },

    /// A theme definition is malformed.
    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl TinctError {
    /// Unwrap nested `UnitFailed` layers down to the originating error.
    #[must_use]
    pub fn root_cause(&self) -> &TinctError {
        let mut current = self;
        while let TinctError::UnitFailed { source, .. } = current {
            current = source;
        }
        current
    }
}

fn render_path(path: &[Handle]) -> String {
    path.iter()
        .map(Handle::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// =============================================================================
// TESTS
// =============================================================================

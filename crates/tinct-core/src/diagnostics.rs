//! # Diagnostics
//!
//! Explicit channel for non-fatal conditions.
//!
//! A [`Diagnostics`] sink is a cheap, cloneable handle onto one shared list.
//! The pipeline owns one and hands clones to units, which thread it into
//! their [`GroupResolver`](crate::GroupResolver)s. Every entry is also
//! mirrored to `tracing` at `warn` level.

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Kind of a non-fatal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticKind {
    /// A group already had an assignment; the first one was kept.
    DuplicateAssignment,
}

/// A single recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The group or unit the diagnostic is about.
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Shared diagnostics sink.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl Diagnostics {
    /// Create a new, empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn push(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = ?diagnostic.kind,
            subject = %diagnostic.subject,
            "{}",
            diagnostic.message
        );
        self.entries.borrow_mut().push(diagnostic);
    }

    /// Record that `group` was assigned more than once.
    pub fn duplicate_assignment(&self, group: impl Into<String>) {
        let group = group.into();
        self.push(Diagnostic {
            kind: DiagnosticKind::DuplicateAssignment,
            message: format!("group {group} is already assigned; keeping the first assignment"),
            subject: group,
        });
    }

    /// Copy of every recorded diagnostic, in recording order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Number of diagnostics of the given kind.
    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Check if two sinks share the same underlying list.
    #[must_use]
    pub fn shares_with(&self, other: &Diagnostics) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

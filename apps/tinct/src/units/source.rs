//! Theme file collector.

use crate::theme::{ResolvedStyle, Theme};
use std::cell::RefCell;
use std::path::Path;
use tinct_core::{Collector, GroupResolver, Item, Pipeline, TinctError};

/// Collects the resolved styles of one theme file and its includes.
///
/// The theme is read once, when the source is created. Several sources may
/// feed one pipeline; the formatters layer them in priority order.
#[derive(Debug)]
pub struct ThemeSource {
    name: String,
    theme: Theme,
    priority: i32,
    resolved: RefCell<Vec<ResolvedStyle>>,
}

impl ThemeSource {
    /// Load the theme at `path` and its includes, naming the source after
    /// the path.
    pub fn load(path: &Path) -> Result<Self, TinctError> {
        Ok(Self::from_theme(path.display().to_string(), Theme::load(path)?))
    }

    /// Source for an already loaded theme.
    pub fn from_theme(name: impl Into<String>, theme: Theme) -> Self {
        Self {
            name: name.into(),
            theme,
            priority: 0,
            resolved: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

impl Collector for ThemeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn customize(&self, pipeline: &mut Pipeline) -> Result<(), TinctError> {
        let mut resolver = GroupResolver::with_diagnostics(pipeline.diagnostics());
        let resolved = self.theme.resolve(&mut resolver)?;

        tracing::debug!(
            theme = %self.name,
            files = self.theme.files.len(),
            resolved = resolved.len(),
            "theme resolved"
        );

        *self.resolved.borrow_mut() = resolved;
        Ok(())
    }

    fn collect_items(&self) -> Result<Vec<Item>, TinctError> {
        Ok(self
            .resolved
            .borrow()
            .iter()
            .cloned()
            .map(Item::new)
            .collect())
    }
}

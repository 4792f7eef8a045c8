//! # Pipeline Stages
//!
//! | Stage | Registration allowed for |
//! |-------|--------------------------|
//! | Collecting | collectors, formatters, writers |
//! | Formatting | formatters, writers |
//! | Writing | writers |
//! | Done | nothing |
//!
//! Transitions are monotonic: `Collecting -> Formatting -> Writing -> Done`.

use crate::UnitCategory;
use serde::{Deserialize, Serialize};

/// Phase of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Collecting,
    Formatting,
    Writing,
    Done,
}

impl Stage {
    /// Get the stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Collecting => "collecting",
            Stage::Formatting => "formatting",
            Stage::Writing => "writing",
            Stage::Done => "done",
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Collecting => Some(Stage::Formatting),
            Stage::Formatting => Some(Stage::Writing),
            Stage::Writing => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    /// Last stage in which units of `category` may still be registered.
    #[must_use]
    pub fn last_open_for(category: UnitCategory) -> Stage {
        match category {
            UnitCategory::Collector => Stage::Collecting,
            UnitCategory::Formatter => Stage::Formatting,
            UnitCategory::Writer => Stage::Writing,
        }
    }

    /// Check if units of `category` may be registered in this stage.
    #[must_use]
    pub fn accepts(&self, category: UnitCategory) -> bool {
        *self <= Self::last_open_for(category)
    }

    /// Check if this stage is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_ordering() {
        assert!(Stage::Collecting < Stage::Formatting);
        assert!(Stage::Formatting < Stage::Writing);
        assert!(Stage::Writing < Stage::Done);
    }

    #[test]
    fn next_walks_to_done() {
        let mut stage = Stage::Collecting;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(visited.len(), 4);
        assert!(stage.is_terminal());
    }

    #[test]
    fn registration_windows() {
        assert!(Stage::Collecting.accepts(UnitCategory::Collector));
        assert!(!Stage::Formatting.accepts(UnitCategory::Collector));

        assert!(Stage::Formatting.accepts(UnitCategory::Formatter));
        assert!(!Stage::Writing.accepts(UnitCategory::Formatter));

        assert!(Stage::Writing.accepts(UnitCategory::Writer));
        assert!(!Stage::Done.accepts(UnitCategory::Writer));
    }

    #[test]
    fn stage_display() {
        assert_eq!(format!("{}", Stage::Formatting), "formatting");
    }
}

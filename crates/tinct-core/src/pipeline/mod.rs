//! # Pipeline Orchestrator
//!
//! Runs collectors, formatters and writers in priority order, memoizing
//! each unit's result.
//!
//! ## Lazy stages
//!
//! Source items are collected the first time anyone asks for them, contents
//! are formatted the first time anyone asks for them, and [`Pipeline::run`]
//! asks for contents before handing them to the writers.
//!
//! ## Same-pass registration
//!
//! A unit may register further units while it executes. The pass loop
//! re-sorts the unit list after every registration and always runs the
//! first unit that has not run yet, so late registrations are picked up
//! before the pass ends. Final item and artifact order is priority order,
//! whatever the execution order was.

mod stage;
mod unit;

pub use stage::Stage;
pub use unit::{Artifact, Collector, Contents, Formatter, Item, PipelineMetadata, SourceItems, Writer};

use crate::{Diagnostics, TinctError, UnitCategory};
use serde::Serialize;
use std::any::{Any, type_name};
use std::fmt;
use std::rc::Rc;

// =============================================================================
// UNIT SLOTS
// =============================================================================

/// Execution state of a unit within the current run.
enum Progress<T> {
    Pending,
    Running,
    Finished(T),
}

impl<T> Progress<T> {
    fn is_pending(&self) -> bool {
        matches!(self, Progress::Pending)
    }

    fn finished(&self) -> Option<&T> {
        match self {
            Progress::Finished(value) => Some(value),
            Progress::Pending | Progress::Running => None,
        }
    }
}

struct Slot<U: ?Sized, T> {
    unit: Rc<U>,
    progress: Progress<T>,
}

type CollectorSlot = Slot<dyn Collector, Vec<Item>>;
type FormatterSlot = Slot<dyn Formatter, Artifact>;
type WriterSlot = Slot<dyn Writer, ()>;

/// Stable sort by priority; ties keep registration order.
fn sort_slots<U: ?Sized, T>(slots: &mut [Slot<U, T>], priority: impl Fn(&U) -> i32) {
    slots.sort_by_key(|slot| priority(&*slot.unit));
}

fn next_pending<U: ?Sized, T>(slots: &[Slot<U, T>]) -> Option<usize> {
    slots.iter().position(|slot| slot.progress.is_pending())
}

fn require<T>(found: Vec<T>, allow_empty: bool, what: &str) -> Result<Vec<T>, TinctError> {
    if found.is_empty() && !allow_empty {
        return Err(TinctError::NotFound(what.to_string()));
    }
    Ok(found)
}

// =============================================================================
// RUN SUMMARY
// =============================================================================

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub collectors: usize,
    pub formatters: usize,
    pub writers: usize,
    pub items: usize,
    pub artifacts: usize,
    pub diagnostics: usize,
}

// =============================================================================
// PIPELINE
// =============================================================================

/// The pipeline orchestrator.
///
/// Owns the three unit lists and the two assembled caches. Units only see
/// it through `&mut Pipeline` handed into their callbacks.
pub struct Pipeline {
    metadata: PipelineMetadata,
    stage: Stage,
    collectors: Vec<CollectorSlot>,
    formatters: Vec<FormatterSlot>,
    writers: Vec<WriterSlot>,
    source_items: Option<SourceItems>,
    contents: Option<Contents>,
    collecting: bool,
    formatting: bool,
    /// Set once any unit fails; the pipeline refuses further work.
    failure: Option<String>,
    diagnostics: Diagnostics,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("metadata", &self.metadata)
            .field("stage", &self.stage)
            .field("collectors", &self.collector_names())
            .field("formatters", &self.formatter_names())
            .field("writers", &self.writer_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create an empty pipeline in the `Collecting` stage.
    #[must_use]
    pub fn new(metadata: PipelineMetadata) -> Self {
        Self {
            metadata,
            stage: Stage::Collecting,
            collectors: Vec::new(),
            formatters: Vec::new(),
            writers: Vec::new(),
            source_items: None,
            contents: None,
            collecting: false,
            formatting: false,
            failure: None,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Descriptor supplied at construction.
    #[must_use]
    pub fn metadata(&self) -> &PipelineMetadata {
        &self.metadata
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Shared diagnostics sink; clones report into this pipeline.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.clone()
    }

    fn advance_to(&mut self, stage: Stage) {
        if stage > self.stage {
            tracing::debug!(from = %self.stage, to = %stage, "pipeline stage change");
            self.stage = stage;
        }
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    fn check_open(&self, category: UnitCategory, name: &str) -> Result<(), TinctError> {
        if self.stage.accepts(category) {
            return Ok(());
        }
        let reason = match category {
            UnitCategory::Collector => {
                "cannot add collectors after collection has started consuming results"
            }
            UnitCategory::Formatter => "cannot add formatters once writing has started",
            UnitCategory::Writer => "cannot add writers after the pipeline has finished",
        };
        Err(TinctError::InvalidOperation(format!(
            "{reason} ({category} '{name}', stage {})",
            self.stage
        )))
    }

    fn check_name<U: ?Sized, T>(
        slots: &[Slot<U, T>],
        category: UnitCategory,
        name: &str,
        unit_name: impl Fn(&U) -> &str,
    ) -> Result<(), TinctError> {
        if name.is_empty() {
            return Err(TinctError::InvalidArgument(format!(
                "{category} registered with an empty name"
            )));
        }
        if slots.iter().any(|slot| unit_name(&*slot.unit) == name) {
            return Err(TinctError::DuplicateName {
                category,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Register a collector.
    ///
    /// Legal only while `Collecting`. Drops both assembled caches.
    pub fn register_collector<C: Collector>(&mut self, collector: C) -> Result<(), TinctError> {
        let name = collector.name().to_string();
        self.check_open(UnitCategory::Collector, &name)?;
        Self::check_name(&self.collectors, UnitCategory::Collector, &name, |u| u.name())?;

        tracing::debug!(collector = %name, priority = collector.priority(), "registered");
        self.collectors.push(Slot {
            unit: Rc::new(collector),
            progress: Progress::Pending,
        });
        sort_slots(&mut self.collectors, |u| u.priority());
        self.source_items = None;
        self.contents = None;
        Ok(())
    }

    /// Register a formatter.
    ///
    /// Legal while `Collecting` or `Formatting`. Drops the contents cache.
    pub fn register_formatter<F: Formatter>(&mut self, formatter: F) -> Result<(), TinctError> {
        let name = formatter.name().to_string();
        self.check_open(UnitCategory::Formatter, &name)?;
        Self::check_name(&self.formatters, UnitCategory::Formatter, &name, |u| u.name())?;

        tracing::debug!(formatter = %name, priority = formatter.priority(), "registered");
        self.formatters.push(Slot {
            unit: Rc::new(formatter),
            progress: Progress::Pending,
        });
        sort_slots(&mut self.formatters, |u| u.priority());
        self.contents = None;
        Ok(())
    }

    /// Register a writer.
    ///
    /// Legal in every stage before `Done`.
    pub fn register_writer<W: Writer>(&mut self, writer: W) -> Result<(), TinctError> {
        let name = writer.name().to_string();
        self.check_open(UnitCategory::Writer, &name)?;
        Self::check_name(&self.writers, UnitCategory::Writer, &name, |u| u.name())?;

        tracing::debug!(writer = %name, priority = writer.priority(), "registered");
        self.writers.push(Slot {
            unit: Rc::new(writer),
            progress: Progress::Pending,
        });
        sort_slots(&mut self.writers, |u| u.priority());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Stage execution
    // -------------------------------------------------------------------------

    fn ensure_intact(&self) -> Result<(), TinctError> {
        match &self.failure {
            Some(reason) => Err(TinctError::InvalidOperation(format!(
                "pipeline aborted by an earlier failure: {reason}"
            ))),
            None => Ok(()),
        }
    }

    fn record_failure(&mut self, result: Result<(), TinctError>) -> Result<(), TinctError> {
        if let Err(err) = &result {
            tracing::debug!(error = %err, "pipeline aborted");
            self.failure = Some(err.to_string());
        }
        result
    }

    fn wrap(category: UnitCategory, name: &str) -> impl FnOnce(TinctError) -> TinctError + '_ {
        move |source| TinctError::UnitFailed {
            category,
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    fn run_collectors(&mut self) -> Result<(), TinctError> {
        while let Some(index) = next_pending(&self.collectors) {
            let slot = &mut self.collectors[index];
            slot.progress = Progress::Running;
            let unit = Rc::clone(&slot.unit);
            let name = unit.name().to_string();

            tracing::debug!(collector = %name, "customize");
            unit.customize(self)
                .map_err(Self::wrap(UnitCategory::Collector, &name))?;
            let items = unit
                .collect_items()
                .map_err(Self::wrap(UnitCategory::Collector, &name))?
                .into_iter()
                .map(|item| item.with_origin(&name))
                .collect();

            // Registrations made during customize may have moved the slot.
            if let Some(slot) = self.collectors.iter_mut().find(|s| s.unit.name() == name) {
                slot.progress = Progress::Finished(items);
            }
        }
        Ok(())
    }

    fn finished_items(&self) -> SourceItems {
        SourceItems::new(
            self.collectors
                .iter()
                .filter_map(|slot| slot.progress.finished())
                .flatten()
                .cloned()
                .collect(),
        )
    }

    /// All source items, collecting on first use.
    ///
    /// While collection is in progress this returns the items of the
    /// collectors that have already finished.
    pub fn source_items(&mut self) -> Result<SourceItems, TinctError> {
        self.ensure_intact()?;
        if let Some(items) = &self.source_items {
            return Ok(items.clone());
        }
        if self.collecting {
            return Ok(self.finished_items());
        }

        self.collecting = true;
        let result = self.run_collectors();
        self.collecting = false;
        self.record_failure(result)?;

        let items = self.finished_items();
        tracing::debug!(items = items.len(), "collection complete");
        self.source_items = Some(items.clone());
        Ok(items)
    }

    fn run_formatters(&mut self, items: &SourceItems) -> Result<(), TinctError> {
        while let Some(index) = next_pending(&self.formatters) {
            let slot = &mut self.formatters[index];
            slot.progress = Progress::Running;
            let unit = Rc::clone(&slot.unit);
            let name = unit.name().to_string();

            tracing::debug!(formatter = %name, "format");
            let artifact = unit
                .format(items, self)
                .map_err(Self::wrap(UnitCategory::Formatter, &name))?
                .with_origin(&name);

            if let Some(slot) = self.formatters.iter_mut().find(|s| s.unit.name() == name) {
                slot.progress = Progress::Finished(artifact);
            }
        }
        Ok(())
    }

    fn finished_contents(&self) -> Contents {
        Contents::new(
            self.formatters
                .iter()
                .filter_map(|slot| slot.progress.finished())
                .cloned()
                .collect(),
        )
    }

    /// All formatted artifacts, formatting on first use.
    ///
    /// Moves the pipeline into `Formatting`, which closes collector
    /// registration.
    pub fn contents(&mut self) -> Result<Contents, TinctError> {
        self.ensure_intact()?;
        if let Some(contents) = &self.contents {
            return Ok(contents.clone());
        }
        if self.collecting {
            return Err(TinctError::InvalidOperation(
                "contents requested while collection is in progress".to_string(),
            ));
        }
        if self.formatting {
            return Ok(self.finished_contents());
        }

        let items = self.source_items()?;
        self.advance_to(Stage::Formatting);

        self.formatting = true;
        let result = self.run_formatters(&items);
        self.formatting = false;
        self.record_failure(result)?;

        let contents = self.finished_contents();
        tracing::debug!(artifacts = contents.len(), "formatting complete");
        self.contents = Some(contents.clone());
        Ok(contents)
    }

    fn run_writers(&mut self, contents: &Contents) -> Result<(), TinctError> {
        while let Some(index) = next_pending(&self.writers) {
            let slot = &mut self.writers[index];
            slot.progress = Progress::Running;
            let unit = Rc::clone(&slot.unit);
            let name = unit.name().to_string();

            tracing::debug!(writer = %name, "write");
            unit.write(contents, self)
                .map_err(Self::wrap(UnitCategory::Writer, &name))?;

            if let Some(slot) = self.writers.iter_mut().find(|s| s.unit.name() == name) {
                slot.progress = Progress::Finished(());
            }
        }
        Ok(())
    }

    /// Drive every stage to completion.
    ///
    /// Any unit failure aborts the run; nothing is retried. Once a unit has
    /// failed, every later `run`, `source_items` or `contents` call fails
    /// with `InvalidOperation`.
    pub fn run(&mut self) -> Result<RunSummary, TinctError> {
        self.ensure_intact()?;
        if self.stage >= Stage::Writing {
            return Err(TinctError::InvalidOperation(format!(
                "pipeline cannot run from stage {}",
                self.stage
            )));
        }

        let contents = self.contents()?;
        self.advance_to(Stage::Writing);
        let result = self.run_writers(&contents);
        self.record_failure(result)?;
        self.advance_to(Stage::Done);

        let summary = RunSummary {
            collectors: self.collectors.len(),
            formatters: self.formatters.len(),
            writers: self.writers.len(),
            items: self.source_items.as_ref().map_or(0, SourceItems::len),
            artifacts: contents.len(),
            diagnostics: self.diagnostics.len(),
        };
        tracing::info!(
            name = %self.metadata.name,
            items = summary.items,
            artifacts = summary.artifacts,
            diagnostics = summary.diagnostics,
            "pipeline finished"
        );
        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Registered collectors of type `T`, in priority order.
    pub fn get_sources<T: Collector>(&self, allow_empty: bool) -> Result<Vec<Rc<T>>, TinctError> {
        let found = self
            .collectors
            .iter()
            .filter_map(|slot| {
                let unit: Rc<dyn Any> = slot.unit.clone();
                unit.downcast::<T>().ok()
            })
            .collect();
        require(found, allow_empty, type_name::<T>())
    }

    /// Registered formatters of type `T`, in priority order.
    pub fn get_formatters<T: Formatter>(&self, allow_empty: bool) -> Result<Vec<Rc<T>>, TinctError> {
        let found = self
            .formatters
            .iter()
            .filter_map(|slot| {
                let unit: Rc<dyn Any> = slot.unit.clone();
                unit.downcast::<T>().ok()
            })
            .collect();
        require(found, allow_empty, type_name::<T>())
    }

    /// Registered writers of type `T`, in priority order.
    pub fn get_writers<T: Writer>(&self, allow_empty: bool) -> Result<Vec<Rc<T>>, TinctError> {
        let found = self
            .writers
            .iter()
            .filter_map(|slot| {
                let unit: Rc<dyn Any> = slot.unit.clone();
                unit.downcast::<T>().ok()
            })
            .collect();
        require(found, allow_empty, type_name::<T>())
    }

    /// Source items whose value is a `T`, collecting on first use.
    pub fn get_source_items<T: Any>(&mut self, allow_empty: bool) -> Result<Vec<Rc<T>>, TinctError> {
        let found = self
            .source_items()?
            .iter()
            .filter_map(Item::downcast::<T>)
            .collect();
        require(found, allow_empty, type_name::<T>())
    }

    /// Artifacts whose value is a `T`, formatting on first use.
    pub fn get_contents<T: Any>(&mut self, allow_empty: bool) -> Result<Vec<Rc<T>>, TinctError> {
        let found = self
            .contents()?
            .iter()
            .filter_map(Artifact::downcast::<T>)
            .collect();
        require(found, allow_empty, type_name::<T>())
    }

    /// Collector names in priority order.
    #[must_use]
    pub fn collector_names(&self) -> Vec<String> {
        self.collectors.iter().map(|s| s.unit.name().to_string()).collect()
    }

    /// Formatter names in priority order.
    #[must_use]
    pub fn formatter_names(&self) -> Vec<String> {
        self.formatters.iter().map(|s| s.unit.name().to_string()).collect()
    }

    /// Writer names in priority order.
    #[must_use]
    pub fn writer_names(&self) -> Vec<String> {
        self.writers.iter().map(|s| s.unit.name().to_string()).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

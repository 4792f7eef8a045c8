//! # Pipeline Units
//!
//! The three extension points of the pipeline and the opaque payloads that
//! flow between them.
//!
//! Units are shared behind `Rc` and only ever see `&self`. A unit that needs
//! to remember something across calls uses `Cell`/`RefCell`.

use super::Pipeline;
use crate::TinctError;
use serde::{Deserialize, Serialize};
use std::any::{Any, type_name};
use std::fmt;
use std::rc::Rc;

// =============================================================================
// UNIT TRAITS
// =============================================================================

/// Produces source items.
pub trait Collector: Any {
    /// Unique name among collectors.
    fn name(&self) -> &str;

    /// Execution priority; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Called once per run, before [`collect_items`](Self::collect_items).
    ///
    /// This is where assignments are made through a
    /// [`GroupResolver`](crate::GroupResolver) and where further units may
    /// be registered.
    fn customize(&self, pipeline: &mut Pipeline) -> Result<(), TinctError> {
        let _ = pipeline;
        Ok(())
    }

    /// Items contributed by this collector.
    fn collect_items(&self) -> Result<Vec<Item>, TinctError>;
}

/// Turns all source items into one artifact.
pub trait Formatter: Any {
    /// Unique name among formatters.
    fn name(&self) -> &str;

    /// Execution priority; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Called exactly once per run.
    fn format(&self, items: &SourceItems, pipeline: &mut Pipeline) -> Result<Artifact, TinctError>;
}

/// Consumes all artifacts for side effects.
pub trait Writer: Any {
    /// Unique name among writers.
    fn name(&self) -> &str;

    /// Execution priority; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Called exactly once per run.
    fn write(&self, contents: &Contents, pipeline: &mut Pipeline) -> Result<(), TinctError>;
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// An opaque item produced by a collector.
#[derive(Clone)]
pub struct Item {
    origin: String,
    type_name: &'static str,
    value: Rc<dyn Any>,
}

impl Item {
    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            origin: String::new(),
            type_name: type_name::<T>(),
            value: Rc::new(value),
        }
    }

    pub(crate) fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    /// Name of the collector that produced this item.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Borrow the value as `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Shared handle to the value as `T`.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.value).downcast::<T>().ok()
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("origin", &self.origin)
            .field("type", &self.type_name)
            .finish()
    }
}

/// The single output of one formatter.
#[derive(Clone)]
pub struct Artifact {
    origin: String,
    type_name: &'static str,
    value: Rc<dyn Any>,
}

impl Artifact {
    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            origin: String::new(),
            type_name: type_name::<T>(),
            value: Rc::new(value),
        }
    }

    pub(crate) fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    /// Name of the formatter that produced this artifact.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Borrow the value as `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Shared handle to the value as `T`.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.value).downcast::<T>().ok()
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("origin", &self.origin)
            .field("type", &self.type_name)
            .finish()
    }
}

/// Collected items in collector priority order.
#[derive(Debug, Clone, Default)]
pub struct SourceItems(Rc<[Item]>);

impl SourceItems {
    pub(crate) fn new(items: Vec<Item>) -> Self {
        Self(items.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.0.iter()
    }

    /// Items whose value is a `T`, in order.
    pub fn of_type<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.0.iter().filter_map(Item::get::<T>)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Formatted artifacts in formatter priority order.
#[derive(Debug, Clone, Default)]
pub struct Contents(Rc<[Artifact]>);

impl Contents {
    pub(crate) fn new(artifacts: Vec<Artifact>) -> Self {
        Self(artifacts.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.0.iter()
    }

    /// Artifacts whose value is a `T`, in order.
    pub fn of_type<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.0.iter().filter_map(Artifact::get::<T>)
    }

    /// The artifact produced by the named formatter.
    #[must_use]
    pub fn by_origin(&self, formatter: &str) -> Option<&Artifact> {
        self.0.iter().find(|artifact| artifact.origin() == formatter)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// Read-only descriptor of what the pipeline produces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub homepage: String,
}

impl PipelineMetadata {
    /// Create metadata with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_downcasts_to_its_own_type_only() {
        let item = Item::new("a".to_string());

        assert_eq!(item.get::<String>().map(String::as_str), Some("a"));
        assert!(item.get::<u32>().is_none());
        assert!(item.downcast::<String>().is_some());
    }

    #[test]
    fn source_items_filter_by_type() {
        let items = SourceItems::new(vec![
            Item::new(1_u32),
            Item::new("x".to_string()),
            Item::new(2_u32),
        ]);

        let numbers: Vec<_> = items.of_type::<u32>().copied().collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn contents_lookup_by_origin() {
        let contents = Contents::new(vec![
            Artifact::new("vim".to_string()).with_origin("vim"),
            Artifact::new("{}".to_string()).with_origin("json"),
        ]);

        let json = contents.by_origin("json").and_then(Artifact::get::<String>);
        assert_eq!(json.map(String::as_str), Some("{}"));
        assert!(contents.by_origin("missing").is_none());
    }

    #[test]
    fn metadata_builder() {
        let meta = PipelineMetadata::new("dusk")
            .with_version("1.0.0")
            .with_author("tinct")
            .with_description("a dark theme");

        assert_eq!(meta.name, "dusk");
        assert_eq!(meta.version, "1.0.0");
        assert!(meta.license.is_empty());
    }
}

//! # Identity Store
//!
//! Canonicalizing registry that maps arbitrary values to dense [`Handle`]s.
//!
//! - Structurally equal values collapse to one handle
//! - Values of different runtime types never collapse, even when their
//!   textual forms collide (`"1"` vs `1`)
//! - Handles are assigned in first-save order and never reused

use crate::{Handle, TinctError};
use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

// =============================================================================
// IDENTITY KEY
// =============================================================================

/// Derived structural identity of a stored value.
///
/// Combines the runtime type, the canonical `Debug` rendering and a value
/// hash. Ordering is by type name first so that iteration over the index
/// is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdentityKey {
    type_name: &'static str,
    type_id: TypeId,
    repr: String,
    hash: u64,
}

impl IdentityKey {
    /// Derive the key for a value.
    #[must_use]
    pub fn of<T: Any + fmt::Debug + Hash>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        Self {
            type_name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            repr: format!("{value:?}"),
            hash: hasher.finish(),
        }
    }

    /// Fully-qualified type name of the keyed value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// =============================================================================
// IDENTITY STORE
// =============================================================================

struct Entry {
    value: Box<dyn Any>,
    type_name: &'static str,
}

/// The identity store.
///
/// Single-threaded and scoped to one [`GroupResolver`](crate::GroupResolver).
#[derive(Default)]
pub struct IdentityStore {
    entries: Vec<Entry>,
    index: BTreeMap<IdentityKey, Handle>,
}

impl fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStore")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl IdentityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a value and return its handle.
    ///
    /// If a value with an equal derived key was saved before, the existing
    /// handle is returned and `value` is dropped.
    pub fn save<T: Any + fmt::Debug + Hash>(&mut self, value: T) -> Handle {
        let key = IdentityKey::of(&value);
        if let Some(&handle) = self.index.get(&key) {
            return handle;
        }

        let handle = Handle(self.entries.len());
        self.entries.push(Entry {
            value: Box::new(value),
            type_name: key.type_name(),
        });
        self.index.insert(key, handle);
        handle
    }

    /// Look up the handle of a value without saving it.
    #[must_use]
    pub fn find<T: Any + fmt::Debug + Hash>(&self, value: &T) -> Option<Handle> {
        self.index.get(&IdentityKey::of(value)).copied()
    }

    /// Load the stored value and its declared type name.
    pub fn load(&self, handle: Handle) -> Result<(&dyn Any, &'static str), TinctError> {
        let entry = self
            .entries
            .get(handle.index())
            .ok_or(TinctError::OutOfRange(handle))?;
        Ok((&*entry.value, entry.type_name))
    }

    /// Load the stored value as `T`.
    ///
    /// Returns `None` both for unassigned handles and for type mismatches.
    #[must_use]
    pub fn try_load<T: Any>(&self, handle: Handle) -> Option<&T> {
        self.entries
            .get(handle.index())
            .and_then(|entry| entry.value.downcast_ref::<T>())
    }

    /// Load the stored value as `T`, failing loudly on misuse.
    pub fn load_as<T: Any>(&self, handle: Handle) -> Result<&T, TinctError> {
        let (value, found) = self.load(handle)?;
        value.downcast_ref::<T>().ok_or(TinctError::TypeMismatch {
            handle,
            expected: type_name::<T>(),
            found,
        })
    }

    /// Declared type name of a stored value.
    #[must_use]
    pub fn type_name(&self, handle: Handle) -> Option<&'static str> {
        self.entries.get(handle.index()).map(|entry| entry.type_name)
    }

    /// All assigned handles in assignment order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        (0..self.entries.len()).map(Handle)
    }

    /// Number of distinct values saved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Group Resolver
//!
//! Turns `set(group, value)` and `link(from, to)` assignments into resolved
//! `(group, value)` pairs.
//!
//! Backed by one [`IdentityStore`] and one [`SingleLinkGraph`]: groups and
//! values are saved as handles, assignments become edges. Resolution walks
//! the graph in topological order, so alias targets are always resolved
//! before the aliases that point at them.
//!
//! Duplicate assignments are non-fatal: the first assignment wins and a
//! `DuplicateAssignment` diagnostic is recorded.

use crate::{Diagnostics, Handle, IdentityStore, SingleLinkGraph, TinctError};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Classification of a stored node, decided once per lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a, G, V> {
    /// A group key.
    Group(&'a G),
    /// A terminal value.
    Terminal(&'a V),
    /// Something else, named by its type.
    Foreign(&'static str),
}

/// Resolver over group keys `G` and terminal values `V`.
///
/// `G` and `V` must be distinct types; the runtime type is what tells a
/// group from a value.
pub struct GroupResolver<G, V> {
    store: IdentityStore,
    graph: SingleLinkGraph,
    diagnostics: Diagnostics,
    _marker: PhantomData<fn() -> (G, V)>,
}

impl<G, V> Debug for GroupResolver<G, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupResolver")
            .field("store", &self.store)
            .field("edges", &self.graph.edge_count())
            .finish_non_exhaustive()
    }
}

impl<G, V> Default for GroupResolver<G, V>
where
    G: Any + Debug + Hash + Clone,
    V: Any + Debug + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G, V> GroupResolver<G, V>
where
    G: Any + Debug + Hash + Clone,
    V: Any + Debug + Hash + Clone,
{
    /// Create a resolver with its own diagnostics sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_diagnostics(Diagnostics::new())
    }

    /// Create a resolver reporting into a shared sink.
    #[must_use]
    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            store: IdentityStore::new(),
            graph: SingleLinkGraph::new(),
            diagnostics,
            _marker: PhantomData,
        }
    }

    /// Assign a terminal value to a group.
    ///
    /// Returns `false` if the group was already assigned; the earlier
    /// assignment is kept.
    pub fn set(&mut self, group: G, value: V) -> bool {
        let from = self.store.save(group.clone());
        let to = self.store.save(value);
        self.assign(from, to, &group)
    }

    /// Alias `from` to another group.
    ///
    /// Same duplicate handling as [`set`](Self::set).
    pub fn link(&mut self, from: G, to: G) -> bool {
        let from_handle = self.store.save(from.clone());
        let to_handle = self.store.save(to);
        self.assign(from_handle, to_handle, &from)
    }

    fn assign(&mut self, from: Handle, to: Handle, group: &G) -> bool {
        if self.graph.create_link(from, to, false) {
            return true;
        }
        self.diagnostics.duplicate_assignment(format!("{group:?}"));
        false
    }

    /// Classify a stored node.
    pub fn classify(&self, handle: Handle) -> Result<NodeKind<'_, G, V>, TinctError> {
        let (value, type_name) = self.store.load(handle)?;
        if let Some(group) = value.downcast_ref::<G>() {
            return Ok(NodeKind::Group(group));
        }
        if let Some(terminal) = value.downcast_ref::<V>() {
            return Ok(NodeKind::Terminal(terminal));
        }
        Ok(NodeKind::Foreign(type_name))
    }

    /// Resolve every assigned group to its terminal value.
    ///
    /// Pairs come out in topological order: a group is yielded only after
    /// the group it aliases. Fails with `CycleDetected` on alias cycles and
    /// `UnresolvedGroup` when an alias ends at an unassigned group.
    pub fn collect_resolved(&self) -> Result<Vec<(G, V)>, TinctError> {
        let order = self.graph.topological_order()?;
        let mut resolved: BTreeMap<Handle, &V> = BTreeMap::new();
        let mut pairs = Vec::new();

        for node in order {
            let NodeKind::Group(group) = self.classify(node)? else {
                continue;
            };
            let Some(target) = self.graph.get_link(node) else {
                continue;
            };

            let value = match self.classify(target)? {
                NodeKind::Terminal(value) => value,
                NodeKind::Group(_) | NodeKind::Foreign(_) => match resolved.get(&target) {
                    Some(value) => *value,
                    None => return Err(TinctError::UnresolvedGroup(format!("{group:?}"))),
                },
            };

            resolved.insert(node, value);
            pairs.push((group.clone(), value.clone()));
        }

        Ok(pairs)
    }

    /// Resolve a single group.
    ///
    /// `Ok(None)` if the group was never assigned.
    pub fn resolve(&self, group: &G) -> Result<Option<V>, TinctError> {
        let Some(handle) = self.store.find(group) else {
            return Ok(None);
        };
        if self.graph.get_link(handle).is_none() {
            return Ok(None);
        }

        let terminal = self.graph.terminal(handle)?;
        match self.classify(terminal)? {
            NodeKind::Terminal(value) => Ok(Some(value.clone())),
            NodeKind::Group(_) | NodeKind::Foreign(_) => {
                Err(TinctError::UnresolvedGroup(format!("{group:?}")))
            }
        }
    }

    /// Every group known to the resolver, assigned or merely referenced.
    #[must_use]
    pub fn groups(&self) -> Vec<&G> {
        self.store
            .handles()
            .filter_map(|handle| self.store.try_load::<G>(handle))
            .collect()
    }

    /// Check if `group` has an assignment of its own.
    #[must_use]
    pub fn is_assigned(&self, group: &G) -> bool {
        self.store
            .find(group)
            .is_some_and(|handle| self.graph.get_link(handle).is_some())
    }

    /// The sink duplicate assignments are reported to.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Read access to the underlying identity store.
    #[must_use]
    pub fn identity(&self) -> &IdentityStore {
        &self.store
    }

    /// Read access to the underlying graph.
    #[must_use]
    pub fn graph(&self) -> &SingleLinkGraph {
        &self.graph
    }
}

// =============================================================================
// TESTS
// =============================================================================

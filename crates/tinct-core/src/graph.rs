//! # Single-Link Graph
//!
//! Directed graph where every node has at most one outgoing edge.
//!
//! Nodes are [`Handle`]s. A node without an outgoing edge is a terminal.
//! Storage is a dense `Vec<Option<Handle>>` that grows lazily to cover the
//! largest index ever linked.

use crate::{Handle, TinctError};
use std::collections::BTreeSet;

/// The single-link graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleLinkGraph {
    /// Outgoing edge per node index.
    links: Vec<Option<Handle>>,
}

impl SingleLinkGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn grow_to(&mut self, index: usize) {
        if index >= self.links.len() {
            self.links.resize(index.saturating_add(1), None);
        }
    }

    /// Create the edge `from -> to`.
    ///
    /// Returns `false` without mutating anything if `from` already has an
    /// outgoing edge and `overwrite` is not set, or if either handle is
    /// above [`Handle::MAX_INDEX`].
    pub fn create_link(&mut self, from: Handle, to: Handle, overwrite: bool) -> bool {
        if !from.is_linkable() || !to.is_linkable() {
            tracing::debug!(%from, %to, "link refused: index above limit");
            return false;
        }
        self.grow_to(from.index().max(to.index()));
        let slot = &mut self.links[from.index()];
        if slot.is_some() && !overwrite {
            return false;
        }
        *slot = Some(to);
        true
    }

    /// Signed-index variant of [`create_link`](Self::create_link).
    pub fn create_link_at(&mut self, from: i64, to: i64, overwrite: bool) -> Result<bool, TinctError> {
        let from = Handle::from_index(from)?;
        let to = Handle::from_index(to)?;
        Ok(self.create_link(from, to, overwrite))
    }

    /// Remove the outgoing edge of `from`, returning the old target.
    pub fn remove_link(&mut self, from: Handle) -> Option<Handle> {
        self.links.get_mut(from.index()).and_then(Option::take)
    }

    /// Outgoing edge of `from`, if any.
    #[must_use]
    pub fn get_link(&self, from: Handle) -> Option<Handle> {
        self.links.get(from.index()).copied().flatten()
    }

    /// Signed-index variant of [`get_link`](Self::get_link).
    pub fn get_link_at(&self, from: i64) -> Result<Option<Handle>, TinctError> {
        Ok(self.get_link(Handle::from_index(from)?))
    }

    /// All edges in ascending order of their source.
    pub fn edges(&self) -> impl Iterator<Item = (Handle, Handle)> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(from, to)| to.map(|to| (Handle(from), to)))
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.links.iter().filter(|link| link.is_some()).count()
    }

    /// Mark every node that has an outgoing edge or is the target of one.
    fn participants(&self) -> Vec<bool> {
        let mut participating = vec![false; self.links.len()];
        for (from, to) in self.edges() {
            participating[from.index()] = true;
            participating[to.index()] = true;
        }
        participating
    }

    /// Check if a node has an edge or is referenced by one.
    #[must_use]
    pub fn contains_node(&self, node: Handle) -> bool {
        self.get_link(node).is_some() || self.edges().any(|(_, to)| to == node)
    }

    /// Number of nodes that have an edge or are referenced by one.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.participants().into_iter().filter(|p| *p).count()
    }

    /// Order every participating node so that each edge target precedes
    /// its source.
    ///
    /// Iterative depth-first walk with an explicit stack. Roots are taken in
    /// ascending handle order. Reaching a node that is still on the stack
    /// fails with `CycleDetected`, carrying the cycle path.
    pub fn topological_order(&self) -> Result<Vec<Handle>, TinctError> {
        let participating = self.participants();
        let len = self.links.len();
        let mut visited = vec![false; len];
        let mut on_stack = vec![false; len];
        let mut order = Vec::with_capacity(len);
        let mut stack: Vec<Handle> = Vec::new();

        for root in (0..len).map(Handle) {
            if !participating[root.index()] || visited[root.index()] {
                continue;
            }

            stack.push(root);
            on_stack[root.index()] = true;

            while let Some(&top) = stack.last() {
                match self.links[top.index()] {
                    Some(next) if !visited[next.index()] => {
                        if on_stack[next.index()] {
                            let start = stack.iter().position(|h| *h == next).unwrap_or(0);
                            let mut path = stack[start..].to_vec();
                            path.push(next);
                            return Err(TinctError::CycleDetected { path });
                        }
                        on_stack[next.index()] = true;
                        stack.push(next);
                    }
                    _ => {
                        stack.pop();
                        on_stack[top.index()] = false;
                        visited[top.index()] = true;
                        order.push(top);
                    }
                }
            }
        }

        Ok(order)
    }

    /// Resolution chain starting at `from`, ending at its terminal.
    ///
    /// The chain always contains `from` itself.
    pub fn chain(&self, from: Handle) -> Result<Vec<Handle>, TinctError> {
        let mut seen = BTreeSet::new();
        let mut path = vec![from];
        seen.insert(from);

        let mut current = from;
        while let Some(next) = self.get_link(current) {
            path.push(next);
            if !seen.insert(next) {
                let start = path.iter().position(|h| *h == next).unwrap_or(0);
                return Err(TinctError::CycleDetected {
                    path: path[start..].to_vec(),
                });
            }
            current = next;
        }

        Ok(path)
    }

    /// Terminal node reached by following edges from `from`.
    pub fn terminal(&self, from: Handle) -> Result<Handle, TinctError> {
        let chain = self.chain(from)?;
        Ok(chain.last().copied().unwrap_or(from))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[Handle], node: Handle) -> usize {
        order.iter().position(|h| *h == node).expect("node in order")
    }

    #[test]
    fn create_link_twice_keeps_first() {
        let mut graph = SingleLinkGraph::new();

        assert!(graph.create_link(Handle(1), Handle(2), false));
        assert!(!graph.create_link(Handle(1), Handle(3), false));
        assert_eq!(graph.get_link(Handle(1)), Some(Handle(2)));
    }

    #[test]
    fn overwrite_replaces_edge() {
        let mut graph = SingleLinkGraph::new();

        assert!(graph.create_link(Handle(1), Handle(2), false));
        assert!(graph.create_link(Handle(1), Handle(3), true));
        assert_eq!(graph.get_link(Handle(1)), Some(Handle(3)));
    }

    #[test]
    fn negative_indices_are_invalid() {
        let mut graph = SingleLinkGraph::new();

        assert!(matches!(
            graph.create_link_at(-1, 2, false),
            Err(TinctError::InvalidArgument(_))
        ));
        assert!(matches!(
            graph.create_link_at(2, -5, false),
            Err(TinctError::InvalidArgument(_))
        ));
        assert!(matches!(
            graph.get_link_at(-3),
            Err(TinctError::InvalidArgument(_))
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn oversized_indices_are_refused_without_allocating() {
        let mut graph = SingleLinkGraph::new();

        assert!(matches!(
            graph.create_link_at(i64::MAX, 0, false),
            Err(TinctError::InvalidArgument(_))
        ));
        assert!(matches!(
            graph.get_link_at(i64::MAX),
            Err(TinctError::InvalidArgument(_))
        ));
        assert!(!graph.create_link(Handle(usize::MAX), Handle(0), false));
        assert!(!graph.create_link(Handle(0), Handle(Handle::MAX_INDEX + 1), true));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn unassigned_nodes_have_no_link() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(0), Handle(10), false);

        assert_eq!(graph.get_link(Handle(5)), None);
        assert_eq!(graph.get_link(Handle(10)), None);
        assert_eq!(graph.get_link(Handle(500)), None);
        assert_eq!(graph.get_link_at(500).expect("valid"), None);
    }

    #[test]
    fn topological_order_puts_targets_first() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(0), Handle(1), false);
        graph.create_link(Handle(2), Handle(0), false);
        graph.create_link(Handle(4), Handle(3), false);

        let order = graph.topological_order().expect("acyclic");

        assert_eq!(order.len(), 5);
        for (from, to) in graph.edges() {
            assert!(position(&order, to) < position(&order, from));
        }
    }

    #[test]
    fn topological_order_skips_sparse_gaps() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(7), Handle(2), false);

        let order = graph.topological_order().expect("acyclic");
        assert_eq!(order, vec![Handle(2), Handle(7)]);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn three_node_cycle_is_detected() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(1), Handle(2), false);
        graph.create_link(Handle(2), Handle(3), false);
        graph.create_link(Handle(3), Handle(1), false);

        let err = graph.topological_order().expect_err("cycle");
        assert!(matches!(
            err,
            TinctError::CycleDetected { ref path }
                if *path == vec![Handle(1), Handle(2), Handle(3), Handle(1)]
        ));
    }

    #[test]
    fn self_link_is_a_cycle() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(0), Handle(0), false);

        assert!(matches!(
            graph.topological_order(),
            Err(TinctError::CycleDetected { .. })
        ));
    }

    #[test]
    fn cycle_reached_from_a_tail_is_detected() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(0), Handle(1), false);
        graph.create_link(Handle(1), Handle(2), false);
        graph.create_link(Handle(2), Handle(1), false);

        assert!(matches!(
            graph.topological_order(),
            Err(TinctError::CycleDetected { .. })
        ));
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let mut graph = SingleLinkGraph::new();
        let size = 200_000;
        for i in 0..size {
            graph.create_link(Handle(i + 1), Handle(i), false);
        }

        let order = graph.topological_order().expect("acyclic");
        assert_eq!(order.len(), size + 1);
        assert_eq!(order.first(), Some(&Handle(0)));
        assert_eq!(order.last(), Some(&Handle(size)));
    }

    #[test]
    fn chain_walks_to_terminal() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(3), Handle(1), false);
        graph.create_link(Handle(1), Handle(0), false);

        assert_eq!(
            graph.chain(Handle(3)).expect("chain"),
            vec![Handle(3), Handle(1), Handle(0)]
        );
        assert_eq!(graph.terminal(Handle(3)).expect("terminal"), Handle(0));
        assert_eq!(graph.terminal(Handle(9)).expect("terminal"), Handle(9));
    }

    #[test]
    fn remove_link_clears_edge() {
        let mut graph = SingleLinkGraph::new();
        graph.create_link(Handle(0), Handle(1), false);

        assert_eq!(graph.remove_link(Handle(0)), Some(Handle(1)));
        assert_eq!(graph.get_link(Handle(0)), None);
        assert!(!graph.contains_node(Handle(1)));
        assert!(graph.create_link(Handle(0), Handle(2), false));
    }
}

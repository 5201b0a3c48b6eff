use std::sync::Arc;

use super::ReasonGraph;

/// Atomic holder for the latest sanitized snapshot.
///
/// `apply` is the only way a snapshot becomes visible; it sanitizes the
/// incoming graph and replaces the previous one wholesale. Consumers hold
/// `Arc`s, so an old snapshot stays valid (and immutable) for as long as
/// anyone is still rendering it. Replacement is the whole contract: there is
/// no merging of old and new state, by design - a delta protocol would be a
/// producer-side change, not a client-side merge.
#[derive(Debug, Default)]
pub struct GraphStore {
    current: Option<Arc<ReasonGraph>>,
}

impl GraphStore {
    /// Empty store; `current()` is `None` until the first `apply`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize and install a replacement snapshot, returning the shared
    /// reference now exposed to consumers.
    pub fn apply(&mut self, mut graph: ReasonGraph) -> Arc<ReasonGraph> {
        graph.sanitize();
        let snapshot = Arc::new(graph);
        self.current = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// The latest snapshot, if any event has been accepted yet.
    pub fn current(&self) -> Option<Arc<ReasonGraph>> {
        self.current.clone()
    }

    /// Discard the held snapshot (stop/teardown path).
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeKind, Node, NodeKind, NodeStatus};

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            kind: NodeKind::Planner,
            label: id.to_string(),
            status: NodeStatus::Pending,
            confidence: 0.5,
            timestamp: None,
            position: Default::default(),
            data: None,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            kind: EdgeKind::ReasoningFlow,
            confidence: 0.9,
            data_flow: None,
        }
    }

    #[test]
    fn test_store_starts_empty() {
        let store = GraphStore::new();
        assert!(store.current().is_none());
    }

    #[test]
    fn test_apply_replaces_wholesale() {
        let mut store = GraphStore::new();
        store.apply(ReasonGraph {
            nodes: vec![node("a"), node("b")],
            ..Default::default()
        });
        let second = store.apply(ReasonGraph {
            nodes: vec![node("c")],
            ..Default::default()
        });
        // No merge: only the new snapshot's content survives.
        assert_eq!(second.nodes.len(), 1);
        assert_eq!(second.nodes[0].id, "c");
        assert_eq!(store.current().unwrap().nodes[0].id, "c");
    }

    #[test]
    fn test_apply_sanitizes_dangling_edges() {
        let mut store = GraphStore::new();
        let snapshot = store.apply(ReasonGraph {
            nodes: vec![node("a"), node("b")],
            edges: vec![edge("e1", "a", "b"), edge("e2", "a", "ghost")],
            ..Default::default()
        });
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.edges[0].id, "e1");
    }

    #[test]
    fn test_old_snapshot_survives_replacement() {
        let mut store = GraphStore::new();
        let first = store.apply(ReasonGraph {
            nodes: vec![node("a")],
            ..Default::default()
        });
        store.apply(ReasonGraph::default());
        // A consumer still holding the old Arc sees unchanged data.
        assert_eq!(first.nodes[0].id, "a");
    }

    #[test]
    fn test_clear_discards_snapshot() {
        let mut store = GraphStore::new();
        store.apply(ReasonGraph::default());
        store.clear();
        assert!(store.current().is_none());
    }
}

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{edge_color, node_color, node_emission, Color, Vec3};
use crate::config::SceneConfig;
use crate::graph::{NodeKind, NodeStatus, ReasonGraph};

/// One renderable node: a sphere at the engine-assigned position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePrimitive {
    /// Originating node id.
    pub id: String,
    /// Node kind, kept for frontend pick/hover handling.
    pub kind: NodeKind,
    /// Node status at build time.
    pub status: NodeStatus,
    /// Display label.
    pub label: String,
    /// World-space center.
    pub position: Vec3,
    /// Fill color from the `(kind, status)` palette.
    pub color: Color,
    /// Emission strength; non-zero only while active.
    pub emission: f32,
    /// Uniform scale, including the pulse of an active node.
    pub scale: f32,
}

/// One renderable edge: a line between two resolved node centers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePrimitive {
    /// Originating edge id.
    pub id: String,
    /// Line start (source node center).
    pub start: Vec3,
    /// Line end (target node center).
    pub end: Vec3,
    /// Line color by edge kind.
    pub color: Color,
    /// Line opacity derived from edge confidence.
    pub opacity: f32,
}

/// A complete frame description, rebuilt from scratch for every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub nodes: Vec<NodePrimitive>,
    pub edges: Vec<EdgePrimitive>,
}

impl Scene {
    /// Project a snapshot into primitives at animation time `elapsed`.
    ///
    /// The output contains nothing but this snapshot's content; callers
    /// replace their previous frame wholesale, which is what keeps stale
    /// primitives from surviving a snapshot change. Edges whose endpoints do
    /// not resolve are skipped (the model layer already drops them, but a
    /// renderer must tolerate one anyway).
    pub fn build(graph: &ReasonGraph, config: &SceneConfig, elapsed: Duration) -> Scene {
        let mut positions: HashMap<&str, Vec3> = HashMap::with_capacity(graph.nodes.len());

        let nodes = graph
            .nodes
            .iter()
            .map(|node| {
                let position = Vec3::from(node.position);
                positions.insert(node.id.as_str(), position);
                NodePrimitive {
                    id: node.id.clone(),
                    kind: node.kind,
                    status: node.status,
                    label: node.label.clone(),
                    position,
                    color: node_color(node.kind, node.status),
                    emission: node_emission(node.status),
                    scale: if node.status == NodeStatus::Active {
                        pulse_scale(elapsed, config)
                    } else {
                        1.0
                    },
                }
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .filter_map(|edge| {
                let (start, end) = match (
                    positions.get(edge.source.as_str()),
                    positions.get(edge.target.as_str()),
                ) {
                    (Some(&s), Some(&t)) => (s, t),
                    _ => {
                        warn!(edge = %edge.id, "Skipping edge with unresolved endpoint");
                        return None;
                    }
                };
                Some(EdgePrimitive {
                    id: edge.id.clone(),
                    start,
                    end,
                    color: edge_color(edge.kind),
                    opacity: 0.3 + 0.7 * edge.confidence as f32,
                })
            })
            .collect();

        Scene { nodes, edges }
    }
}

/// Scale of an active node at animation time `elapsed`.
///
/// Oscillates around 1.0 with the configured period and amplitude; a node
/// that leaves the active state is built with scale 1.0 again, which is how
/// the pulse stops.
pub fn pulse_scale(elapsed: Duration, config: &SceneConfig) -> f32 {
    let period = Duration::from_millis(config.pulse_period_ms.max(1));
    let phase = elapsed.as_secs_f32() / period.as_secs_f32();
    1.0 + config.pulse_amplitude * (phase * TAU).sin()
}

/// Node-level changes between two consecutive snapshots.
///
/// Computed by comparing snapshot references, never by observing mutation -
/// snapshots are immutable. Used to gate camera auto-rotation and available
/// to frontends for incremental buffer updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDiff {
    /// Ids present in `next` but not in `prev`.
    pub added: Vec<String>,
    /// Ids present in `prev` but not in `next`.
    pub removed: Vec<String>,
    /// Ids whose status changed, with (old, new).
    pub status_changed: Vec<(String, NodeStatus, NodeStatus)>,
}

impl SceneDiff {
    /// Diff `prev` against `next`; `prev = None` marks everything added.
    pub fn between(prev: Option<&ReasonGraph>, next: &ReasonGraph) -> SceneDiff {
        let mut diff = SceneDiff::default();

        let prev_status: HashMap<&str, NodeStatus> = prev
            .map(|g| g.nodes.iter().map(|n| (n.id.as_str(), n.status)).collect())
            .unwrap_or_default();

        for node in &next.nodes {
            match prev_status.get(node.id.as_str()) {
                None => diff.added.push(node.id.clone()),
                Some(&old) if old != node.status => {
                    diff.status_changed.push((node.id.clone(), old, node.status));
                }
                Some(_) => {}
            }
        }

        if let Some(prev) = prev {
            for node in &prev.nodes {
                if next.node(&node.id).is_none() {
                    diff.removed.push(node.id.clone());
                }
            }
        }

        diff
    }

    /// Whether any node just entered the active state.
    pub fn any_activated(&self) -> bool {
        self.status_changed
            .iter()
            .any(|(_, _, new)| *new == NodeStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeKind, Node, Position};

    fn node(id: &str, status: NodeStatus, position: Position) -> Node {
        Node {
            id: id.to_string(),
            kind: NodeKind::Solver,
            label: id.to_string(),
            status,
            confidence: 0.5,
            timestamp: None,
            position,
            data: None,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            kind: EdgeKind::ReasoningFlow,
            confidence: 1.0,
            data_flow: None,
        }
    }

    fn pos(x: f32, y: f32, z: f32) -> Position {
        Position { x, y, z }
    }

    #[test]
    fn test_build_places_nodes_at_server_positions() {
        let graph = ReasonGraph {
            nodes: vec![node("a", NodeStatus::Pending, pos(1.0, 2.0, 3.0))],
            ..Default::default()
        };
        let scene = Scene::build(&graph, &SceneConfig::default(), Duration::ZERO);
        assert_eq!(scene.nodes.len(), 1);
        assert_eq!(scene.nodes[0].position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_build_resolves_edge_endpoints() {
        let graph = ReasonGraph {
            nodes: vec![
                node("a", NodeStatus::Completed, pos(0.0, 0.0, 0.0)),
                node("b", NodeStatus::Active, pos(5.0, 0.0, 0.0)),
            ],
            edges: vec![edge("e", "a", "b")],
            ..Default::default()
        };
        let scene = Scene::build(&graph, &SceneConfig::default(), Duration::ZERO);
        assert_eq!(scene.edges.len(), 1);
        assert_eq!(scene.edges[0].start, Vec3::ZERO);
        assert_eq!(scene.edges[0].end, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_build_skips_unresolved_edges_without_panicking() {
        // The model layer drops these, but the renderer tolerates them too.
        let graph = ReasonGraph {
            nodes: vec![node("a", NodeStatus::Completed, pos(0.0, 0.0, 0.0))],
            edges: vec![edge("dangling", "a", "ghost")],
            ..Default::default()
        };
        let scene = Scene::build(&graph, &SceneConfig::default(), Duration::ZERO);
        assert!(scene.edges.is_empty());
    }

    #[test]
    fn test_only_active_nodes_pulse() {
        let config = SceneConfig::default();
        // A quarter period in: sin is at its peak.
        let quarter = Duration::from_millis(config.pulse_period_ms / 4);
        let graph = ReasonGraph {
            nodes: vec![
                node("active", NodeStatus::Active, pos(0.0, 0.0, 0.0)),
                node("done", NodeStatus::Completed, pos(1.0, 0.0, 0.0)),
            ],
            ..Default::default()
        };
        let scene = Scene::build(&graph, &config, quarter);
        assert!((scene.nodes[0].scale - (1.0 + config.pulse_amplitude)).abs() < 1e-3);
        assert_eq!(scene.nodes[1].scale, 1.0);
    }

    #[test]
    fn test_pulse_stops_when_status_leaves_active() {
        let config = SceneConfig::default();
        let t = Duration::from_millis(300);
        let mut graph = ReasonGraph {
            nodes: vec![node("a", NodeStatus::Active, pos(0.0, 0.0, 0.0))],
            ..Default::default()
        };
        assert_ne!(Scene::build(&graph, &config, t).nodes[0].scale, 1.0);
        graph.nodes[0].status = NodeStatus::Completed;
        assert_eq!(Scene::build(&graph, &config, t).nodes[0].scale, 1.0);
    }

    #[test]
    fn test_rebuild_contains_only_current_snapshot() {
        let config = SceneConfig::default();
        let first = ReasonGraph {
            nodes: vec![
                node("old-1", NodeStatus::Completed, pos(0.0, 0.0, 0.0)),
                node("old-2", NodeStatus::Completed, pos(1.0, 0.0, 0.0)),
            ],
            ..Default::default()
        };
        let second = ReasonGraph {
            nodes: vec![node("new", NodeStatus::Pending, pos(2.0, 0.0, 0.0))],
            ..Default::default()
        };
        let _ = Scene::build(&first, &config, Duration::ZERO);
        let scene = Scene::build(&second, &config, Duration::ZERO);
        let ids: Vec<&str> = scene.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new"]);
    }

    #[test]
    fn test_diff_reports_status_changes() {
        let prev = ReasonGraph {
            nodes: vec![node("a", NodeStatus::Pending, pos(0.0, 0.0, 0.0))],
            ..Default::default()
        };
        let next = ReasonGraph {
            nodes: vec![
                node("a", NodeStatus::Active, pos(0.0, 0.0, 0.0)),
                node("b", NodeStatus::Pending, pos(1.0, 0.0, 0.0)),
            ],
            ..Default::default()
        };
        let diff = SceneDiff::between(Some(&prev), &next);
        assert_eq!(diff.added, vec!["b".to_string()]);
        assert!(diff.removed.is_empty());
        assert_eq!(
            diff.status_changed,
            vec![("a".to_string(), NodeStatus::Pending, NodeStatus::Active)]
        );
        assert!(diff.any_activated());
    }

    #[test]
    fn test_diff_from_empty_marks_all_added() {
        let next = ReasonGraph {
            nodes: vec![node("a", NodeStatus::Pending, pos(0.0, 0.0, 0.0))],
            ..Default::default()
        };
        let diff = SceneDiff::between(None, &next);
        assert_eq!(diff.added.len(), 1);
        assert!(!diff.any_activated());
    }
}

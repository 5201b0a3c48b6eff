use serde::{Deserialize, Serialize};

use crate::graph::{EdgeKind, NodeKind, NodeStatus};

/// Linear RGB color handed to the render frontend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Darken toward black by `factor` in [0, 1].
    pub fn dimmed(self, factor: f32) -> Self {
        Color::rgb(self.r * factor, self.g * factor, self.b * factor)
    }
}

/// Distinct failure color; overrides every kind-specific color.
pub const FAILED_COLOR: Color = Color::rgb(0.86, 0.13, 0.13);

const GUARDRAIL_COLOR: Color = Color::rgb(0.95, 0.61, 0.07);
const PLANNER_COLOR: Color = Color::rgb(0.23, 0.51, 0.96);
const SOLVER_COLOR: Color = Color::rgb(0.06, 0.73, 0.51);
const VERIFIER_COLOR: Color = Color::rgb(0.55, 0.36, 0.96);
const ETHICAL_COLOR: Color = Color::rgb(0.93, 0.84, 0.25);
const REJECT_COLOR: Color = Color::rgb(0.61, 0.15, 0.15);

const REASONING_FLOW_COLOR: Color = Color::rgb(0.58, 0.64, 0.72);
const GUARDRAIL_CHECK_COLOR: Color = Color::rgb(0.95, 0.61, 0.07);
const REJECT_EDGE_COLOR: Color = Color::rgb(0.86, 0.13, 0.13);
const DATA_FLOW_COLOR: Color = Color::rgb(0.13, 0.75, 0.83);

const PENDING_DIM: f32 = 0.35;

/// Base color of a node kind.
fn kind_color(kind: NodeKind) -> Color {
    match kind {
        NodeKind::Guardrail => GUARDRAIL_COLOR,
        NodeKind::Planner => PLANNER_COLOR,
        NodeKind::Solver => SOLVER_COLOR,
        NodeKind::Verifier => VERIFIER_COLOR,
        NodeKind::Ethical => ETHICAL_COLOR,
        NodeKind::Reject => REJECT_COLOR,
    }
}

/// Fill color for a `(kind, status)` pair.
///
/// `Failed` always wins regardless of kind; `Pending` nodes are dimmed,
/// `Active` and `Completed` show the kind's base color.
pub fn node_color(kind: NodeKind, status: NodeStatus) -> Color {
    match status {
        NodeStatus::Failed => FAILED_COLOR,
        NodeStatus::Pending => kind_color(kind).dimmed(PENDING_DIM),
        NodeStatus::Active | NodeStatus::Completed => kind_color(kind),
    }
}

/// Emission strength for a `(kind, status)` pair; only active nodes glow.
pub fn node_emission(status: NodeStatus) -> f32 {
    match status {
        NodeStatus::Active => 0.8,
        NodeStatus::Failed => 0.3,
        NodeStatus::Pending | NodeStatus::Completed => 0.0,
    }
}

/// Line color for an edge kind.
pub fn edge_color(kind: EdgeKind) -> Color {
    match kind {
        EdgeKind::ReasoningFlow => REASONING_FLOW_COLOR,
        EdgeKind::GuardrailCheck => GUARDRAIL_CHECK_COLOR,
        EdgeKind::Reject => REJECT_EDGE_COLOR,
        EdgeKind::DataFlow => DATA_FLOW_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_overrides_every_kind() {
        for kind in [
            NodeKind::Guardrail,
            NodeKind::Planner,
            NodeKind::Solver,
            NodeKind::Verifier,
            NodeKind::Ethical,
            NodeKind::Reject,
        ] {
            assert_eq!(node_color(kind, NodeStatus::Failed), FAILED_COLOR);
        }
    }

    #[test]
    fn test_pending_is_dimmed_base() {
        let base = node_color(NodeKind::Planner, NodeStatus::Completed);
        let pending = node_color(NodeKind::Planner, NodeStatus::Pending);
        assert!(pending.r < base.r && pending.g < base.g && pending.b < base.b);
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        assert_ne!(
            node_color(NodeKind::Planner, NodeStatus::Active),
            node_color(NodeKind::Solver, NodeStatus::Active)
        );
    }

    #[test]
    fn test_only_active_glows() {
        assert!(node_emission(NodeStatus::Active) > 0.0);
        assert_eq!(node_emission(NodeStatus::Completed), 0.0);
        assert_eq!(node_emission(NodeStatus::Pending), 0.0);
    }

    #[test]
    fn test_edge_colors_by_kind() {
        assert_ne!(
            edge_color(EdgeKind::ReasoningFlow),
            edge_color(EdgeKind::Reject)
        );
        assert_eq!(edge_color(EdgeKind::Reject), FAILED_COLOR);
    }
}

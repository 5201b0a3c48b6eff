use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

/// One complete reasoning-graph snapshot.
///
/// Produced by the engine, delivered whole in every `init`/`update`/`complete`
/// envelope. Positions are assigned by the engine's layout pass; this client
/// never computes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasonGraph {
    /// Reasoning stages.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Control/data-flow relations between stages.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Run-level metadata (query, scores, alignment verdict).
    #[serde(default)]
    pub metadata: GraphMetadata,
    /// Free-form working notes emitted by the engine, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratchpad: Option<Vec<String>>,
    /// Per-step timing breakdown.
    #[serde(default)]
    pub timeline: Vec<TimelineStep>,
}

/// One reasoning stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier within a snapshot.
    pub id: String,
    /// Role of this stage in the reasoning pipeline.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: NodeStatus,
    /// Stage confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
    /// When the engine created or last touched this stage.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Engine-assigned layout position.
    #[serde(default)]
    pub position: Position,
    /// Opaque stage payload, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Role of a node in the reasoning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Input safety gate.
    Guardrail,
    /// Decomposes the query into a plan.
    Planner,
    /// Executes one plan step.
    Solver,
    /// Checks a solver result.
    Verifier,
    /// Ethical evaluation stage.
    Ethical,
    /// Terminal rejection stage.
    Reject,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Guardrail => write!(f, "guardrail"),
            NodeKind::Planner => write!(f, "planner"),
            NodeKind::Solver => write!(f, "solver"),
            NodeKind::Verifier => write!(f, "verifier"),
            NodeKind::Ethical => write!(f, "ethical"),
            NodeKind::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "guardrail" => Ok(NodeKind::Guardrail),
            "planner" => Ok(NodeKind::Planner),
            "solver" => Ok(NodeKind::Solver),
            "verifier" => Ok(NodeKind::Verifier),
            "ethical" => Ok(NodeKind::Ethical),
            "reject" => Ok(NodeKind::Reject),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

/// Lifecycle status of a reasoning stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Queued, not yet started.
    #[default]
    Pending,
    /// Currently executing.
    Active,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Pending => write!(f, "pending"),
            NodeStatus::Active => write!(f, "active"),
            NodeStatus::Completed => write!(f, "completed"),
            NodeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Engine-assigned 3D layout position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One control/data-flow relation between two stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge identifier.
    pub id: String,
    /// Source node id; must resolve within the same snapshot.
    pub source: String,
    /// Target node id; must resolve within the same snapshot.
    pub target: String,
    /// Relation kind.
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    /// Relation confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
    /// Optional payload carried along a data-flow edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_flow: Option<serde_json::Value>,
}

/// Kind of relation an edge expresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Ordinary reasoning progression.
    #[default]
    ReasoningFlow,
    /// A guardrail inspecting a stage.
    GuardrailCheck,
    /// A rejection path.
    Reject,
    /// Data handed from one stage to another.
    DataFlow,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::ReasoningFlow => write!(f, "reasoning_flow"),
            EdgeKind::GuardrailCheck => write!(f, "guardrail_check"),
            EdgeKind::Reject => write!(f, "reject"),
            EdgeKind::DataFlow => write!(f, "data_flow"),
        }
    }
}

/// Run-level metadata attached to every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// The query this run is answering.
    #[serde(default)]
    pub query: String,
    /// Final answer, present once the run concludes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    /// Overall run confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
    /// Ethical evaluation score in [0, 1].
    #[serde(default)]
    pub ethical_score: f64,
    /// Ethical classification of the (eventual) answer.
    #[serde(default)]
    pub alignment_status: AlignmentStatus,
    /// Composite trust score in [0, 1], computed upstream.
    #[serde(default)]
    pub secure_reasoning_index: f64,
    /// Snapshot timestamp.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Producer protocol version.
    #[serde(default)]
    pub version: Option<String>,
    /// External run identifier, if the engine assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// External trace identifier, if the engine assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Ethical classification of a final answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentStatus {
    /// Answer is aligned.
    #[default]
    Ethical,
    /// Answer needs review.
    Questionable,
    /// Answer is harmful.
    Harmful,
}

impl std::fmt::Display for AlignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignmentStatus::Ethical => write!(f, "ethical"),
            AlignmentStatus::Questionable => write!(f, "questionable"),
            AlignmentStatus::Harmful => write!(f, "harmful"),
        }
    }
}

/// One entry in the per-step timing breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    /// Step name.
    pub step: String,
    /// When the step ran.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Step duration in milliseconds.
    #[serde(rename = "duration", default)]
    pub duration_ms: f64,
}

/// Clamp a score to [0, 1], mapping non-finite values to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl ReasonGraph {
    /// Enforce the snapshot invariants in place.
    ///
    /// - duplicate node ids: first occurrence wins, the rest are dropped;
    /// - edges whose source or target does not resolve are dropped;
    /// - every confidence/score field is clamped to [0, 1].
    ///
    /// Dropping is deliberate and silent toward consumers (logged at `warn`):
    /// a partially inconsistent frame from the engine must never take the
    /// renderer down.
    pub fn sanitize(&mut self) {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        let before = self.nodes.len();
        self.nodes.retain(|node| seen.insert(node.id.clone()));
        if self.nodes.len() != before {
            warn!(
                dropped = before - self.nodes.len(),
                "Dropped nodes with duplicate ids from snapshot"
            );
        }

        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = self.edges.len();
        self.edges
            .retain(|edge| ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()));
        if self.edges.len() != before {
            warn!(
                dropped = before - self.edges.len(),
                "Dropped edges with unresolved endpoints from snapshot"
            );
        }

        for node in &mut self.nodes {
            node.confidence = clamp_unit(node.confidence);
        }
        for edge in &mut self.edges {
            edge.confidence = clamp_unit(edge.confidence);
        }
        self.metadata.confidence = clamp_unit(self.metadata.confidence);
        self.metadata.ethical_score = clamp_unit(self.metadata.ethical_score);
        self.metadata.secure_reasoning_index = clamp_unit(self.metadata.secure_reasoning_index);
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether any node is currently in the `Active` state.
    pub fn has_active_nodes(&self) -> bool {
        self.nodes.iter().any(|n| n.status == NodeStatus::Active)
    }
}

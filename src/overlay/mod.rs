//! Metrics overlay: a stateless projection of snapshot metadata into a
//! compact status readout. Holds nothing between snapshots; callers rebuild
//! it from the latest metadata every time the snapshot changes.

use serde::{Deserialize, Serialize};

use crate::graph::{AlignmentStatus, GraphMetadata, ReasonGraph, TimelineStep};

/// Severity tier for UI coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Success color.
    Success,
    /// Warning color.
    Warning,
    /// Danger color.
    Danger,
}

impl From<AlignmentStatus> for Severity {
    fn from(status: AlignmentStatus) -> Self {
        match status {
            AlignmentStatus::Ethical => Severity::Success,
            AlignmentStatus::Questionable => Severity::Warning,
            AlignmentStatus::Harmful => Severity::Danger,
        }
    }
}

/// Labeled, severity-colored alignment indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentBadge {
    /// Display label, e.g. `"ethical"`.
    pub label: String,
    /// Color tier.
    pub severity: Severity,
}

/// One formatted timeline row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    /// Step name.
    pub step: String,
    /// Human-readable duration, e.g. `"412 ms"` or `"2.3 s"`.
    pub duration: String,
}

/// The readout rendered next to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsPanel {
    /// The query under evaluation.
    pub query: String,
    /// Overall confidence, formatted as a percentage.
    pub confidence: String,
    /// Ethical score, formatted as a percentage.
    pub ethical_score: String,
    /// Secure Reasoning Index, formatted as a percentage.
    pub secure_reasoning_index: String,
    /// Alignment indicator.
    pub alignment: AlignmentBadge,
    /// Final answer, once present.
    pub final_answer: Option<String>,
    /// Per-step timing rows.
    pub timeline: Vec<TimelineRow>,
}

impl MetricsPanel {
    /// Project a snapshot's metadata into the readout.
    pub fn project(graph: &ReasonGraph) -> Self {
        Self::from_metadata(&graph.metadata, &graph.timeline)
    }

    /// Project from the raw parts.
    pub fn from_metadata(metadata: &GraphMetadata, timeline: &[TimelineStep]) -> Self {
        Self {
            query: metadata.query.clone(),
            confidence: percent(metadata.confidence),
            ethical_score: percent(metadata.ethical_score),
            secure_reasoning_index: percent(metadata.secure_reasoning_index),
            alignment: AlignmentBadge {
                label: metadata.alignment_status.to_string(),
                severity: metadata.alignment_status.into(),
            },
            final_answer: metadata.final_answer.clone(),
            timeline: timeline
                .iter()
                .map(|step| TimelineRow {
                    step: step.step.clone(),
                    duration: duration(step.duration_ms),
                })
                .collect(),
        }
    }
}

/// Format a [0, 1] score as a whole percentage.
fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

/// Format a millisecond duration for display.
fn duration(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.1} s", ms / 1000.0)
    } else {
        format!("{:.0} ms", ms)
    }
}

use serde::{Deserialize, Serialize};

use super::ReasonGraph;
use crate::error::{StreamError, StreamResult};

/// One event pushed by the reasoning engine.
///
/// Every stream message is a single self-contained line carrying one of
/// these. `Init`, `Update` and `Complete` deliver a full replacement
/// snapshot; `Error` is the producer's terminal rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEnvelope {
    /// First snapshot of a run.
    Init {
        /// The initial graph.
        data: ReasonGraph,
    },
    /// An intermediate snapshot; replaces the previous one wholesale.
    Update {
        /// The replacement graph.
        data: ReasonGraph,
    },
    /// The final snapshot; the stream ends after this.
    Complete {
        /// The final graph.
        data: ReasonGraph,
    },
    /// Application-level rejection from the producer. Terminal.
    Error {
        /// Producer-supplied reason.
        message: String,
    },
}

impl StreamEnvelope {
    /// Parse one stream line into an envelope.
    ///
    /// Tolerates SSE-style `data: ` prefixes and surrounding whitespace.
    /// Empty lines yield `Ok(None)` (keep-alive frames). Anything else that
    /// fails to parse is a [`StreamError::Parse`] carrying a truncated
    /// excerpt of the offending line.
    pub fn parse_line(line: &str) -> StreamResult<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let payload = trimmed.strip_prefix("data:").map(str::trim).unwrap_or(trimmed);
        if payload.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(payload)
            .map(Some)
            .map_err(|e| StreamError::Parse {
                message: format!("{} (line: {:?})", e, excerpt(payload)),
            })
    }

    /// The snapshot carried by this envelope, if any.
    pub fn graph(&self) -> Option<&ReasonGraph> {
        match self {
            StreamEnvelope::Init { data }
            | StreamEnvelope::Update { data }
            | StreamEnvelope::Complete { data } => Some(data),
            StreamEnvelope::Error { .. } => None,
        }
    }
}

/// First 120 characters of a line, for log-safe error messages.
fn excerpt(line: &str) -> String {
    let mut out: String = line.chars().take(120).collect();
    if out.len() < line.len() {
        out.push('…');
    }
    out
}

//! Reasoning-graph data model.
//!
//! The wire types mirror the reasoning engine's JSON contract exactly; every
//! snapshot delivered by the stream is sanitized once ([`ReasonGraph::sanitize`])
//! before it is exposed to the renderer or the overlay. A snapshot is a
//! complete replacement of its predecessor - there is no incremental patching
//! anywhere in this crate.

mod envelope;
mod store;
mod types;

pub use envelope::*;
pub use store::*;
pub use types::*;

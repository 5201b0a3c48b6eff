//! # Reasonscope
//!
//! A real-time visualization client for streamed reasoning graphs. It
//! subscribes to a reasoning engine's one-directional push stream, maintains
//! the latest graph snapshot under reconnection and failure, and projects it
//! into an animated 3D scene with a metrics readout.
//!
//! ## Architecture
//!
//! ```text
//! Reasoning Engine ── push stream ──> StreamClient
//!                                          │ (sanitized snapshots)
//!                                     GraphStore ──> Scene / MetricsPanel
//! ```
//!
//! Each layer depends only on the one below it: the stream client produces
//! immutable [`graph::ReasonGraph`] snapshots, [`scene`] and [`overlay`] are
//! pure projections of the latest snapshot. Snapshots replace each other
//! wholesale; nothing in this crate merges graph state.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reasonscope::{Config, StreamClient, SubscribeRequest};
//! use reasonscope::stream::HttpTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let transport = Arc::new(HttpTransport::new(&config.engine, &config.stream)?);
//!     let client = StreamClient::new(transport, SubscribeRequest::new("query"), &config.stream);
//!     client.start();
//!     let mut status = client.subscribe();
//!     while status.changed().await.is_ok() { /* render */ }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management loaded from the environment.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Reasoning-graph data model and snapshot store.
pub mod graph;
/// Metrics overlay projection.
pub mod overlay;
/// 3D scene construction and camera.
pub mod scene;
/// Subscription stream client and transport.
pub mod stream;

pub use config::Config;
pub use error::{AppError, AppResult, StreamError, StreamResult};
pub use graph::{ReasonGraph, StreamEnvelope};
pub use stream::{ConnectionPhase, StreamClient, StreamStatus, SubscribeRequest};

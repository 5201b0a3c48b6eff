//! Subscription stream client.
//!
//! [`StreamTransport`] is the seam between the client logic and the wire: it
//! turns a [`SubscribeRequest`] into a stream of text lines. [`HttpTransport`]
//! is the production implementation (long-lived HTTP response, one JSON
//! envelope per line); tests substitute scripted transports. [`StreamClient`]
//! owns at most one live connection and drives the connection lifecycle
//! described on [`ConnectionPhase`].

mod client;
mod transport;

pub use client::*;
pub use transport::*;

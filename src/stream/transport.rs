use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};
use reqwest::Client;
use tracing::debug;

use crate::config::{EngineConfig, StreamConfig};
use crate::error::{StreamError, StreamResult};
use crate::graph::NodeKind;

/// Subscription parameters for one reasoning run.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeRequest {
    /// The query to reason about.
    pub query: String,
    /// Restrict the stream to these node kinds, if non-empty.
    pub kinds: Vec<NodeKind>,
    /// Engine session/thread to attach to, if any.
    pub session_id: Option<String>,
}

impl SubscribeRequest {
    /// Subscribe to a fresh run for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kinds: Vec::new(),
            session_id: None,
        }
    }

    /// Filter the stream to the given node kinds.
    pub fn with_kinds(mut self, kinds: Vec<NodeKind>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Attach to an existing engine session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// A live connection: text lines until the producer or the network ends it.
pub type LineStream = Pin<Box<dyn Stream<Item = StreamResult<String>> + Send>>;

/// The wire seam of the stream client.
///
/// Exactly one `open` call corresponds to one network connection; the client
/// counts on that when enforcing its single-connection invariant, and so do
/// the tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open one subscription and return its line stream.
    async fn open(&self, request: &SubscribeRequest) -> StreamResult<LineStream>;
}

/// Production transport: a long-lived HTTP response carrying one JSON
/// envelope per line.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    connect_timeout_ms: u64,
}

impl HttpTransport {
    /// Build a transport for the configured engine endpoint.
    ///
    /// No overall request timeout is set: the subscription is expected to
    /// stay open for the whole run. Only connection establishment is bounded.
    pub fn new(engine: &EngineConfig, stream_cfg: &StreamConfig) -> StreamResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(stream_cfg.connect_timeout_ms))
            .build()
            .map_err(|e| StreamError::Transport {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: engine.base_url.trim_end_matches('/').to_string(),
            api_key: engine.api_key.clone(),
            connect_timeout_ms: stream_cfg.connect_timeout_ms,
        })
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(&self, request: &SubscribeRequest) -> StreamResult<LineStream> {
        let url = format!("{}/v1/reason/stream", self.base_url);

        let mut query: Vec<(&str, String)> = vec![("query", request.query.clone())];
        if !request.kinds.is_empty() {
            let filter = request
                .kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("filter", filter));
        }
        if let Some(session) = &request.session_id {
            query.push(("session", session.clone()));
        }

        debug!(url = %url, query = %request.query, "Opening subscription stream");

        let mut builder = self.client.get(&url).query(&query);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StreamError::from_http(e, self.connect_timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(into_line_stream(Box::pin(response.bytes_stream())))
    }
}

struct LineState<S> {
    inner: S,
    pending: VecDeque<String>,
    partial: Vec<u8>,
    done: bool,
}

/// Frame a byte stream into newline-delimited text lines.
fn into_line_stream<S, B>(bytes: S) -> LineStream
where
    S: Stream<Item = reqwest::Result<B>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = LineState {
        inner: bytes,
        pending: VecDeque::new(),
        partial: Vec::new(),
        done: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.pending.pop_front() {
                return Some((Ok(line), st));
            }
            if st.done {
                if st.partial.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&st.partial).into_owned();
                st.partial.clear();
                return Some((Ok(line), st));
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => split_lines(&mut st.partial, chunk.as_ref(), &mut st.pending),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((
                        Err(StreamError::Transport {
                            message: e.to_string(),
                        }),
                        st,
                    ));
                }
                None => st.done = true,
            }
        }
    }))
}

/// Append a chunk to the partial-line buffer, moving complete lines to `out`.
fn split_lines(partial: &mut Vec<u8>, chunk: &[u8], out: &mut VecDeque<String>) {
    for &byte in chunk {
        if byte == b'\n' {
            if partial.last() == Some(&b'\r') {
                partial.pop();
            }
            out.push_back(String::from_utf8_lossy(partial).into_owned());
            partial.clear();
        } else {
            partial.push(byte);
        }
    }
}

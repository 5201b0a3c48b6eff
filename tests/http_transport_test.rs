//! Integration tests for the HTTP stream transport.
//!
//! Uses wiremock to stand in for the reasoning engine's push endpoint.

use futures_util::StreamExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reasonscope::config::{EngineConfig, StreamConfig};
use reasonscope::graph::NodeKind;
use reasonscope::stream::{HttpTransport, StreamTransport, SubscribeRequest};
use reasonscope::{StreamEnvelope, StreamError};

fn transport(base_url: &str, api_key: Option<&str>) -> HttpTransport {
    let engine = EngineConfig {
        base_url: base_url.to_string(),
        api_key: api_key.map(String::from),
    };
    let stream = StreamConfig {
        connect_timeout_ms: 2_000,
        reconnect_delay_ms: 100,
    };
    HttpTransport::new(&engine, &stream).expect("Failed to build transport")
}

#[tokio::test]
async fn test_delivers_envelopes_line_by_line() {
    let mock_server = MockServer::start().await;

    let body = concat!(
        r#"{"type":"init","data":{"nodes":[],"edges":[],"metadata":{"query":"q"}}}"#,
        "\n",
        r#"{"type":"complete","data":{"nodes":[],"edges":[],"metadata":{"query":"q"}}}"#,
        "\n",
    );

    Mock::given(method("GET"))
        .and(path("/v1/reason/stream"))
        .and(query_param("query", "q"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server.uri(), None);
    let mut lines = transport
        .open(&SubscribeRequest::new("q"))
        .await
        .expect("open should succeed");

    let mut envelopes = Vec::new();
    while let Some(line) = lines.next().await {
        if let Some(env) = StreamEnvelope::parse_line(&line.unwrap()).unwrap() {
            envelopes.push(env);
        }
    }

    assert_eq!(envelopes.len(), 2);
    assert!(matches!(envelopes[0], StreamEnvelope::Init { .. }));
    assert!(matches!(envelopes[1], StreamEnvelope::Complete { .. }));
}

#[tokio::test]
async fn test_sends_auth_and_filter_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/reason/stream"))
        .and(query_param("query", "q"))
        .and(query_param("filter", "planner,solver"))
        .and(query_param("session", "sess-9"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server.uri(), Some("test-key"));
    let request = SubscribeRequest::new("q")
        .with_kinds(vec![NodeKind::Planner, NodeKind::Solver])
        .with_session("sess-9");

    let result = transport.open(&request).await;
    assert!(result.is_ok(), "open should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/reason/stream"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server.uri(), None);
    let err = transport
        .open(&SubscribeRequest::new("q"))
        .await
        .err()
        .expect("open should fail");

    match err {
        StreamError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    // A refused subscription is retried by the client's reconnect loop.
    assert!(StreamError::Api {
        status: 403,
        message: String::new()
    }
    .is_recoverable());
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    // Nothing listens on this port.
    let transport = transport("http://127.0.0.1:9", None);
    let err = transport
        .open(&SubscribeRequest::new("q"))
        .await
        .err()
        .expect("open should fail");

    assert!(
        matches!(err, StreamError::Transport { .. } | StreamError::Timeout { .. }),
        "expected transport-level error, got {err:?}"
    );
    assert!(err.is_recoverable());
}

//! Integration tests for [`flow_client::FlowRuntimeClient`] against a mockito flow runtime.
//!
//! Covers routing by the current flow id, reply extraction, the identity preamble on the wire,
//! and the typed failures (validation, HTTP status, malformed envelope).

use std::time::Duration;

use flow_client::{ChatError, ChatTransport, FlowRuntimeClient, UserContext};
use flow_endpoint::SharedFlowEndpoint;
use mockito::Matcher;
use serde_json::json;

const SESSION: &str = "travel-chat-session";

fn reply_body(reply: &str) -> String {
    json!({ "outputs": [{ "outputs": [{ "artifacts": { "message": reply } }] }] }).to_string()
}

/// **Test: Reply is taken from artifacts.message.**
///
/// **Setup:** Runtime answers `{outputs:[{outputs:[{artifacts:{message:"Hello!"}}]}]}`.
/// **Expected:** send_message resolves to "Hello!".
#[tokio::test]
async fn test_send_message_returns_reply() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(reply_body("Hello!"))
        .expect(1)
        .create_async()
        .await;

    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    let reply = client.send_message("hi", SESSION, None).await.unwrap();

    assert_eq!(reply, "Hello!");
    mock.assert_async().await;
}

/// **Test: Each send targets the flow id held at send time.**
///
/// **Setup:** Endpoint starts at "old", then the resolver side switches it to "XYZ".
/// **Expected:** The second send hits `/api/v1/run/XYZ`.
#[tokio::test]
async fn test_send_follows_current_flow_id() {
    let mut server = mockito::Server::new_async().await;
    let old = server
        .mock("POST", "/api/v1/run/old")
        .with_status(200)
        .with_body(reply_body("from old"))
        .expect(1)
        .create_async()
        .await;
    let new = server
        .mock("POST", "/api/v1/run/XYZ")
        .with_status(200)
        .with_body(reply_body("from XYZ"))
        .expect(1)
        .create_async()
        .await;

    let endpoint = SharedFlowEndpoint::new("old");
    let client = FlowRuntimeClient::new(&server.url(), endpoint.clone());

    assert_eq!(client.send_message("hi", SESSION, None).await.unwrap(), "from old");
    endpoint.apply_fetched("XYZ");
    assert_eq!(client.send_message("hi", SESSION, None).await.unwrap(), "from XYZ");

    old.assert_async().await;
    new.assert_async().await;
}

/// **Test: Request body carries input_value, session_id and no user_context when none is given.**
#[tokio::test]
async fn test_request_body_without_context() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "input_value": "hi",
            "session_id": SESSION
        })))
        .with_status(200)
        .with_body(reply_body("ok"))
        .create_async()
        .await;

    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    client.send_message("hi", SESSION, None).await.unwrap();

    mock.assert_async().await;
}

/// **Test: Authenticated context prefixes the identity tag and is forwarded as user_context.**
///
/// **Setup:** `{isAuthenticated: true, email: "a@b.com", fullName: "A B"}`, message "hi".
/// **Expected:** input_value is the bracketed tag, a blank line, then "hi".
#[tokio::test]
async fn test_authenticated_context_preamble_on_wire() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .match_body(Matcher::Json(json!({
            "input_value": "[Thông tin người dùng: Email: a@b.com, Tên: A B]\n\nhi",
            "session_id": SESSION,
            "user_context": {
                "email": "a@b.com",
                "fullName": "A B",
                "isAuthenticated": true
            }
        })))
        .with_status(200)
        .with_body(reply_body("Chào A B"))
        .create_async()
        .await;

    let ctx = UserContext::authenticated()
        .with_email("a@b.com")
        .with_full_name("A B");
    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    let reply = client.send_message("hi", SESSION, Some(&ctx)).await.unwrap();

    assert_eq!(reply, "Chào A B");
    mock.assert_async().await;
}

/// **Test: Unauthenticated context leaves input_value unchanged.**
#[tokio::test]
async fn test_unauthenticated_context_leaves_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .match_body(Matcher::PartialJson(json!({ "input_value": "hi" })))
        .with_status(200)
        .with_body(reply_body("ok"))
        .create_async()
        .await;

    let ctx = UserContext::anonymous().with_email("a@b.com");
    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    client.send_message("hi", SESSION, Some(&ctx)).await.unwrap();

    mock.assert_async().await;
}

/// **Test: Blank text is rejected without any request.**
#[tokio::test]
async fn test_blank_text_is_validation_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    let err = client.send_message("  \n ", SESSION, None).await.unwrap_err();

    assert!(matches!(err, ChatError::Validation));
    mock.assert_async().await;
}

/// **Test: HTTP 500 is a Transport error carrying the status.**
#[tokio::test]
async fn test_http_500_is_transport_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    let err = client.send_message("hi", SESSION, None).await.unwrap_err();

    assert!(matches!(err, ChatError::Transport { status: 500 }));
    assert_eq!(err.status(), Some(500));
}

/// **Test: Empty outputs array is MalformedResponse, not a parse failure.**
#[tokio::test]
async fn test_empty_outputs_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .with_status(200)
        .with_body(r#"{"session_id": "s", "outputs": []}"#)
        .create_async()
        .await;

    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    let err = client.send_message("hi", SESSION, None).await.unwrap_err();

    assert!(matches!(err, ChatError::MalformedResponse));
}

/// **Test: All reply slots empty is MalformedResponse.**
#[tokio::test]
async fn test_all_slots_empty_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .with_status(200)
        .with_body(
            json!({ "outputs": [{ "outputs": [{
                "artifacts": { "message": "" },
                "outputs": { "message": { "message": "", "type": "text" } },
                "logs": { "message": [] },
                "messages": []
            }] }] })
            .to_string(),
        )
        .create_async()
        .await;

    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    let err = client.send_message("hi", SESSION, None).await.unwrap_err();

    assert!(matches!(err, ChatError::MalformedResponse));
}

/// **Test: A 2xx body that is not JSON is MalformedResponse.**
#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/run/flow-1")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    let err = client.send_message("hi", SESSION, None).await.unwrap_err();

    assert!(matches!(err, ChatError::MalformedResponse));
}

/// **Test: Unreachable runtime is a Network error.**
#[tokio::test]
async fn test_unreachable_runtime_is_network_error() {
    let client = FlowRuntimeClient::new("http://127.0.0.1:1", SharedFlowEndpoint::new("flow-1"))
        .with_send_timeout(Duration::from_secs(5));
    let err = client.send_message("hi", SESSION, None).await.unwrap_err();

    assert!(matches!(err, ChatError::Network(_)));
    assert_eq!(err.status(), None);
}

/// **Test: Health probe is true only for a 200 from /api/v1/version.**
#[tokio::test]
async fn test_check_health() {
    let mut server = mockito::Server::new_async().await;
    let _healthy = server
        .mock("GET", "/api/v1/version")
        .with_status(200)
        .with_body(r#"{"version": "1.0.0"}"#)
        .create_async()
        .await;
    let client = FlowRuntimeClient::new(&server.url(), SharedFlowEndpoint::new("flow-1"));
    assert!(client.check_health().await);

    let mut failing_server = mockito::Server::new_async().await;
    let _unhealthy = failing_server
        .mock("GET", "/api/v1/version")
        .with_status(503)
        .create_async()
        .await;
    let failing = FlowRuntimeClient::new(&failing_server.url(), SharedFlowEndpoint::new("flow-1"));
    assert!(!failing.check_health().await);

    let unreachable =
        FlowRuntimeClient::new("http://127.0.0.1:1", SharedFlowEndpoint::new("flow-1"));
    assert!(!unreachable.check_health().await);
}

/// **Test: A runtime that never answers is cut off by the send timeout.**
///
/// **Setup:** Listener accepts the connection but sends nothing; send timeout is 300ms.
/// **Expected:** Network error well before any default HTTP timeout.
#[tokio::test]
async fn test_silent_runtime_hits_send_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = FlowRuntimeClient::new(&base, SharedFlowEndpoint::new("flow-1"))
        .with_send_timeout(Duration::from_millis(300));

    let started = std::time::Instant::now();
    let err = client.send_message("hi", SESSION, None).await.unwrap_err();

    match err {
        ChatError::Network(e) => assert!(e.is_timeout()),
        other => panic!("expected network timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(3));
}

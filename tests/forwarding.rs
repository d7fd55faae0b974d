//! End-to-end request forwarding through a live bridge server.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use reqwest::StatusCode;

use http_bridge::http::HttpResponseRecord;
use http_bridge::rpc::HANDLE_REQUEST_OPERATION;
use http_bridge::{DestinationId, LinkConfig};

mod common;

#[tokio::test]
async fn healthz_answers_without_calling_destination() {
    let rpc = Arc::new(common::FailingRpc::new("destination down"));
    let registry = common::registry(rpc.clone());
    let addr = registry
        .put(DestinationId::from("A"), LinkConfig::with_address("127.0.0.1:0"))
        .await
        .unwrap();

    let res = common::client()
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await.unwrap().is_empty());
    assert_eq!(rpc.calls.load(Ordering::SeqCst), 0);

    registry.drain_all().await;
}

#[tokio::test]
async fn destination_reply_reaches_client() {
    let rpc = Arc::new(common::FixedRpc::new(
        HttpResponseRecord::with_status(201)
            .header("Location", "/foo/1")
            .body_bytes(r#"{"id":1}"#),
    ));
    let registry = common::registry(rpc.clone());
    let addr = registry
        .put(DestinationId::from("A"), LinkConfig::with_address("127.0.0.1:0"))
        .await
        .unwrap();

    let res = common::client()
        .get(format!("http://{}/foo", addr))
        .header("X-Trace", "1")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["location"], "/foo/1");
    let body: serde_json::Value = serde_json::from_slice(&res.bytes().await.unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({ "id": 1 }));

    let (destination, operation, request) = rpc.last_call().unwrap();
    assert_eq!(destination, DestinationId::from("A"));
    assert_eq!(operation, HANDLE_REQUEST_OPERATION);
    assert_eq!(request.method(), "GET");
    assert_eq!(request.path(), "/foo");
    assert_eq!(request.header_values("x-trace"), ["1"]);
    assert_eq!(request.header_values("x-request-id").len(), 1);

    registry.drain_all().await;
}

#[tokio::test]
async fn echo_round_trip_preserves_request() {
    let registry = common::registry(Arc::new(common::EchoRpc::default()));
    let addr = registry
        .put(DestinationId::from("echo"), LinkConfig::with_address("127.0.0.1:0"))
        .await
        .unwrap();

    let body = vec![0u8, 1, 2, 254, 255, b'\n'];
    let res = common::client()
        .patch(format!("http://{}/items/7?fields=a,b", addr))
        .header("x-multi", "a")
        .header("x-multi", "b")
        .body(body.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-echo-method"], "PATCH");
    assert_eq!(res.headers()["x-echo-path"], "/items/7?fields=a,b");
    let multi: Vec<_> = res
        .headers()
        .get_all("x-multi")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(multi, ["a", "b"]);
    assert_eq!(res.bytes().await.unwrap().to_vec(), body);

    registry.drain_all().await;
}

#[tokio::test]
async fn rpc_error_is_server_error_with_text() {
    let rpc = Arc::new(common::FailingRpc::new("no handler for HttpServer.HandleRequest"));
    let registry = common::registry(rpc.clone());
    let addr = registry
        .put(DestinationId::from("A"), LinkConfig::with_address("127.0.0.1:0"))
        .await
        .unwrap();

    let res = common::client()
        .post(format!("http://{}/orders", addr))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "no handler for HttpServer.HandleRequest");
    assert_eq!(rpc.calls.load(Ordering::SeqCst), 1);

    registry.drain_all().await;
}

#[tokio::test]
async fn invalid_status_from_destination_is_server_error() {
    let registry = common::registry(Arc::new(common::FixedRpc::new(
        HttpResponseRecord::with_status(42),
    )));
    let addr = registry
        .put(DestinationId::from("A"), LinkConfig::with_address("127.0.0.1:0"))
        .await
        .unwrap();

    let res = common::client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.text().await.unwrap(),
        "invalid status code 42 in destination response"
    );

    registry.drain_all().await;
}

#[tokio::test]
async fn header_bytes_are_never_rewritten() {
    let rpc = Arc::new(common::EchoRpc::default());
    let registry = common::registry(rpc.clone());
    let addr = registry
        .put(DestinationId::from("A"), LinkConfig::with_address("127.0.0.1:0"))
        .await
        .unwrap();

    let reply = common::raw_exchange(
        addr,
        "GET /menu HTTP/1.1\r\nHost: bridge\r\nX-Name: café\r\nConnection: close\r\n\r\n".as_bytes(),
    )
    .await;
    assert!(reply.starts_with(b"HTTP/1.1 200"));
    assert!(common::contains_bytes(&reply, "x-name: café\r\n".as_bytes()));
    assert_eq!(rpc.calls.load(Ordering::SeqCst), 1);

    let reply = common::raw_exchange(
        addr,
        b"GET /menu HTTP/1.1\r\nHost: bridge\r\nX-Latin: caf\xe9\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(reply.starts_with(b"HTTP/1.1 500"));
    assert!(common::contains_bytes(&reply, b"request header `x-latin` is not valid UTF-8"));
    assert!(!common::contains_bytes(&reply, "\u{fffd}".as_bytes()));
    assert_eq!(rpc.calls.load(Ordering::SeqCst), 1);

    registry.drain_all().await;
}

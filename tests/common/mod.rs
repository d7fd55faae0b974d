//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use http_bridge::http::{BridgeSettings, HttpResponseRecord, RecordHeaders};
use http_bridge::rpc::codec;
use http_bridge::{DestinationId, HttpRequestRecord, LinkRegistry, RpcClient, RpcError};

/// Replies with the request's method, path, `x-` headers and body.
#[derive(Default)]
pub struct EchoRpc {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RpcClient for EchoRpc {
    async fn call(&self, _: &DestinationId, _: &str, payload: Bytes) -> Result<Bytes, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let request = codec::decode_request(&payload)?;

        let mut headers: RecordHeaders = request
            .headers()
            .iter()
            .filter(|(name, _)| name.starts_with("x-") && name.as_str() != "x-request-id")
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();
        headers.insert("x-echo-method".to_string(), vec![request.method().to_string()]);
        headers.insert("x-echo-path".to_string(), vec![request.path().to_string()]);

        let response = HttpResponseRecord::new(200, headers, request.body().to_vec());
        Ok(Bytes::from(codec::encode_response(&response)?))
    }
}

/// Replies with a fixed response and remembers what it was sent.
pub struct FixedRpc {
    response: HttpResponseRecord,
    pub calls: AtomicUsize,
    last: Mutex<Option<(DestinationId, String, HttpRequestRecord)>>,
}

impl FixedRpc {
    pub fn new(response: HttpResponseRecord) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn last_call(&self) -> Option<(DestinationId, String, HttpRequestRecord)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcClient for FixedRpc {
    async fn call(
        &self,
        destination: &DestinationId,
        operation: &str,
        payload: Bytes,
    ) -> Result<Bytes, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let request = codec::decode_request(&payload)?;
        *self.last.lock().unwrap() = Some((destination.clone(), operation.to_string(), request));
        Ok(Bytes::from(codec::encode_response(&self.response)?))
    }
}

/// Always fails with a remote error carrying `message`.
pub struct FailingRpc {
    pub message: String,
    pub calls: AtomicUsize,
}

impl FailingRpc {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RpcClient for FailingRpc {
    async fn call(&self, _: &DestinationId, _: &str, _: Bytes) -> Result<Bytes, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RpcError::Remote(self.message.clone()))
    }
}

/// Holds every call for `delay` before answering 200.
pub struct SlowRpc {
    pub delay: Duration,
    entered: AtomicUsize,
}

impl SlowRpc {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            entered: AtomicUsize::new(0),
        }
    }

    /// Poll until `count` calls are being held, or give up after `timeout`.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.entered.load(Ordering::SeqCst) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl RpcClient for SlowRpc {
    async fn call(&self, _: &DestinationId, _: &str, _: Bytes) -> Result<Bytes, RpcError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Bytes::from(codec::encode_response(&HttpResponseRecord::with_status(200))?))
    }
}

pub fn registry(rpc: Arc<dyn RpcClient>) -> LinkRegistry {
    LinkRegistry::new(
        rpc,
        BridgeSettings {
            shutdown_timeout: Duration::from_secs(2),
        },
    )
}

/// HTTP client that never reuses connections or goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub async fn is_listening(addr: SocketAddr) -> bool {
    TcpStream::connect(addr).await.is_ok()
}

/// Poll until nothing accepts on `addr`, or give up after `timeout`.
pub async fn wait_until_closed(addr: SocketAddr, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !is_listening(addr).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Send `request` verbatim on a fresh connection and return the raw reply.
///
/// The request should carry `Connection: close` so the server ends the reply.
pub async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
        .await
        .unwrap()
        .unwrap();
    reply
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

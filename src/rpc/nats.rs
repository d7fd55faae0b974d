//! NATS request/reply transport.

use std::time::Duration;

use async_nats::client::{RequestError, RequestErrorKind};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{info, trace, warn};

use crate::config::RpcConfig;
use crate::link::DestinationId;
use crate::rpc::codec::{self, Invocation, InvocationResponse};
use crate::rpc::{RpcClient, RpcError};

/// `RpcClient` that reaches destinations over a NATS bus.
///
/// Each call is a request on `{subject_prefix}.{lattice}.{destination}`
/// carrying an [`Invocation`] and answered with an [`InvocationResponse`].
#[derive(Clone)]
pub struct NatsRpcClient {
    client: async_nats::Client,
    subject_prefix: String,
    lattice: String,
    timeout: Duration,
}

impl NatsRpcClient {
    /// Connect to the configured NATS servers.
    pub async fn connect(config: &RpcConfig) -> Result<Self, RpcError> {
        info!(servers = ?config.servers, lattice = %config.lattice, "Connecting to RPC bus");

        let timeout = Duration::from_millis(config.timeout_ms);
        let servers: Vec<&str> = config.servers.iter().map(|s| s.as_str()).collect();

        let client = async_nats::ConnectOptions::new()
            .name(config.client_name.as_str())
            .request_timeout(Some(timeout))
            .event_callback(|event| async move {
                match event {
                    async_nats::Event::Connected => info!("Connected to RPC bus"),
                    async_nats::Event::Disconnected => warn!("Disconnected from RPC bus"),
                    async_nats::Event::ClientError(e) => warn!(error = %e, "RPC bus client error"),
                    _ => {}
                }
            })
            .retry_on_initial_connect()
            .max_reconnects(None)
            .connect(servers)
            .await
            .map_err(|e| RpcError::Transport(format!("failed to connect: {}", e)))?;

        Ok(Self::new(
            client,
            config.subject_prefix.clone(),
            config.lattice.clone(),
            timeout,
        ))
    }

    pub fn new(
        client: async_nats::Client,
        subject_prefix: impl Into<String>,
        lattice: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            subject_prefix: subject_prefix.into(),
            lattice: lattice.into(),
            timeout,
        }
    }

    pub fn subject_for(&self, destination: &DestinationId) -> String {
        invocation_subject(&self.subject_prefix, &self.lattice, destination)
    }
}

fn invocation_subject(prefix: &str, lattice: &str, destination: &DestinationId) -> String {
    format!("{}.{}.{}", prefix, lattice, destination)
}

#[async_trait]
impl RpcClient for NatsRpcClient {
    async fn call(
        &self,
        destination: &DestinationId,
        operation: &str,
        payload: Bytes,
    ) -> Result<Bytes, RpcError> {
        let invocation = Invocation {
            destination: destination.to_string(),
            operation: operation.to_string(),
            payload: payload.to_vec(),
        };
        let body = codec::encode(&invocation)?;
        let subject = self.subject_for(destination);

        trace!(subject = %subject, size = body.len(), "Sending invocation");

        let reply = tokio::time::timeout(self.timeout, self.client.request(subject, body.into()))
            .await
            .map_err(|_| RpcError::Timeout {
                destination: destination.clone(),
            })?
            .map_err(|e| request_error(destination, &e))?;

        reply_payload(codec::decode(&reply.payload)?)
    }
}

fn request_error(destination: &DestinationId, err: &RequestError) -> RpcError {
    match err.kind() {
        RequestErrorKind::TimedOut => RpcError::Timeout {
            destination: destination.clone(),
        },
        RequestErrorKind::NoResponders => RpcError::NoResponders {
            destination: destination.clone(),
        },
        RequestErrorKind::Other => RpcError::Transport(err.to_string()),
    }
}

/// Unwrap a reply envelope; an empty error string counts as success.
fn reply_payload(response: InvocationResponse) -> Result<Bytes, RpcError> {
    match response.error {
        Some(error) if !error.is_empty() => Err(RpcError::Remote(error)),
        _ => Ok(Bytes::from(response.payload)),
    }
}

//! Outbound RPC to destinations.
//!
//! # Data Flow
//! ```text
//! HttpRequestRecord
//!     → codec.rs (encode)
//!     → RpcClient::call(destination, operation, payload)
//!         nats.rs: Invocation envelope → request/reply on the bus
//!     → codec.rs (decode reply)
//!     → HttpResponseRecord
//! ```
//!
//! # Design Decisions
//! - The transport is a trait so bridge servers can run against test doubles
//! - One call per forwarded request; retries are the destination's business

pub mod codec;
pub mod nats;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::link::DestinationId;

pub use nats::NatsRpcClient;

/// Operation name every forwarded request is dispatched under.
pub const HANDLE_REQUEST_OPERATION: &str = "HttpServer.HandleRequest";

/// Errors from dispatching a call or decoding its reply.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Payload could not be encoded or the reply could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// The transport failed to deliver the call.
    #[error("transport error: {0}")]
    Transport(String),

    /// No reply arrived in time.
    #[error("call to {destination} timed out")]
    Timeout { destination: DestinationId },

    /// Nobody is listening for this destination.
    #[error("no responders for {destination}")]
    NoResponders { destination: DestinationId },

    /// The destination itself reported a failure.
    #[error("{0}")]
    Remote(String),
}

impl RpcError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Codec(_) => "codec",
            RpcError::Transport(_) => "transport",
            RpcError::Timeout { .. } => "timeout",
            RpcError::NoResponders { .. } => "no_responders",
            RpcError::Remote(_) => "remote",
        }
    }
}

/// A request/reply channel to destinations.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Send `payload` to `destination` under `operation` and wait for the reply.
    async fn call(
        &self,
        destination: &DestinationId,
        operation: &str,
        payload: Bytes,
    ) -> Result<Bytes, RpcError>;
}

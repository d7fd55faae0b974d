//! HTTP ingress bridge library.
//!
//! Runs one HTTP listener per linked destination and forwards every request
//! to that destination as an RPC call, translating the reply back to HTTP.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod link;
pub mod observability;
pub mod provider;
pub mod rpc;

pub use config::BridgeConfig;
pub use http::{BridgeServer, HttpRequestRecord, HttpResponseRecord};
pub use link::{DestinationId, LinkConfig, LinkDefinition, LinkError, LinkRegistry};
pub use provider::{BridgeProvider, LinkLifecycle};
pub use rpc::{RpcClient, RpcError};

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::link::{DestinationId, LinkConfig, LinkDefinition};

/// Root configuration for the bridge process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// RPC bus connection settings.
    pub rpc: RpcConfig,

    /// Settings shared by every bridge server.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Links to serve. Each becomes one listener.
    pub links: Vec<LinkEntry>,
}

/// RPC bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// NATS server URLs.
    pub servers: Vec<String>,

    /// Lattice namespace destinations live in.
    pub lattice: String,

    /// Subject prefix for invocations.
    pub subject_prefix: String,

    /// Per-call reply timeout in milliseconds.
    pub timeout_ms: u64,

    /// Connection name reported to the bus.
    pub client_name: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://127.0.0.1:4222".to_string()],
            lattice: "default".to_string(),
            subject_prefix: "wasmbus.rpc".to_string(),
            timeout_ms: 2000,
            client_name: "http-bridge".to_string(),
        }
    }
}

/// Bridge server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Upper bound on draining a listener, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A statically configured link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkEntry {
    /// Destination requests are forwarded to.
    pub destination: DestinationId,

    /// Link values; must include `address`.
    #[serde(default)]
    pub values: LinkConfig,
}

impl From<LinkEntry> for LinkDefinition {
    fn from(entry: LinkEntry) -> Self {
        LinkDefinition::new(entry.destination, entry.values)
    }
}

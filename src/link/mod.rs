//! Link subsystem.
//!
//! # Data Flow
//! ```text
//! host runtime announces link (DestinationId + LinkConfig)
//!     → provider facade
//!     → registry.rs (put: start BridgeServer, insert under lock)
//!
//! host runtime withdraws link
//!     → registry.rs (remove: pop under lock, stop in background)
//! ```
//!
//! # Design Decisions
//! - A link's configuration is copied into its server at creation
//! - The bind address lives under the well-known `address` key
//! - Address problems are reported at `put` time, never at request time

pub mod registry;

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use registry::LinkRegistry;

/// Key under which a link carries its bind address.
pub const ADDRESS_KEY: &str = "address";

/// Identifier of the remote destination a link forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DestinationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DestinationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key-value configuration attached to a link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkConfig {
    values: HashMap<String, String>,
}

impl LinkConfig {
    /// Shorthand for a config holding only a bind address.
    pub fn with_address(address: impl Into<String>) -> Self {
        let mut values = HashMap::new();
        values.insert(ADDRESS_KEY.to_string(), address.into());
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The bind address, normalised for resolution.
    ///
    /// A bare `:PORT` means every interface.
    pub fn bind_address(&self) -> Result<String, LinkError> {
        let raw = self
            .get(ADDRESS_KEY)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| LinkError::Config(format!("missing `{}` value", ADDRESS_KEY)))?;

        if raw.starts_with(':') {
            return Ok(format!("0.0.0.0{}", raw));
        }
        if !raw.contains(':') {
            return Err(LinkError::Config(format!(
                "address `{}` has no port",
                raw
            )));
        }
        Ok(raw.to_string())
    }

    /// Resolve the bind address to the first socket address it names.
    pub async fn resolve_address(&self) -> Result<SocketAddr, LinkError> {
        let address = self.bind_address()?;
        if let Ok(addr) = address.parse::<SocketAddr>() {
            return Ok(addr);
        }
        let mut addrs = tokio::net::lookup_host(address.as_str())
            .await
            .map_err(|e| LinkError::Config(format!("cannot resolve `{}`: {}", address, e)))?;
        addrs
            .next()
            .ok_or_else(|| LinkError::Config(format!("`{}` resolved to no addresses", address)))
    }
}

/// A link announcement: which destination, configured how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub destination: DestinationId,
    #[serde(default)]
    pub values: LinkConfig,
}

impl LinkDefinition {
    pub fn new(destination: impl Into<DestinationId>, values: LinkConfig) -> Self {
        Self {
            destination: destination.into(),
            values,
        }
    }
}

/// Errors surfaced to the caller of `put`.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Missing or unusable link configuration.
    #[error("invalid link configuration: {0}")]
    Config(String),

    /// The listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server was already stopped and cannot be restarted.
    #[error("bridge server for {0} has already stopped")]
    Stopped(DestinationId),

    /// The registry has been drained for shutdown.
    #[error("link registry is shut down; {0} was not registered")]
    ShutDown(DestinationId),
}

//! Provider facade driven by the host runtime.
//!
//! Translates link lifecycle callbacks into registry operations:
//!
//! ```text
//! on_link_added   → LinkRegistry::put
//! on_link_removed → LinkRegistry::remove
//! on_shutdown     → LinkRegistry::drain_all
//! health_check    → "" (process liveness only)
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::server::BridgeSettings;
use crate::link::{DestinationId, LinkDefinition, LinkError, LinkRegistry};
use crate::rpc::RpcClient;

/// Callbacks a host runtime invokes as links come and go.
#[async_trait]
pub trait LinkLifecycle: Send + Sync {
    async fn on_link_added(&self, link: LinkDefinition) -> Result<(), LinkError>;

    async fn on_link_removed(&self, destination: &DestinationId);

    async fn on_shutdown(&self);

    /// Liveness message. Reports only that the process is up.
    fn health_check(&self) -> String;
}

/// HTTP bridge provider: one listener per linked destination.
pub struct BridgeProvider {
    registry: LinkRegistry,
}

impl BridgeProvider {
    pub fn new(rpc: Arc<dyn RpcClient>, settings: BridgeSettings) -> Self {
        Self {
            registry: LinkRegistry::new(rpc, settings),
        }
    }

    pub fn registry(&self) -> &LinkRegistry {
        &self.registry
    }
}

#[async_trait]
impl LinkLifecycle for BridgeProvider {
    async fn on_link_added(&self, link: LinkDefinition) -> Result<(), LinkError> {
        let LinkDefinition { destination, values } = link;
        match self.registry.put(destination.clone(), values).await {
            Ok(addr) => {
                tracing::info!(destination = %destination, address = %addr, "Link added");
                Ok(())
            }
            Err(e) => {
                tracing::error!(destination = %destination, error = %e, "Failed to add link");
                Err(e)
            }
        }
    }

    async fn on_link_removed(&self, destination: &DestinationId) {
        self.registry.remove(destination);
    }

    async fn on_shutdown(&self) {
        tracing::info!(links = self.registry.len(), "Provider shutting down");
        self.registry.drain_all().await;
    }

    fn health_check(&self) -> String {
        String::new()
    }
}

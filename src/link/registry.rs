//! Registry of running bridge servers, one per destination.
//!
//! # Responsibilities
//! - Start a server when a link is added and record it under its id
//! - Stop and forget a server when its link is removed
//! - Drain every server on process shutdown
//!
//! # Design Decisions
//! - One mutex guards the whole map; it is held only for the map mutation
//! - Binding and draining happen outside the lock
//! - `remove` stops in a detached task so the caller never waits on a drain
//! - `drain_all` closes the registry; a `put` still binding at that point
//!   stops its own server instead of registering it

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;

use crate::http::server::{BridgeServer, BridgeSettings};
use crate::link::{DestinationId, LinkConfig, LinkError};
use crate::observability::metrics;
use crate::rpc::RpcClient;

/// Concurrency-safe map from destination to its bridge server.
pub struct LinkRegistry {
    state: Mutex<RegistryState>,
    rpc: Arc<dyn RpcClient>,
    settings: BridgeSettings,
}

#[derive(Default)]
struct RegistryState {
    servers: HashMap<DestinationId, BridgeServer>,
    closed: bool,
}

impl LinkRegistry {
    pub fn new(rpc: Arc<dyn RpcClient>, settings: BridgeSettings) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            rpc,
            settings,
        }
    }

    // The map has no intermediate states, so a poisoned lock is still usable.
    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a server for `id` and register it.
    ///
    /// An existing server for `id` is stopped before the new one binds, so
    /// a link re-announced with the same address can take it over.
    /// Fails with [`LinkError::ShutDown`] once the registry has been drained.
    pub async fn put(&self, id: DestinationId, config: LinkConfig) -> Result<SocketAddr, LinkError> {
        let previous = {
            let mut state = self.state();
            if state.closed {
                return Err(LinkError::ShutDown(id));
            }
            state.servers.remove(&id)
        };
        if let Some(mut previous) = previous {
            tracing::info!(destination = %id, "Replacing existing bridge server");
            previous.stop().await;
        }

        let mut server = BridgeServer::new(id.clone(), config, Arc::clone(&self.rpc), self.settings.clone());
        let addr = server.start().await?;

        let inserted = {
            let mut state = self.state();
            if state.closed {
                Err(server)
            } else {
                let displaced = state.servers.insert(id.clone(), server);
                Ok((displaced, state.servers.len()))
            }
        };
        let (displaced, count) = match inserted {
            Ok(inserted) => inserted,
            Err(mut server) => {
                tracing::warn!(destination = %id, "Registry drained while binding, stopping new server");
                server.stop().await;
                return Err(LinkError::ShutDown(id));
            }
        };
        metrics::set_active_links(count);

        // A concurrent put for the same id may have inserted first.
        if let Some(mut displaced) = displaced {
            tracing::warn!(destination = %id, "Concurrent link update, stopping displaced server");
            displaced.stop().await;
        }

        Ok(addr)
    }

    /// Forget `id` and stop its server in the background. Unknown ids are ignored.
    pub fn remove(&self, id: &DestinationId) {
        let (removed, count) = {
            let mut state = self.state();
            let removed = state.servers.remove(id);
            (removed, state.servers.len())
        };

        let Some(mut server) = removed else {
            tracing::debug!(destination = %id, "Remove for unknown link ignored");
            return;
        };
        metrics::set_active_links(count);

        tracing::info!(destination = %id, "Link removed, stopping bridge server");
        tokio::spawn(async move {
            server.stop().await;
        });
    }

    /// Stop every server, empty the registry and refuse further `put`s.
    ///
    /// Stops run concurrently, so this returns within one shutdown timeout.
    pub async fn drain_all(&self) {
        let drained: Vec<BridgeServer> = {
            let mut state = self.state();
            state.closed = true;
            state.servers.drain().map(|(_, server)| server).collect()
        };
        metrics::set_active_links(0);

        if drained.is_empty() {
            return;
        }

        tracing::info!(count = drained.len(), "Draining all bridge servers");
        join_all(drained.into_iter().map(|mut server| async move {
            server.stop().await;
        }))
        .await;
    }

    pub fn contains(&self, id: &DestinationId) -> bool {
        self.state().servers.contains_key(id)
    }

    /// Bound address of the server for `id`, if registered.
    pub fn local_addr(&self, id: &DestinationId) -> Option<SocketAddr> {
        self.state().servers.get(id).and_then(BridgeServer::local_addr)
    }

    pub fn ids(&self) -> Vec<DestinationId> {
        self.state().servers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state().servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().servers.is_empty()
    }
}

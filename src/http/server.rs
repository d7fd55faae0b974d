//! Per-link bridge server.
//!
//! # Responsibilities
//! - Bind the link's listener and serve it on a background task
//! - Answer the liveness probe without involving the destination
//! - Forward every other request: translate, dispatch over RPC, translate back
//! - Drain the listener on stop, bounded by the shutdown timeout
//!
//! # Lifecycle
//! ```text
//! Created ──start()──▶ Running ──stop()──▶ Stopping ──▶ Stopped
//!    │ bind failure: stays Created
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::translate::{apply_response_record, error_response, to_request_record, TranslationError};
use crate::link::{DestinationId, LinkConfig, LinkError};
use crate::observability::metrics;
use crate::rpc::{codec, RpcClient, RpcError, HANDLE_REQUEST_OPERATION};

/// Liveness probe answered locally with 204.
pub const HEALTHZ_PATH: &str = "/healthz";

/// How long `stop()` waits for in-flight requests to drain.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by every bridge server.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub shutdown_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl From<&ServerConfig> for BridgeSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// State injected into handlers.
#[derive(Clone)]
struct BridgeState {
    destination: DestinationId,
    rpc: Arc<dyn RpcClient>,
}

struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// HTTP listener forwarding to a single destination.
///
/// Dropping a running server closes its shutdown channel, which starts
/// the same graceful drain as `stop()` without waiting for it.
pub struct BridgeServer {
    destination: DestinationId,
    config: LinkConfig,
    rpc: Arc<dyn RpcClient>,
    settings: BridgeSettings,
    state: ServerState,
    running: Option<RunningServer>,
}

impl BridgeServer {
    pub fn new(
        destination: DestinationId,
        config: LinkConfig,
        rpc: Arc<dyn RpcClient>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            destination,
            config,
            rpc,
            settings,
            state: ServerState::Created,
            running: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Address the listener is bound to, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Bind the listener and start serving in the background.
    ///
    /// Returns once the listener is bound. Failures after that point are
    /// logged by the serving task.
    pub async fn start(&mut self) -> Result<SocketAddr, LinkError> {
        match self.state {
            ServerState::Created => {}
            ServerState::Running => {
                if let Some(addr) = self.local_addr() {
                    return Ok(addr);
                }
            }
            ServerState::Stopping | ServerState::Stopped => {
                return Err(LinkError::Stopped(self.destination.clone()));
            }
        }

        let address = self.config.resolve_address().await?;
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| LinkError::Bind { address, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| LinkError::Bind { address, source })?;

        let app = router(BridgeState {
            destination: self.destination.clone(),
            rpc: Arc::clone(&self.rpc),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let destination = self.destination.clone();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(destination = %destination, error = %e, "Bridge server stopped serving");
            }
        });

        tracing::info!(
            destination = %self.destination,
            address = %local_addr,
            "Bridge server listening"
        );

        self.running = Some(RunningServer {
            local_addr,
            shutdown_tx,
            task,
        });
        self.state = ServerState::Running;
        Ok(local_addr)
    }

    /// Drain and close the listener. Always ends in `Stopped`.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            self.state = ServerState::Stopped;
            return;
        };
        self.state = ServerState::Stopping;

        let RunningServer {
            local_addr,
            shutdown_tx,
            mut task,
        } = running;
        let _ = shutdown_tx.send(());

        match tokio::time::timeout(self.settings.shutdown_timeout, &mut task).await {
            Ok(Ok(())) => {
                tracing::info!(destination = %self.destination, address = %local_addr, "Bridge server stopped");
            }
            Ok(Err(e)) => {
                tracing::error!(destination = %self.destination, error = %e, "Bridge server task failed");
            }
            Err(_) => {
                tracing::warn!(
                    destination = %self.destination,
                    timeout = ?self.settings.shutdown_timeout,
                    "Drain timed out, aborting open connections"
                );
                task.abort();
                let _ = task.await;
            }
        }

        self.state = ServerState::Stopped;
    }
}

fn router(state: BridgeState) -> Router {
    Router::new()
        .route(HEALTHZ_PATH, any(healthz))
        .fallback(forward)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Error)]
enum ForwardError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Forward a request to this server's destination.
async fn forward(State(state): State<BridgeState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();

    tracing::debug!(
        destination = %state.destination,
        method = %request.method(),
        path = %request.uri().path(),
        "Forwarding request"
    );

    let response = match dispatch(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            if let ForwardError::Rpc(rpc) = &e {
                metrics::record_rpc_error(&state.destination, rpc.kind());
            }
            tracing::warn!(destination = %state.destination, error = %e, "Request to destination failed");
            error_response(&e)
        }
    };

    metrics::record_request(&state.destination, response.status().as_u16(), start_time);
    response
}

async fn dispatch(state: &BridgeState, request: Request<Body>) -> Result<Response, ForwardError> {
    let record = to_request_record(request).await?;
    let payload = codec::encode_request(&record)?;
    let reply = state
        .rpc
        .call(&state.destination, HANDLE_REQUEST_OPERATION, payload.into())
        .await?;
    let response = codec::decode_response(&reply)?;
    Ok(apply_response_record(response)?)
}

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection on a link's bind address
//!     → server.rs (Axum setup, liveness probe, request ID, tracing)
//!     → translate.rs (native request → HttpRequestRecord)
//!     → [rpc: encode, call destination, decode reply]
//!     → translate.rs (HttpResponseRecord → native response)
//!     → Send to client
//! ```

pub mod record;
pub mod server;
pub mod translate;

pub use record::{HttpRequestRecord, HttpResponseRecord, RecordHeaders};
pub use server::{BridgeServer, BridgeSettings, ServerState, HEALTHZ_PATH};
pub use translate::TranslationError;

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging/metrics → Connect RPC bus → LinkSync::apply
//!
//! Reload (sync.rs):
//!     Config watcher → LinkSync::apply → on_link_removed / on_link_added
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → on_shutdown → drain every bridge server → Exit
//! ```
//!
//! # Design Decisions
//! - The static link list plays the host runtime's role of announcing links
//! - Shutdown has a timeout: each drain is bounded, and drains run together

pub mod signals;
pub mod sync;

pub use signals::shutdown_signal;
pub use sync::{LinkSync, SyncReport};

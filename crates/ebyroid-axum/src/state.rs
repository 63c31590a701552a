//! Shared application state type.

use std::sync::Arc;

use ebyroid_core::Ebyroid;

/// Everything the HTTP handlers need.
pub struct ServerContext {
    /// The coordinator over the native engine.
    pub ebyroid: Arc<Ebyroid>,
    /// Name of the voiceroid loaded at startup. Requests naming it (or
    /// naming nothing) take the fast path unconditionally.
    pub default_name: String,
}

/// Application state shared across all handlers.
pub type AppState = Arc<ServerContext>;

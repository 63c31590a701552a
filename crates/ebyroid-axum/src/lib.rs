//! Axum web adapter for ebyroid.
//!
//! Exposes the coordinator over the small `/api/v1` surface the original
//! audiostream server offered: a health check, raw PCM streaming and a
//! complete WAV download. All synthesis scheduling lives in
//! [`ebyroid_core`]; handlers here are thin wrappers.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::HttpError;
pub use routes::create_router;
pub use server::serve;
pub use state::{AppState, ServerContext};

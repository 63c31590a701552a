//! Access coordination for the native VOICEROID speech engine.
//!
//! The native library can hold exactly one voice library at a time, switching
//! it is expensive, and only a couple of synthesis calls may run at once.
//! This crate owns that scheduling problem: the [`gate`] module provides the
//! hybrid shared/exclusive primitive, [`ebyroid`] the per-request decision
//! and ordering protocol on top of it. Transport concerns (HTTP, CLI) live
//! in sibling crates.

pub mod ebyroid;
pub mod engine;
pub mod error;
pub mod gate;
pub mod voiceroid;
pub mod wave;

// Re-export key types for convenience
pub use ebyroid::Ebyroid;
pub use engine::{ENGINE_CONCURRENCY, NullEngine, SpeechEngine};
pub use error::EbyroidError;
pub use gate::{AccessGate, ExclusivePermit, SharedPermit};
pub use voiceroid::{Voiceroid, VoiceroidOptions, VoiceroidVersion};
pub use wave::WaveObject;

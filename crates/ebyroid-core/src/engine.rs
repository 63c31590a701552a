//! Speech engine backend trait — the boundary to the native library.
//!
//! The coordinator never reimplements synthesis; it only schedules calls
//! against whatever implements [`SpeechEngine`]. The trait mirrors the four
//! single-shot operations the native VOICEROID adapter exposes. None of them
//! are internally reentrant beyond the engine's own small concurrency
//! ceiling (empirically two simultaneous calls), which is why the
//! coordinator guards every invocation with its access gate.

use async_trait::async_trait;

use crate::error::EbyroidError;

/// How many synthesis calls the native library tolerates at once.
///
/// The library keeps an internal queue of two; anything beyond that is
/// rejected, so the coordinator's shared capacity is pinned here.
pub const ENGINE_CONCURRENCY: usize = 2;

/// Backend-agnostic interface to the native speech engine.
///
/// Implementations must be `Send + Sync`; the coordinator holds them behind
/// an `Arc<dyn SpeechEngine>` across `.await` points.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Load (or reload) a voice library. Expensive — takes seconds — and
    /// must never overlap any other engine call.
    async fn load(
        &self,
        base_dir_path: &str,
        voice_dir_name: &str,
        volume: f32,
    ) -> Result<(), EbyroidError>;

    /// Synthesize text against the currently loaded library.
    ///
    /// Returns signed 16-bit mono PCM at the library's native sample rate.
    async fn synthesize(&self, text: &str, volume: f32) -> Result<Vec<i16>, EbyroidError>;

    /// Reinterpret text into the 'AI Kana' intermediate representation the
    /// engine uses internally.
    async fn text_to_kana(&self, text: &str) -> Result<String, EbyroidError>;

    /// Read out text already written in 'AI Kana'.
    async fn kana_to_speech(&self, kana: &str) -> Result<Vec<i16>, EbyroidError>;
}

/// Development stand-in used when no native library binding is available.
///
/// Produces silence proportional to the input length so the HTTP surface and
/// the coordination layer can be exercised end to end on machines without a
/// VOICEROID install.
#[derive(Debug, Default)]
pub struct NullEngine;

/// Silence emitted per input character, at the pretend native rate.
const SAMPLES_PER_CHAR: usize = 2_205; // 100 ms at 22 050 Hz

#[async_trait]
impl SpeechEngine for NullEngine {
    async fn load(
        &self,
        base_dir_path: &str,
        voice_dir_name: &str,
        volume: f32,
    ) -> Result<(), EbyroidError> {
        tracing::info!(base_dir_path, voice_dir_name, volume, "null engine load");
        Ok(())
    }

    async fn synthesize(&self, text: &str, _volume: f32) -> Result<Vec<i16>, EbyroidError> {
        let chars = text.chars().count().max(1);
        Ok(vec![0i16; chars * SAMPLES_PER_CHAR])
    }

    async fn text_to_kana(&self, text: &str) -> Result<String, EbyroidError> {
        Ok(text.to_string())
    }

    async fn kana_to_speech(&self, kana: &str) -> Result<Vec<i16>, EbyroidError> {
        self.synthesize(kana, 0.0).await
    }
}

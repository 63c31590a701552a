//! The `Ebyroid` coordinator — mediates concurrent access to the native
//! speech engine.
//!
//! The engine holds exactly one voice library at a time. Switching libraries
//! takes seconds and must see a quiescent engine, while synthesis against
//! the already-loaded library may run with bounded concurrency. Per request
//! the coordinator decides between:
//!
//! - **fast path** — no reload needed: take a shared slot on the
//!   [`AccessGate`], synthesize, done;
//! - **slow path** — reload required: register the target in the reload
//!   queue, take the gate exclusively, reload + synthesize, publish the new
//!   loaded state.
//!
//! The reload decision compares against the *last registered* reload target
//! when one is in flight, not against the possibly-stale loaded state, so a
//! burst of requests for the same new voice collapses onto a single reload.
//!
//! # Locking discipline
//!
//! `state` is a std `Mutex` and is never held across an `.await` point. The
//! decision, the reload-queue registration and the gate enqueue happen in
//! one critical section, which keeps reload-queue order identical to
//! exclusive-grant order — the head check in `PendingQueue::unregister`
//! enforces exactly that.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::engine::{ENGINE_CONCURRENCY, SpeechEngine};
use crate::error::EbyroidError;
use crate::gate::{AccessGate, ExclusiveAcquire};
use crate::voiceroid::Voiceroid;
use crate::wave::WaveObject;

// ── Loaded state ─────────────────────────────────────────────────────────────

/// What the engine currently has in memory.
///
/// `Failed` records a reload that errored out: the library is in an unknown
/// state, so every subsequent request is forced back through the slow path
/// instead of trusting a broken load. (The original implementation faked
/// this with a profile clone whose identity could never match anything.)
#[derive(Debug, Clone)]
enum LoadedState {
    Unloaded,
    Loaded(Voiceroid),
    Failed(String),
}

impl LoadedState {
    /// The profile usable for fast-path synthesis, if any.
    fn current(&self) -> Option<&Voiceroid> {
        match self {
            LoadedState::Loaded(vr) => Some(vr),
            LoadedState::Unloaded | LoadedState::Failed(_) => None,
        }
    }

    /// Whether serving `requested` requires an exclusive reload.
    fn needs_reload(&self, requested: &Voiceroid) -> bool {
        match self {
            LoadedState::Loaded(cur) => !cur.uses_same_library(requested),
            LoadedState::Unloaded | LoadedState::Failed(_) => true,
        }
    }
}

// ── Pending reload queue ─────────────────────────────────────────────────────

/// Profiles committed to a reload whose reload has not yet completed.
///
/// Removal must happen in registration order. The coordinator uses "is this
/// the head" as its correctness check that an exclusive grant corresponds to
/// the reload it registered, so an out-of-order removal is a fatal
/// programming error, not something to recover from.
#[derive(Debug, Default)]
struct PendingQueue {
    entries: VecDeque<Voiceroid>,
}

impl PendingQueue {
    fn register(&mut self, vr: Voiceroid) {
        self.entries.push_back(vr);
    }

    /// Remove the head entry, which must equal `expected`.
    fn unregister(&mut self, expected: &Voiceroid) {
        let head = self
            .entries
            .pop_front()
            .expect("unregister called on an empty reload queue");
        assert!(
            head == *expected,
            "reload queue head mismatch: expected \"{}\", found \"{}\"",
            expected.name(),
            head.name(),
        );
    }

    /// The most recently registered target, i.e. what the engine will have
    /// loaded once all in-flight reloads complete.
    fn tail(&self) -> Option<&Voiceroid> {
        self.entries.back()
    }
}

// ── Coordinator ──────────────────────────────────────────────────────────────

struct EngineState {
    loaded: LoadedState,
    pending: PendingQueue,
}

/// Where a synthesis request goes after the reload decision.
enum Route {
    Fast,
    /// The exclusive acquisition, enqueued atomically with the reload-queue
    /// registration.
    Slow(ExclusiveAcquire),
}

/// Coordinates every call into one [`SpeechEngine`] instance.
///
/// One coordinator owns one engine's loaded state; two coordinators must
/// never share a physical engine.
pub struct Ebyroid {
    engine: Arc<dyn SpeechEngine>,
    voiceroids: Vec<Voiceroid>,
    gate: AccessGate,
    state: Mutex<EngineState>,
}

impl std::fmt::Debug for Ebyroid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ebyroid")
            .field("voiceroids", &self.voiceroids)
            .finish_non_exhaustive()
    }
}

impl Ebyroid {
    /// Build a coordinator over `engine` with the usable profiles.
    ///
    /// # Errors
    /// Rejects an empty profile list and duplicate profile names.
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        voiceroids: Vec<Voiceroid>,
    ) -> Result<Self, EbyroidError> {
        if voiceroids.is_empty() {
            return Err(EbyroidError::NoVoiceroids);
        }
        for (i, vr) in voiceroids.iter().enumerate() {
            if voiceroids[..i].iter().any(|v| v.name() == vr.name()) {
                return Err(EbyroidError::DuplicateName(vr.name().to_string()));
            }
        }
        debug!(count = voiceroids.len(), "coordinator configured");
        Ok(Self {
            engine,
            voiceroids,
            gate: AccessGate::new(ENGINE_CONCURRENCY),
            state: Mutex::new(EngineState {
                loaded: LoadedState::Unloaded,
                pending: PendingQueue::default(),
            }),
        })
    }

    /// The configured profiles, in registration order.
    pub fn voiceroids(&self) -> &[Voiceroid] {
        &self.voiceroids
    }

    fn find(&self, name: &str) -> Result<&Voiceroid, EbyroidError> {
        self.voiceroids
            .iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| EbyroidError::UnknownVoiceroid(name.to_string()))
    }

    /// Switch the engine to a specific voice library.
    ///
    /// Also serves as the bootstrap load: the server calls this once before
    /// accepting traffic. The switch is exclusive and may take seconds; any
    /// concurrent fast-path request queues behind it.
    pub async fn use_voiceroid(&self, name: &str) -> Result<(), EbyroidError> {
        let vr = self.find(name)?.clone();

        let acquire = {
            let mut state = self.state.lock().unwrap();
            state.pending.register(vr.clone());
            self.gate.acquire_exclusive()
        };
        let permit = acquire.await;

        info!(name = vr.name(), voice = vr.voice_dir_name(), "loading voice library");
        let result = self
            .engine
            .load(vr.base_dir_path(), vr.voice_dir_name(), vr.volume())
            .await;
        self.finish_reload(&vr, result.is_ok());
        drop(permit);
        result
    }

    /// Convert text to PCM using whatever library is currently loaded.
    ///
    /// Prefer this whenever the voice does not matter: it only ever takes a
    /// shared slot and never triggers a reload.
    pub async fn convert(&self, text: &str) -> Result<WaveObject, EbyroidError> {
        let permit = self.gate.acquire_shared().await;
        let (volume, rate) = {
            let state = self.state.lock().unwrap();
            match state.loaded.current() {
                Some(cur) => (cur.volume(), cur.base_sample_rate()),
                None => return Err(EbyroidError::NotReady),
            }
        };
        let samples = self.engine.synthesize(text, volume).await?;
        drop(permit);
        Ok(WaveObject::new(samples, rate))
    }

    /// Convert text to PCM with a specific voice.
    ///
    /// When the demanded voice is not the one currently loaded this acquires
    /// the gate exclusively and reloads the native library, blocking all
    /// other requests for a fair amount of time — like two or three seconds.
    pub async fn convert_ex(&self, text: &str, name: &str) -> Result<WaveObject, EbyroidError> {
        let vr = self.find(name)?.clone();

        loop {
            let route = {
                let mut state = self.state.lock().unwrap();
                let reload = match state.pending.tail() {
                    // An exclusive reload is in flight: decide against its
                    // target, not the stale loaded state, so same-target
                    // requests collapse instead of re-triggering the reload.
                    Some(tail) => !tail.uses_same_library(&vr),
                    None => state.loaded.needs_reload(&vr),
                };
                if reload {
                    state.pending.register(vr.clone());
                    Route::Slow(self.gate.acquire_exclusive())
                } else {
                    Route::Fast
                }
            };

            match route {
                Route::Fast => {
                    if let Some(wave) = self.fast_path(&vr, text).await? {
                        return Ok(wave);
                    }
                    // Escalated: the loaded library changed (or a reload
                    // failed) between the decision and the grant. Restart
                    // as a fresh request.
                    debug!(name = vr.name(), "fast path escalated, re-deciding");
                }
                Route::Slow(acquire) => return self.slow_path(&vr, text, acquire).await,
            }
        }
    }

    /// Fast path: shared slot, synthesize against the loaded library.
    ///
    /// Returns `Ok(None)` when the request must escalate because the loaded
    /// library no longer matches — synthesizing with the wrong voice loaded
    /// is never acceptable.
    async fn fast_path(
        &self,
        vr: &Voiceroid,
        text: &str,
    ) -> Result<Option<WaveObject>, EbyroidError> {
        let permit = self.gate.acquire_shared().await;
        {
            let state = self.state.lock().unwrap();
            match state.loaded.current() {
                Some(cur) if cur.uses_same_library(vr) => {}
                _ => return Ok(None),
            }
        }
        // Same library as requested; the requested profile's playback
        // parameters apply without a reload.
        let samples = self.engine.synthesize(text, vr.volume()).await?;
        drop(permit);
        Ok(Some(WaveObject::new(samples, vr.base_sample_rate())))
    }

    /// Slow path: exclusive reload followed by synthesis, then publish the
    /// outcome. The permit is released unconditionally.
    async fn slow_path(
        &self,
        vr: &Voiceroid,
        text: &str,
        acquire: ExclusiveAcquire,
    ) -> Result<WaveObject, EbyroidError> {
        let permit = acquire.await;

        info!(name = vr.name(), voice = vr.voice_dir_name(), "reloading voice library");
        let result = async {
            self.engine
                .load(vr.base_dir_path(), vr.voice_dir_name(), vr.volume())
                .await?;
            let samples = self.engine.synthesize(text, vr.volume()).await?;
            Ok(WaveObject::new(samples, vr.base_sample_rate()))
        }
        .await;

        self.finish_reload(vr, result.is_ok());
        drop(permit);
        result
    }

    /// Unregister `vr` from the reload queue (it must be the head) and
    /// publish the new loaded state before the exclusive permit drops.
    fn finish_reload(&self, vr: &Voiceroid, success: bool) {
        let mut state = self.state.lock().unwrap();
        state.pending.unregister(vr);
        if success {
            state.loaded = LoadedState::Loaded(vr.clone());
        } else {
            warn!(name = vr.name(), "voice library reload failed, forcing future reloads");
            state.loaded = LoadedState::Failed(vr.name().to_string());
        }
    }

    /// Raw API call: reinterpret text into the 'AI Kana' intermediate
    /// representation. Operates on whatever library is currently loaded.
    pub async fn text_to_kana(&self, text: &str) -> Result<String, EbyroidError> {
        let permit = self.gate.acquire_shared().await;
        self.ensure_loaded()?;
        let kana = self.engine.text_to_kana(text).await?;
        drop(permit);
        Ok(kana)
    }

    /// Raw API call: read out text already written in 'AI Kana'. Operates
    /// on whatever library is currently loaded.
    pub async fn kana_to_speech(&self, kana: &str) -> Result<WaveObject, EbyroidError> {
        let permit = self.gate.acquire_shared().await;
        let rate = {
            let state = self.state.lock().unwrap();
            match state.loaded.current() {
                Some(cur) => cur.base_sample_rate(),
                None => return Err(EbyroidError::NotReady),
            }
        };
        let samples = self.engine.kana_to_speech(kana).await?;
        drop(permit);
        Ok(WaveObject::new(samples, rate))
    }

    fn ensure_loaded(&self) -> Result<(), EbyroidError> {
        let state = self.state.lock().unwrap();
        match state.loaded.current() {
            Some(_) => Ok(()),
            None => Err(EbyroidError::NotReady),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voiceroid::VoiceroidOptions;

    fn profile(name: &str, voice: &str) -> Voiceroid {
        Voiceroid::new(name, "C:\\AHS", voice, VoiceroidOptions::default()).unwrap()
    }

    #[test]
    fn pending_queue_removes_in_fifo_order() {
        let mut queue = PendingQueue::default();
        let a = profile("A", "zunko_22");
        let b = profile("B", "kiritan_22");
        queue.register(a.clone());
        queue.register(b.clone());
        assert_eq!(queue.tail().unwrap().name(), "B");

        queue.unregister(&a);
        queue.unregister(&b);
        assert!(queue.tail().is_none());
    }

    #[test]
    #[should_panic(expected = "reload queue head mismatch")]
    fn pending_queue_rejects_non_head_removal() {
        let mut queue = PendingQueue::default();
        let a = profile("A", "zunko_22");
        let b = profile("B", "kiritan_22");
        queue.register(a);
        queue.register(b.clone());
        queue.unregister(&b);
    }

    #[test]
    #[should_panic(expected = "empty reload queue")]
    fn pending_queue_rejects_removal_when_empty() {
        let mut queue = PendingQueue::default();
        queue.unregister(&profile("A", "zunko_22"));
    }

    #[test]
    fn failed_state_always_needs_reload() {
        let a = profile("A", "zunko_22");
        assert!(LoadedState::Unloaded.needs_reload(&a));
        assert!(LoadedState::Failed("A".into()).needs_reload(&a));
        assert!(!LoadedState::Loaded(a.clone()).needs_reload(&a));

        let same_lib = profile("A loud", "zunko_22");
        assert!(!LoadedState::Loaded(a.clone()).needs_reload(&same_lib));
        let other = profile("B", "kiritan_22");
        assert!(LoadedState::Loaded(a).needs_reload(&other));
    }
}

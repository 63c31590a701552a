//! Integration tests for the `Ebyroid` coordinator.
//!
//! These drive the reload decision protocol with a scripted engine — no
//! native library, no audio. Time is paused (`start_paused`), so the sleeps
//! inside the scripted engine model slow native calls deterministically:
//! every interleaving below is forced by the gate, not by wall-clock luck.
//!
//! # What is tested
//!
//! - The bootstrap load and the fast path against a loaded library
//! - A burst of requests for one new voice collapses onto a single reload,
//!   and a request for a different voice queues behind it in order
//! - A failed reload poisons the loaded state: the next request for the
//!   same voice goes through the slow path again
//! - Same-library profiles switch without any reload
//! - Synthesis before any load fails with `NotReady` instead of crashing
//! - At most two synthesis calls ever run inside the engine at once

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use ebyroid_core::{Ebyroid, EbyroidError, SpeechEngine, Voiceroid, VoiceroidOptions, WaveObject};

// ── Scripted engine ──────────────────────────────────────────────────────────

/// Engine double that records load order and probes synthesis concurrency.
///
/// `load` takes two paused-time seconds and `synthesize` ten milliseconds,
/// mimicking the real cost ratio between a library reload and a synthesis
/// call.
#[derive(Default)]
struct ScriptedEngine {
    /// Voice directory of every `load` call, in order.
    loads: Mutex<Vec<String>>,
    /// Number of upcoming `load` calls that should fail.
    fail_loads: AtomicUsize,
    /// Number of upcoming `synthesize` calls that should fail.
    fail_synths: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedEngine {
    fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    fn fail_next_load(&self) {
        self.fail_loads.fetch_add(1, Ordering::SeqCst);
    }

    fn fail_next_synth(&self) {
        self.fail_synths.fetch_add(1, Ordering::SeqCst);
    }

    fn max_concurrent_synths(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn load(
        &self,
        _base_dir_path: &str,
        voice_dir_name: &str,
        _volume: f32,
    ) -> Result<(), EbyroidError> {
        self.loads.lock().unwrap().push(voice_dir_name.to_string());
        sleep(Duration::from_secs(2)).await;
        if self.fail_loads.load(Ordering::SeqCst) > 0 {
            self.fail_loads.fetch_sub(1, Ordering::SeqCst);
            return Err(EbyroidError::Engine {
                code: Some(-18),
                message: "library initialization failed".to_string(),
            });
        }
        Ok(())
    }

    async fn synthesize(&self, text: &str, _volume: f32) -> Result<Vec<i16>, EbyroidError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        sleep(Duration::from_millis(10)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        if self.fail_synths.load(Ordering::SeqCst) > 0 {
            self.fail_synths.fetch_sub(1, Ordering::SeqCst);
            return Err(EbyroidError::engine("synthesis failed"));
        }
        Ok(vec![0i16; text.chars().count().max(1)])
    }

    async fn text_to_kana(&self, text: &str) -> Result<String, EbyroidError> {
        Ok(format!("<S>{text}<N>"))
    }

    async fn kana_to_speech(&self, kana: &str) -> Result<Vec<i16>, EbyroidError> {
        self.synthesize(kana, 0.0).await
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn profile(name: &str, voice: &str, volume: Option<f32>) -> Voiceroid {
    Voiceroid::new(
        name,
        "C:\\Program Files (x86)\\AHS\\VOICEROID+",
        voice,
        VoiceroidOptions {
            volume,
            ..Default::default()
        },
    )
    .unwrap()
}

fn coordinator() -> (Arc<ScriptedEngine>, Ebyroid) {
    let engine = Arc::new(ScriptedEngine::default());
    let ebyroid = Ebyroid::new(
        engine.clone(),
        vec![
            profile("A", "zunko_22", None),
            profile("A loud", "zunko_22", Some(4.0)),
            profile("B", "kiritan_22", None),
        ],
    )
    .unwrap();
    (engine, ebyroid)
}

// ── Construction ─────────────────────────────────────────────────────────────

#[test]
fn construction_requires_profiles() {
    let engine = Arc::new(ScriptedEngine::default());
    assert!(matches!(
        Ebyroid::new(engine, vec![]).unwrap_err(),
        EbyroidError::NoVoiceroids
    ));
}

#[test]
fn construction_rejects_duplicate_names() {
    let engine = Arc::new(ScriptedEngine::default());
    let err = Ebyroid::new(
        engine,
        vec![
            profile("A", "zunko_22", None),
            profile("A", "kiritan_22", None),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, EbyroidError::DuplicateName(name) if name == "A"));
}

// ── Bootstrap and fast path ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn bootstrap_load_then_convert() {
    let (engine, ebyroid) = coordinator();

    ebyroid.use_voiceroid("A").await.unwrap();
    assert_eq!(engine.loads(), vec!["zunko_22"]);

    let wave = ebyroid.convert("こんにちは").await.unwrap();
    assert_eq!(wave.sample_rate(), 22_050);
    assert_eq!(wave.channels(), 1);
    assert_eq!(wave.bit_depth(), 16);
    // Still exactly one load: plain conversion never reloads.
    assert_eq!(engine.loads(), vec!["zunko_22"]);
}

#[tokio::test(start_paused = true)]
async fn unknown_name_is_rejected() {
    let (_engine, ebyroid) = coordinator();
    let err = ebyroid.convert_ex("hello", "Nobody").await.unwrap_err();
    assert!(matches!(err, EbyroidError::UnknownVoiceroid(name) if name == "Nobody"));
}

// ── Not-ready guards ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn synthesis_before_any_load_is_rejected() {
    let (engine, ebyroid) = coordinator();

    assert!(matches!(
        ebyroid.convert("アリガト").await.unwrap_err(),
        EbyroidError::NotReady
    ));
    assert!(matches!(
        ebyroid.text_to_kana("アリガト").await.unwrap_err(),
        EbyroidError::NotReady
    ));
    assert!(matches!(
        ebyroid.kana_to_speech("アリガト'").await.unwrap_err(),
        EbyroidError::NotReady
    ));
    assert!(engine.loads().is_empty());
}

// ── Reload collapse and ordering ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn same_target_burst_collapses_onto_one_reload() {
    let (engine, ebyroid) = coordinator();

    // R1(A), R2(A), R3(B) submitted together while nothing is loaded.
    let (r1, r2, r3) = tokio::join!(
        ebyroid.convert_ex("ichi", "A"),
        ebyroid.convert_ex("ni", "A"),
        ebyroid.convert_ex("san", "B"),
    );
    r1.unwrap();
    r2.unwrap();
    r3.unwrap();

    // One reload to A (R2 rides on R1's), then one reload to B: R3 decided
    // relative to the registered target A, not relative to "no profile".
    assert_eq!(engine.loads(), vec!["zunko_22", "kiritan_22"]);
}

#[tokio::test(start_paused = true)]
async fn request_during_reload_waits_for_the_new_library() {
    let (engine, ebyroid) = coordinator();
    ebyroid.use_voiceroid("A").await.unwrap();

    // Switch to B while a request for B arrives mid-reload. The request
    // must ride the in-flight reload and synthesize with B actually loaded.
    let (switch, req) = tokio::join!(
        ebyroid.convert_ex("switch", "B"),
        ebyroid.convert_ex("ride", "B"),
    );
    switch.unwrap();
    let wave = req.unwrap();

    assert_eq!(engine.loads(), vec!["zunko_22", "kiritan_22"]);
    assert_eq!(wave.sample_rate(), 22_050);
}

// ── Failure poisoning ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_reload_forces_slow_path_next_time() {
    let (engine, ebyroid) = coordinator();

    engine.fail_next_load();
    let err = ebyroid.use_voiceroid("A").await.unwrap_err();
    assert!(matches!(err, EbyroidError::Engine { code: Some(-18), .. }));

    // The broken load must not be mistaken for a usable library.
    assert!(matches!(
        ebyroid.convert("hello").await.unwrap_err(),
        EbyroidError::NotReady
    ));

    // The very same profile goes through the slow path again — and recovers.
    let wave = ebyroid.convert_ex("hello", "A").await.unwrap();
    assert_eq!(engine.loads(), vec!["zunko_22", "zunko_22"]);
    assert_eq!(wave.sample_rate(), 22_050);
}

#[tokio::test(start_paused = true)]
async fn failed_synthesis_does_not_poison_the_loaded_library() {
    let (engine, ebyroid) = coordinator();
    ebyroid.use_voiceroid("A").await.unwrap();

    // A fast-path engine failure only affects that request; the loaded
    // library is untouched and further conversions need no reload.
    engine.fail_next_synth();
    assert!(matches!(
        ebyroid.convert("hello").await.unwrap_err(),
        EbyroidError::Engine { .. }
    ));

    ebyroid.convert("world").await.unwrap();
    assert_eq!(engine.loads().len(), 1);
}

// ── Same-library switching ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn same_library_profile_never_triggers_a_reload() {
    let (engine, ebyroid) = coordinator();
    ebyroid.use_voiceroid("A").await.unwrap();

    // "A loud" shares zunko_22 with different volume: parameter change only.
    let wave = ebyroid.convert_ex("hello", "A loud").await.unwrap();
    assert_eq!(engine.loads(), vec!["zunko_22"]);
    assert_eq!(wave.sample_rate(), 22_050);
}

// ── Concurrency ceiling ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn at_most_two_synthesis_calls_run_concurrently() {
    let (engine, ebyroid) = coordinator();
    ebyroid.use_voiceroid("A").await.unwrap();

    let (r1, r2, r3) = tokio::join!(
        ebyroid.convert("one"),
        ebyroid.convert("two"),
        ebyroid.convert("three"),
    );
    r1.unwrap();
    r2.unwrap();
    r3.unwrap();

    assert_eq!(engine.max_concurrent_synths(), 2);
}

// ── Raw API calls ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn raw_calls_operate_on_the_loaded_library() {
    let (engine, ebyroid) = coordinator();
    ebyroid.use_voiceroid("A").await.unwrap();

    let kana = ebyroid.text_to_kana("ありがとう").await.unwrap();
    assert_eq!(kana, "<S>ありがとう<N>");

    let wave: WaveObject = ebyroid.kana_to_speech(&kana).await.unwrap();
    assert_eq!(wave.sample_rate(), 22_050);
    // Raw calls never touch the reload machinery.
    assert_eq!(engine.loads(), vec!["zunko_22"]);
}

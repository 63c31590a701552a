//! Handlers for the `/api/v1` endpoints.
//!
//! Each handler calls exactly one coordinator method and shapes the
//! response. The PCM format metadata travels in `Ebyroid-PCM-*` response
//! headers, matching what audiostream clients already parse.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use ebyroid_core::{EbyroidError, WaveObject};

use crate::error::HttpError;
use crate::state::AppState;

const PCM_SAMPLE_RATE: HeaderName = HeaderName::from_static("ebyroid-pcm-sample-rate");
const PCM_BIT_DEPTH: HeaderName = HeaderName::from_static("ebyroid-pcm-bit-depth");
const PCM_CHANNELS: HeaderName = HeaderName::from_static("ebyroid-pcm-number-of-channels");

// ── Request/response shapes ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    pub text: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct StatusBody {
    status: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /api/v1/`
pub async fn status() -> Json<StatusBody> {
    Json(StatusBody { status: "ok" })
}

/// `GET /api/v1/audiostream?text=&name=` — raw PCM bytes.
pub async fn audiostream(
    State(state): State<AppState>,
    Query(query): Query<AudioQuery>,
) -> Result<Response, HttpError> {
    let wave = convert_for(&state, query).await?;
    let mut headers = pcm_headers(&wave);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    Ok((headers, wave.pcm_bytes()).into_response())
}

/// `GET /api/v1/audiofile?text=&name=` — a complete RIFF/WAVE byte stream.
pub async fn audiofile(
    State(state): State<AppState>,
    Query(query): Query<AudioQuery>,
) -> Result<Response, HttpError> {
    let wave = convert_for(&state, query).await?;
    let mut headers = pcm_headers(&wave);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    Ok((headers, wave.to_wav_bytes()).into_response())
}

/// Fallback for anything outside the known routes.
pub async fn not_found() -> HttpError {
    HttpError::NotFound
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Run the synthesis for a query, routing through the voiceroid-switching
/// entry point only when a non-default voice is demanded.
async fn convert_for(state: &AppState, query: AudioQuery) -> Result<WaveObject, HttpError> {
    let text = query
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HttpError::BadRequest("text was not given".to_string()))?;

    let result: Result<WaveObject, EbyroidError> = match query.name.as_deref() {
        Some(name) if name != state.default_name => state.ebyroid.convert_ex(text, name).await,
        _ => state.ebyroid.convert(text).await,
    };
    Ok(result?)
}

fn pcm_headers(wave: &WaveObject) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(PCM_SAMPLE_RATE, HeaderValue::from(wave.sample_rate()));
    headers.insert(PCM_BIT_DEPTH, HeaderValue::from(wave.bit_depth()));
    headers.insert(PCM_CHANNELS, HeaderValue::from(wave.channels()));
    headers
}

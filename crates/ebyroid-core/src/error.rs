//! Ebyroid error types.

/// Errors surfaced by profile construction and the coordination layer.
///
/// Invariant breaks (reload queue head mismatch, gate misuse) are treated as
/// fatal programming errors and panic instead of appearing here.
#[derive(Debug, thiserror::Error)]
pub enum EbyroidError {
    /// The coordinator was constructed with an empty profile list.
    #[error("at least one voiceroid must be given")]
    NoVoiceroids,

    /// A profile name was used twice within one coordinator.
    #[error("voiceroid name \"{0}\" is used more than once")]
    DuplicateName(String),

    /// No registered profile answers to the requested name.
    #[error("could not find a voiceroid by identifier \"{0}\"")]
    UnknownVoiceroid(String),

    /// Synthesis was requested before any voice library was loaded.
    #[error("no voice library has been loaded yet")]
    NotReady,

    /// Volume outside the supported 0.0–5.0 range.
    #[error("volume should range from 0.0 to 5.0, got {0}")]
    VolumeOutOfRange(f32),

    /// Output sample rate the native library cannot produce.
    #[error("sample rate should be one of 22050, 44100 or 48000, got {0}")]
    UnsupportedSampleRate(u32),

    /// Output channel count other than mono or stereo.
    #[error("channels should be 1 or 2, got {0}")]
    UnsupportedChannels(u16),

    /// The native API cannot handle non-ASCII install paths.
    #[error("the VOICEROID install path may not contain non-ascii characters: \"{0}\"")]
    NonAsciiPath(String),

    /// Voice directory name without a recognizable `_22`/`_44` suffix.
    #[error(
        "could not infer the VOICEROID version from voice directory \"{0}\"; \
         make sure the given voice directory name is appropriate"
    )]
    UnknownVersion(String),

    /// A VOICEROID+ library the native adapter does not support.
    #[error("unsupported VOICEROID+ library \"{0}\" (supported: kiritan, zunko, akane, aoi)")]
    UnsupportedLibrary(String),

    /// The opaque native engine call itself failed.
    #[error("native engine failure: {message}")]
    Engine {
        /// Native error code, when the engine reported one.
        code: Option<i32>,
        message: String,
    },
}

impl EbyroidError {
    /// Shorthand for an engine failure without a native error code.
    pub fn engine(message: impl Into<String>) -> Self {
        EbyroidError::Engine {
            code: None,
            message: message.into(),
        }
    }
}

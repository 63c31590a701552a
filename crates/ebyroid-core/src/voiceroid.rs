//! Voiceroid profile value objects.
//!
//! A [`Voiceroid`] describes one configured voice: which on-disk library to
//! load into the native engine (`base_dir_path` + `voice_dir_name`) plus
//! playback parameters (volume, output sample rate, channels) that never
//! require a reload to change. Profiles are validated at construction and
//! immutable afterwards.

use crate::error::EbyroidError;

/// Library generation, inferred from the voice directory suffix.
///
/// VOICEROID+ libraries end in `_22` (22 050 Hz output), VOICEROID2
/// libraries in `_44` (44 100 Hz output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VoiceroidVersion {
    #[serde(rename = "VOICEROID+")]
    Plus,
    #[serde(rename = "VOICEROID2")]
    V2,
}

impl VoiceroidVersion {
    /// The library's native output sample rate in Hz.
    pub fn base_sample_rate(self) -> u32 {
        match self {
            VoiceroidVersion::Plus => 22_050,
            VoiceroidVersion::V2 => 44_100,
        }
    }
}

impl std::fmt::Display for VoiceroidVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceroidVersion::Plus => f.write_str("VOICEROID+"),
            VoiceroidVersion::V2 => f.write_str("VOICEROID2"),
        }
    }
}

/// Optional playback settings for a [`Voiceroid`].
///
/// None of these affect the reload decision — two profiles differing only in
/// these values still use the same native library.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceroidOptions {
    /// Output volume, 0.0–5.0. Defaults to 2.2.
    pub volume: Option<f32>,
    /// Output sample rate: 22050, 44100 or 48000. Defaults to the
    /// library's native rate.
    pub sample_rate: Option<u32>,
    /// Output channels: 1 (mono) or 2 (stereo). Defaults to 1.
    pub channels: Option<u16>,
}

const DEFAULT_VOLUME: f32 = 2.2;
const SUPPORTED_SAMPLE_RATES: [u32; 3] = [22_050, 44_100, 48_000];

/// VOICEROID+ voice libraries known to work with the native adapter.
const SUPPORTED_PLUS_LIBRARIES: [&str; 4] = ["kiritan", "zunko", "akane", "aoi"];

/// One configured voice profile. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Voiceroid {
    name: String,
    base_dir_path: String,
    voice_dir_name: String,
    version: VoiceroidVersion,
    volume: f32,
    output_sample_rate: u32,
    output_channels: u16,
}

impl Voiceroid {
    /// Build a validated profile.
    ///
    /// # Errors
    /// Returns a configuration error when the install path contains
    /// non-ASCII characters, the voice directory suffix does not identify a
    /// VOICEROID version, the VOICEROID+ library is unsupported, or any
    /// playback option is out of range.
    pub fn new(
        name: impl Into<String>,
        base_dir_path: impl Into<String>,
        voice_dir_name: impl Into<String>,
        options: VoiceroidOptions,
    ) -> Result<Self, EbyroidError> {
        let name = name.into();
        let base_dir_path = sanitize_path(base_dir_path.into())?;
        let voice_dir_name = voice_dir_name.into();
        let version = guess_version(&voice_dir_name)?;
        sanitize_library(&voice_dir_name, version)?;

        let volume = match options.volume {
            None => DEFAULT_VOLUME,
            Some(v) if (0.0..=5.0).contains(&v) => v,
            Some(v) => return Err(EbyroidError::VolumeOutOfRange(v)),
        };
        let output_sample_rate = match options.sample_rate {
            None => version.base_sample_rate(),
            Some(r) if SUPPORTED_SAMPLE_RATES.contains(&r) => r,
            Some(r) => return Err(EbyroidError::UnsupportedSampleRate(r)),
        };
        let output_channels = match options.channels {
            None => 1,
            Some(c @ (1 | 2)) => c,
            Some(c) => return Err(EbyroidError::UnsupportedChannels(c)),
        };

        tracing::debug!(
            name,
            base_dir_path,
            voice_dir_name,
            %version,
            volume,
            output_sample_rate,
            output_channels,
            "configured voiceroid"
        );

        Ok(Self {
            name,
            base_dir_path,
            voice_dir_name,
            version,
            volume,
            output_sample_rate,
            output_channels,
        })
    }

    /// Caller-facing identifier, unique within a coordinator instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install directory of the VOICEROID editor executable.
    pub fn base_dir_path(&self) -> &str {
        &self.base_dir_path
    }

    /// Directory name of the voice library, like `zunko_22` or `yukari_44`.
    pub fn voice_dir_name(&self) -> &str {
        &self.voice_dir_name
    }

    /// Library generation.
    pub fn version(&self) -> VoiceroidVersion {
        self.version
    }

    /// Output volume passed to the native library on load.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Desired output sample rate in Hz.
    pub fn output_sample_rate(&self) -> u32 {
        self.output_sample_rate
    }

    /// Desired output channel count.
    pub fn output_channels(&self) -> u16 {
        self.output_channels
    }

    /// The library's native output sample rate in Hz.
    pub fn base_sample_rate(&self) -> u32 {
        self.version.base_sample_rate()
    }

    /// Whether `self` and `other` load the same native library.
    ///
    /// Profiles agreeing on `(base_dir_path, voice_dir_name)` are
    /// interchangeable without a reload, even when names or playback
    /// parameters differ.
    pub fn uses_same_library(&self, other: &Voiceroid) -> bool {
        self.base_dir_path == other.base_dir_path && self.voice_dir_name == other.voice_dir_name
    }
}

fn sanitize_path(path: String) -> Result<String, EbyroidError> {
    if !path.is_ascii() {
        return Err(EbyroidError::NonAsciiPath(path));
    }
    // The native API rejects a trailing separator.
    Ok(path.trim_end_matches('\\').to_string())
}

fn guess_version(voice_dir_name: &str) -> Result<VoiceroidVersion, EbyroidError> {
    if voice_dir_name.ends_with("_22") {
        Ok(VoiceroidVersion::Plus)
    } else if voice_dir_name.ends_with("_44") {
        Ok(VoiceroidVersion::V2)
    } else {
        Err(EbyroidError::UnknownVersion(voice_dir_name.to_string()))
    }
}

fn sanitize_library(voice_dir_name: &str, version: VoiceroidVersion) -> Result<(), EbyroidError> {
    match version {
        VoiceroidVersion::V2 => Ok(()),
        VoiceroidVersion::Plus => {
            if SUPPORTED_PLUS_LIBRARIES
                .iter()
                .any(|s| voice_dir_name.starts_with(s))
            {
                Ok(())
            } else {
                Err(EbyroidError::UnsupportedLibrary(voice_dir_name.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zunko() -> Voiceroid {
        Voiceroid::new(
            "Zunko",
            "C:\\Program Files (x86)\\AHS\\VOICEROID+\\ZunkoEX",
            "zunko_22",
            VoiceroidOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn defaults_follow_the_version() {
        let vr = zunko();
        assert_eq!(vr.version(), VoiceroidVersion::Plus);
        assert_eq!(vr.base_sample_rate(), 22_050);
        assert_eq!(vr.output_sample_rate(), 22_050);
        assert_eq!(vr.output_channels(), 1);
        assert!((vr.volume() - 2.2).abs() < f32::EPSILON);

        let yukari = Voiceroid::new(
            "Yukari",
            "C:\\Program Files (x86)\\AHS\\VOICEROID2",
            "yukari_44",
            VoiceroidOptions::default(),
        )
        .unwrap();
        assert_eq!(yukari.version(), VoiceroidVersion::V2);
        assert_eq!(yukari.base_sample_rate(), 44_100);
    }

    #[test]
    fn trailing_backslash_is_stripped() {
        let vr = Voiceroid::new(
            "Zunko",
            "C:\\VOICEROID+\\ZunkoEX\\",
            "zunko_22",
            VoiceroidOptions::default(),
        )
        .unwrap();
        assert_eq!(vr.base_dir_path(), "C:\\VOICEROID+\\ZunkoEX");
    }

    #[test]
    fn non_ascii_path_is_rejected() {
        let err = Voiceroid::new(
            "Zunko",
            "C:\\ボイスロイド\\ZunkoEX",
            "zunko_22",
            VoiceroidOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EbyroidError::NonAsciiPath(_)));
    }

    #[test]
    fn unknown_suffix_is_rejected() {
        let err = Voiceroid::new("X", "C:\\AHS", "zunko_96", VoiceroidOptions::default())
            .unwrap_err();
        assert!(matches!(err, EbyroidError::UnknownVersion(_)));
    }

    #[test]
    fn unsupported_plus_library_is_rejected() {
        let err = Voiceroid::new("X", "C:\\AHS", "tamiyasu_22", VoiceroidOptions::default())
            .unwrap_err();
        assert!(matches!(err, EbyroidError::UnsupportedLibrary(_)));
    }

    #[test]
    fn any_v2_library_is_accepted() {
        assert!(
            Voiceroid::new("X", "C:\\AHS", "tamiyasu_44", VoiceroidOptions::default()).is_ok()
        );
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        let volume = VoiceroidOptions {
            volume: Some(5.5),
            ..Default::default()
        };
        assert!(matches!(
            Voiceroid::new("X", "C:\\AHS", "zunko_22", volume).unwrap_err(),
            EbyroidError::VolumeOutOfRange(_)
        ));

        let rate = VoiceroidOptions {
            sample_rate: Some(8_000),
            ..Default::default()
        };
        assert!(matches!(
            Voiceroid::new("X", "C:\\AHS", "zunko_22", rate).unwrap_err(),
            EbyroidError::UnsupportedSampleRate(_)
        ));

        let channels = VoiceroidOptions {
            channels: Some(6),
            ..Default::default()
        };
        assert!(matches!(
            Voiceroid::new("X", "C:\\AHS", "zunko_22", channels).unwrap_err(),
            EbyroidError::UnsupportedChannels(_)
        ));
    }

    #[test]
    fn same_library_ignores_name_and_volume() {
        let a = zunko();
        let b = Voiceroid::new(
            "Zunko loud",
            "C:\\Program Files (x86)\\AHS\\VOICEROID+\\ZunkoEX",
            "zunko_22",
            VoiceroidOptions {
                volume: Some(4.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(a.uses_same_library(&b));
        assert_ne!(a, b);
    }
}

//! Voiceroid profile configuration file.
//!
//! The config is a JSON array of profile entries — the same shape the
//! original `ebyroid configure` wizard wrote — loaded at startup and turned
//! into validated [`Voiceroid`] values. Exactly one entry should carry
//! `"default": true`; when none does, the first entry is used.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use ebyroid_core::{Voiceroid, VoiceroidOptions};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEntry {
    pub name: String,
    pub base_dir_path: String,
    pub voice_dir_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
    #[serde(default)]
    pub default: bool,
}

/// Load and validate the profile config.
///
/// Returns the profiles plus the name of the default voiceroid.
pub fn load(path: &Path) -> Result<(Vec<Voiceroid>, String)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config file \"{}\"", path.display()))?;
    let entries: Vec<ProfileEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse config file \"{}\"", path.display()))?;
    if entries.is_empty() {
        bail!("config file \"{}\" contains no voiceroids", path.display());
    }

    let default_name = entries
        .iter()
        .find(|e| e.default)
        .unwrap_or(&entries[0])
        .name
        .clone();

    let voiceroids = entries
        .into_iter()
        .map(|entry| {
            let name = entry.name.clone();
            Voiceroid::new(
                entry.name,
                entry.base_dir_path,
                entry.voice_dir_name,
                VoiceroidOptions {
                    volume: entry.volume,
                    sample_rate: entry.sample_rate,
                    channels: entry.channels,
                },
            )
            .with_context(|| format!("invalid voiceroid settings for \"{name}\""))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((voiceroids, default_name))
}

/// Write a template config for hand editing.
pub fn write_template(path: &Path) -> Result<()> {
    let template = vec![
        ProfileEntry {
            name: "Kiritan-chan".to_string(),
            base_dir_path: "C:\\Program Files (x86)\\AHS\\VOICEROID+\\KiritanEX".to_string(),
            voice_dir_name: "kiritan_22".to_string(),
            volume: Some(2.2),
            sample_rate: None,
            channels: None,
            default: true,
        },
        ProfileEntry {
            name: "Yukari-chan".to_string(),
            base_dir_path: "C:\\Program Files (x86)\\AHS\\VOICEROID2".to_string(),
            voice_dir_name: "yukari_44".to_string(),
            volume: None,
            sample_rate: None,
            channels: None,
            default: false,
        },
    ];
    let json = serde_json::to_string_pretty(&template)?;
    std::fs::write(path, json)
        .with_context(|| format!("could not write config file \"{}\"", path.display()))?;
    Ok(())
}

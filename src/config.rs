use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::decode::ChannelMode;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Durations and band range that fix the frame layout of a pipeline run.
#[derive(Clone, Debug, Deserialize)]
pub struct FingerprintConfig {
    /// Length of the sample block presented to the pipeline
    #[serde(default = "default_block_seconds")]
    pub block_seconds: f64,
    /// Length of one analysis frame
    #[serde(default = "default_frame_seconds")]
    pub frame_seconds: f64,
    /// Fraction of a frame shared with the next one (0.0-1.0, exclusive)
    #[serde(default = "default_overlap")]
    pub overlap: f64,
    #[serde(default = "default_band_count")]
    pub band_count: usize,
    #[serde(default = "default_low_hz")]
    pub low_hz: f64,
    #[serde(default = "default_high_hz")]
    pub high_hz: f64,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub channel_mode: ChannelMode,
    #[serde(default)]
    pub target_sample_rate: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            block_seconds: default_block_seconds(),
            frame_seconds: default_frame_seconds(),
            overlap: default_overlap(),
            band_count: default_band_count(),
            low_hz: default_low_hz(),
            high_hz: default_high_hz(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channel_mode: ChannelMode::default(),
            target_sample_rate: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_block_seconds() -> f64 { 3.33 }
fn default_frame_seconds() -> f64 { 0.37 }
fn default_overlap() -> f64 { 31.0 / 32.0 }
fn default_band_count() -> usize { 33 }
fn default_low_hz() -> f64 { 300.0 }
fn default_high_hz() -> f64 { 2000.0 }
fn default_store_path() -> PathBuf { "fingerprints.json".into() }

/// Explicit path first, then `./bandprint.toml`, then the user config directories.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("bandprint.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("bandprint").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("bandprint").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.fingerprint.block_seconds, 3.33);
        assert_eq!(cfg.fingerprint.frame_seconds, 0.37);
        assert_eq!(cfg.fingerprint.overlap, 0.96875);
        assert_eq!(cfg.fingerprint.band_count, 33);
        assert_eq!(cfg.audio.channel_mode, ChannelMode::Average);
        assert_eq!(cfg.audio.target_sample_rate, None);
        assert_eq!(cfg.store.path, PathBuf::from("fingerprints.json"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [fingerprint]
            frame_seconds = 0.1

            [audio]
            channel_mode = "left"
            target_sample_rate = 48000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fingerprint.frame_seconds, 0.1);
        assert_eq!(cfg.fingerprint.low_hz, 300.0);
        assert_eq!(cfg.audio.channel_mode, ChannelMode::Left);
        assert_eq!(cfg.audio.target_sample_rate, Some(48000));
    }

    #[test]
    fn rejects_unknown_channel_mode() {
        let parsed: Result<Config, _> = toml::from_str("[audio]\nchannel_mode = \"right\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/somewhere.toml");
        assert_eq!(find_config(Some(path)), Some(path.to_path_buf()));
    }
}

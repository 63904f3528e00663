//! TOML configuration file loading
//!
//! Supports `~/.config/voiceflip/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceflipConfigFile {
    /// Round and scoring settings
    #[serde(default)]
    pub game: GameFileConfig,

    /// Speech input settings
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Word list replacing the built-in one
    pub words_file: Option<PathBuf>,
}

/// Round and scoring configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameFileConfig {
    pub round_words: Option<usize>,
    pub round_secs: Option<u32>,
    pub streak_bonus_threshold: Option<u32>,
    pub feedback_delay_ms: Option<u64>,
    pub countdown_from: Option<u32>,
    pub countdown_interval_ms: Option<u64>,
    pub clock_tick_ms: Option<u64>,
    pub low_time_secs: Option<u32>,
}

/// Speech input configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceFileConfig {
    /// Enable speech input
    pub enabled: Option<bool>,

    /// Recognition language tag (e.g. "ru-RU")
    pub language: Option<String>,

    /// Transcript alternatives per utterance
    pub alternatives: Option<usize>,

    /// Delay before restarting an ended stream
    pub restart_debounce_ms: Option<u64>,

    /// Recognizer program speaking the JSON line protocol
    pub recognizer: Option<String>,

    /// Extra arguments for the recognizer program
    pub recognizer_args: Option<Vec<String>>,
}

/// Load the TOML config file from the standard path
///
/// Returns `VoiceflipConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> VoiceflipConfigFile {
    let Some(path) = config_file_path() else {
        return VoiceflipConfigFile::default();
    };

    if !path.exists() {
        return VoiceflipConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            VoiceflipConfigFile::default()
        }
    }
}

/// Read and parse a specific config file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn read_config_file(path: &Path) -> Result<VoiceflipConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    let config = toml::from_str(&content)?;

    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/voiceflip/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voiceflip").join("config.toml"))
}

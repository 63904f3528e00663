//! Configuration management for voiceflip
//!
//! Values are layered: command line (including the environment variables
//! clap reads for each flag) over the TOML file over built-in defaults.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::recognition::CaptureOptions;
use crate::{Error, Result};

use file::VoiceflipConfigFile;

/// voiceflip configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Round and scoring settings
    pub game: GameConfig,

    /// Speech input settings
    pub voice: VoiceConfig,

    /// Word list replacing the built-in one
    pub words_file: Option<PathBuf>,
}

/// Round and scoring settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Words per round
    pub round_words: usize,

    /// Round clock in seconds
    pub round_secs: u32,

    /// Streak from which a correct answer scores double
    pub streak_bonus_threshold: u32,

    /// How long a verdict stays on screen
    pub feedback_delay: Duration,

    /// First countdown value
    pub countdown_from: u32,

    /// Time between countdown values
    pub countdown_interval: Duration,

    /// Length of one round clock second
    pub clock_tick: Duration,

    /// Remaining seconds at or below which time warnings fire
    pub low_time_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_words: 30,
            round_secs: 60,
            streak_bonus_threshold: 3,
            feedback_delay: Duration::from_millis(1500),
            countdown_from: 3,
            countdown_interval: Duration::from_millis(800),
            clock_tick: Duration::from_secs(1),
            low_time_secs: 5,
        }
    }
}

/// Speech input configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    /// Enable speech input
    pub enabled: bool,

    /// Recognition language tag
    pub language: String,

    /// Transcript alternatives per utterance
    pub alternatives: usize,

    /// Delay before restarting an ended stream
    pub restart_debounce: Duration,

    /// Recognizer program; without one only typed answers are accepted
    pub recognizer: Option<String>,

    /// Extra arguments for the recognizer program
    pub recognizer_args: Vec<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        let capture = CaptureOptions::default();
        Self {
            enabled: true,
            language: capture.language,
            alternatives: capture.alternatives,
            restart_debounce: capture.restart_debounce,
            recognizer: None,
            recognizer_args: Vec::new(),
        }
    }
}

impl VoiceConfig {
    /// Options for opening capture instances
    #[must_use]
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            language: self.language.clone(),
            alternatives: self.alternatives,
            restart_debounce: self.restart_debounce,
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file; failing to load it is an error
    pub config_path: Option<PathBuf>,
    pub round_words: Option<usize>,
    pub round_secs: Option<u32>,
    pub language: Option<String>,
    pub recognizer: Option<String>,
    pub words_file: Option<PathBuf>,
    pub disable_voice: bool,
}

impl Config {
    /// Load configuration from the config file and overrides
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be loaded or the
    /// resulting values are invalid
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let fc = match &overrides.config_path {
            Some(path) => file::read_config_file(path)?,
            None => file::load_config_file(),
        };
        Self::resolve(fc, overrides)
    }

    /// Layer overrides over a parsed config file and validate the result
    ///
    /// # Errors
    ///
    /// Returns error if the resulting values are invalid
    pub fn resolve(fc: VoiceflipConfigFile, overrides: &Overrides) -> Result<Self> {
        let defaults = GameConfig::default();
        let g = fc.game;
        let game = GameConfig {
            round_words: overrides
                .round_words
                .or(g.round_words)
                .unwrap_or(defaults.round_words),
            round_secs: overrides
                .round_secs
                .or(g.round_secs)
                .unwrap_or(defaults.round_secs),
            streak_bonus_threshold: g
                .streak_bonus_threshold
                .unwrap_or(defaults.streak_bonus_threshold),
            feedback_delay: g
                .feedback_delay_ms
                .map_or(defaults.feedback_delay, Duration::from_millis),
            countdown_from: g.countdown_from.unwrap_or(defaults.countdown_from),
            countdown_interval: g
                .countdown_interval_ms
                .map_or(defaults.countdown_interval, Duration::from_millis),
            clock_tick: g
                .clock_tick_ms
                .map_or(defaults.clock_tick, Duration::from_millis),
            low_time_secs: g.low_time_secs.unwrap_or(defaults.low_time_secs),
        };

        let defaults = VoiceConfig::default();
        let v = fc.voice;
        let voice = VoiceConfig {
            enabled: !overrides.disable_voice && v.enabled.unwrap_or(defaults.enabled),
            language: overrides
                .language
                .clone()
                .or(v.language)
                .unwrap_or(defaults.language),
            alternatives: v.alternatives.unwrap_or(defaults.alternatives),
            restart_debounce: v
                .restart_debounce_ms
                .map_or(defaults.restart_debounce, Duration::from_millis),
            recognizer: overrides.recognizer.clone().or(v.recognizer),
            recognizer_args: v.recognizer_args.unwrap_or_default(),
        };

        let config = Self {
            game,
            voice,
            words_file: overrides.words_file.clone().or(fc.words_file),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values the game cannot run with
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first invalid value
    pub fn validate(&self) -> Result<()> {
        let g = &self.game;
        if g.round_words == 0 {
            return Err(Error::Config("round_words must be at least 1".to_string()));
        }
        if g.round_secs == 0 {
            return Err(Error::Config("round_secs must be at least 1".to_string()));
        }
        if g.streak_bonus_threshold == 0 {
            return Err(Error::Config(
                "streak_bonus_threshold must be at least 1".to_string(),
            ));
        }
        if g.countdown_interval.is_zero() {
            return Err(Error::Config(
                "countdown_interval_ms must be non-zero".to_string(),
            ));
        }
        if g.clock_tick.is_zero() {
            return Err(Error::Config("clock_tick_ms must be non-zero".to_string()));
        }
        if self.voice.alternatives == 0 {
            return Err(Error::Config("alternatives must be at least 1".to_string()));
        }
        Ok(())
    }
}

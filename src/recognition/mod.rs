//! Continuous speech recognition
//!
//! The capture primitive underneath is assumed to be flaky and oriented
//! around single utterances: it ends after silence, glitches on background
//! noise and drops on network hiccups. [`RecognitionManager`] turns it into a
//! continuous stream of candidate batches behind a plain `start`/`stop`
//! contract.

mod command;
mod manager;

pub use command::CommandCaptureProvider;
pub use manager::{CapturePhase, RecognitionManager};

use std::time::Duration;

use tokio::sync::mpsc;

use crate::Result;

/// Channel on which a capture handle reports its events
pub type CaptureSink = mpsc::UnboundedSender<CaptureEvent>;

/// Settings for opening a capture instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// BCP 47 language tag of the expected speech (e.g. "ru-RU")
    pub language: String,
    /// Ranked transcript alternatives requested per utterance
    pub alternatives: usize,
    /// Delay before restarting after a natural end of stream
    pub restart_debounce: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            language: "ru-RU".to_string(),
            alternatives: 5,
            restart_debounce: Duration::from_millis(250),
        }
    }
}

/// Source of capture instances (microphone + recognizer)
pub trait CaptureProvider: Send {
    /// Handle type controlling one capture instance
    type Handle: CaptureHandle;

    /// Whether capture is available on this platform at all
    fn supported(&self) -> bool;

    /// Ask for microphone access before the first instance is opened
    ///
    /// Providers whose platform reports denial through capture errors can
    /// keep the default.
    fn request_permission(&mut self) -> bool {
        true
    }

    /// Create a capture instance configured for continuous operation
    ///
    /// The instance is idle until [`CaptureHandle::resume`] is called and
    /// reports everything it observes on `sink`.
    ///
    /// # Errors
    ///
    /// Returns error if the instance cannot be created
    fn open(&mut self, options: &CaptureOptions, sink: CaptureSink) -> Result<Self::Handle>;
}

/// Control surface of one capture instance
pub trait CaptureHandle: Send {
    /// Begin (or continue) capturing; a no-op while already capturing
    ///
    /// # Errors
    ///
    /// Returns error if capture cannot start right now
    fn resume(&mut self) -> Result<()>;

    /// Stop capturing; a halted run delivers no further events
    fn halt(&mut self);
}

/// Why the capture primitive reported an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Nothing was said before the recognizer gave up
    NoSpeech,
    /// Capture was aborted (device glitch, focus change)
    Aborted,
    /// Transient network failure during recognition
    Network,
    /// Microphone access was denied
    NotAllowed,
    /// Any other reason reported by the provider
    Other(String),
}

impl CaptureError {
    /// Parse a provider error code (`"no-speech"`, `"not-allowed"`, ...)
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "network" => Self::Network,
            "not-allowed" | "service-not-allowed" => Self::NotAllowed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the error ends the session instead of being retried
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotAllowed)
    }
}

/// Something observed by a capture instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Audio capture became active
    Started,
    /// Recognizer output for the current utterance
    Utterance {
        /// Transcript alternatives, best first
        alternatives: Vec<String>,
        /// Whether the utterance is finalized (interim results are ignored)
        is_final: bool,
    },
    /// The stream ended on its own
    Ended,
    /// The stream reported a failure
    Error(CaptureError),
}

/// Externally visible state of speech input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionStatus {
    /// Capture is active
    Listening,
    /// Capture was stopped by the caller
    Idle,
    /// Microphone access was denied; typed answers still work
    PermissionDenied,
    /// Capture is unavailable on this platform; typed answers only
    Unsupported,
    /// Capture could not be opened
    Failed(String),
}

/// Receives what the manager produces
pub trait RecognitionListener: Send + Sync {
    /// A finalized utterance: cleaned transcript alternatives, best first
    fn on_candidates(&self, candidates: Vec<String>);

    /// Speech input status changed
    fn on_status(&self, status: RecognitionStatus);
}

/// Permission knowledge carried by one manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Not asked yet
    #[default]
    Unknown,
    /// Access granted
    Granted,
    /// Access denied
    Denied,
}

/// Lowercase and trim alternatives, dropping blanks and repeats
#[must_use]
pub fn clean_alternatives(alternatives: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        let text = alternative.to_lowercase().trim().to_string();
        if !text.is_empty() && !cleaned.contains(&text) {
            cleaned.push(text);
        }
    }
    cleaned
}

//! voiceflip - Timed spoken vocabulary drill
//!
//! A word is shown, the player says (or types) its translation, and the game
//! judges it, keeps score and streak, and moves on until the clock or the
//! word list runs out.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  candidates   ┌──────────────────┐
//! │  Recognition  │──────────────▶│                  │──▶ PresentationSink
//! │    Manager    │◀──start/stop──│  GameController  │──▶ CueSink
//! └───────┬───────┘               │                  │
//!         │ resume/halt           └───┬──────────┬───┘
//! ┌───────▼───────┐                   │          │
//! │CaptureProvider│             Round Generator  Answer Matcher
//! └───────────────┘
//! ```
//!
//! [`runtime::GameRuntime`] owns both sides and feeds them from one event
//! queue; the controller never touches capture directly.

pub mod config;
pub mod error;
pub mod game;
pub mod matcher;
pub mod recognition;
pub mod runtime;
pub mod terminal;
pub mod timer;
pub mod words;

pub use config::Config;
pub use error::{Error, Result};
pub use game::{
    AnswerFeedback, CueSink, GameController, GameSummary, Outcome, PresentationSink, Rating,
    ScoreState, SessionState, StateSnapshot,
};
pub use matcher::{matches, normalize};
pub use recognition::{
    CaptureError, CaptureEvent, CaptureHandle, CaptureOptions, CaptureProvider,
    CommandCaptureProvider, PermissionState, RecognitionListener, RecognitionManager,
    RecognitionStatus,
};
pub use runtime::{Event, GameRuntime, Input, RuntimeHandle};
pub use terminal::TerminalPresenter;
pub use timer::{Scheduler, TimerBook, TimerId, TimerKind, TokioScheduler};
pub use words::{Dataset, DatasetProvider, Round, WordPair, generate_round};

//! Game session state and its outward notifications
//!
//! The [`GameController`] owns every value in this module. Presentation and
//! cue collaborators only ever receive copies.

mod controller;

pub use controller::GameController;

use crate::recognition::RecognitionStatus;
use crate::words::WordPair;

/// Result of judging one answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Wrong,
}

/// The single active state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for a game to be started
    #[default]
    Idle,
    /// Counting down to the round; carries the displayed value
    Countdown(u32),
    /// Waiting for an answer to the current word
    Playing,
    /// Showing the verdict for the current word
    Feedback(Outcome),
    /// Round over; a new game or a review may follow
    GameOver,
}

impl SessionState {
    /// Short lowercase name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Countdown(_) => "countdown",
            Self::Playing => "playing",
            Self::Feedback(_) => "feedback",
            Self::GameOver => "game_over",
        }
    }
}

/// Scoring state of the current round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub score: u32,
    pub correct_count: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub time_left_secs: u32,
    /// Answers judged this round, right or wrong
    pub answered: u32,
    /// Missed words, unique by identity, in the order first missed
    pub mistakes: Vec<WordPair>,
}

impl ScoreState {
    /// Fresh score for a round of `duration_secs`
    #[must_use]
    pub fn for_round(duration_secs: u32) -> Self {
        Self {
            time_left_secs: duration_secs,
            ..Self::default()
        }
    }

    /// Record a missed word unless it is already recorded
    ///
    /// Returns whether the word was added.
    pub fn record_mistake(&mut self, word: &WordPair) -> bool {
        if self.mistakes.iter().any(|m| m.same_word(word)) {
            return false;
        }
        self.mistakes.push(word.clone());
        true
    }
}

/// State-change notification for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub state: SessionState,
    /// Word being asked, while playing or showing feedback
    pub current_word: Option<WordPair>,
    /// Fraction of the round already answered, in `0.0..=1.0`
    pub progress: f64,
    pub time_left_secs: u32,
    pub score: u32,
    pub streak: u32,
}

/// Verdict notification for presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub outcome: Outcome,
    /// The answer that was expected
    pub expected: String,
    /// Best-ranked candidate heard or typed, if any
    pub said: Option<String>,
    /// Icon of the word that was asked
    pub icon: String,
}

/// Rating tier shown with the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Champion,
    Star,
    Good,
    KeepGoing,
}

impl Rating {
    /// Tier earned by a final score
    #[must_use]
    pub const fn for_score(score: u32) -> Self {
        match score {
            15.. => Self::Champion,
            10..=14 => Self::Star,
            5..=9 => Self::Good,
            _ => Self::KeepGoing,
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Champion => "Champion!",
            Self::Star => "Star!",
            Self::Good => "Good job!",
            Self::KeepGoing => "Keep going!",
        }
    }
}

/// Final figures of a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub score: u32,
    pub best_streak: u32,
    pub correct: u32,
    pub answered: u32,
    /// Rounded percentage of correct answers; 0 when nothing was answered
    pub accuracy_percent: u32,
    pub mistakes: usize,
    pub rating: Rating,
}

impl From<&ScoreState> for GameSummary {
    fn from(score: &ScoreState) -> Self {
        let accuracy_percent = if score.answered == 0 {
            0
        } else {
            (score.correct_count * 100 + score.answered / 2) / score.answered
        };

        Self {
            score: score.score,
            best_streak: score.best_streak,
            correct: score.correct_count,
            answered: score.answered,
            accuracy_percent,
            mistakes: score.mistakes.len(),
            rating: Rating::for_score(score.score),
        }
    }
}

/// Read-only consumer of game progress
pub trait PresentationSink: Send + Sync {
    /// Session state or score changed
    fn on_state(&self, snapshot: &StateSnapshot);

    /// An answer was judged
    fn on_feedback(&self, feedback: &AnswerFeedback);

    /// A round ended
    fn on_game_over(&self, _summary: &GameSummary) {}

    /// Speech input status changed
    fn on_input_status(&self, _status: &RecognitionStatus) {}
}

/// Fire-and-forget audio/haptic cues
///
/// Every method defaults to doing nothing.
pub trait CueSink: Send + Sync {
    fn on_correct(&self) {}

    /// Streak reached a positive multiple of the bonus threshold
    fn on_streak_milestone(&self, _streak: u32) {}

    fn on_wrong(&self) {}

    /// A countdown value is displayed
    fn on_countdown_tick(&self, _value: u32) {}

    fn on_game_start(&self) {}

    fn on_game_over(&self) {}

    /// The round clock is in its final seconds
    fn on_time_warning(&self, _seconds_left: u32) {}
}

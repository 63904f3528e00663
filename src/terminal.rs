//! Line-oriented terminal front-end
//!
//! Prints prompts, verdicts and cues to a writer (stdout in the binary).
//! Clock ticks re-send the full state every second; only changes of state or
//! word are printed.

use std::io::Write;
use std::sync::Mutex;

use crate::game::{
    AnswerFeedback, CueSink, GameSummary, Outcome, PresentationSink, SessionState, StateSnapshot,
};
use crate::recognition::RecognitionStatus;

/// Presentation and cue sink writing plain text lines
pub struct TerminalPresenter {
    out: Mutex<Box<dyn Write + Send>>,
    last: Mutex<Option<(SessionState, Option<String>)>>,
}

impl TerminalPresenter {
    /// Present to stdout
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Present to any writer
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            last: Mutex::new(None),
        }
    }

    fn line(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        // Display failures never reach the game
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "terminal write failed");
        }
    }

    /// Whether the snapshot differs from the last printed one
    fn changed(&self, snapshot: &StateSnapshot) -> bool {
        let key = (
            snapshot.state,
            snapshot.current_word.as_ref().map(|w| w.source.clone()),
        );
        let Ok(mut last) = self.last.lock() else {
            return true;
        };
        if last.as_ref() == Some(&key) {
            return false;
        }
        *last = Some(key);
        true
    }
}

impl PresentationSink for TerminalPresenter {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn on_state(&self, snapshot: &StateSnapshot) {
        if !self.changed(snapshot) {
            return;
        }

        match snapshot.state {
            SessionState::Idle => {
                self.line("Type /start to play or /quit to leave.");
            }
            SessionState::Countdown(value) => self.line(&format!("  {value}...")),
            SessionState::Playing => {
                if let Some(word) = &snapshot.current_word {
                    let percent = (snapshot.progress * 100.0).round() as u32;
                    self.line(&format!(
                        "[{percent:>3}%  {}s  score {}  streak {}]  {} {}",
                        snapshot.time_left_secs,
                        snapshot.score,
                        snapshot.streak,
                        word.icon,
                        word.source
                    ));
                }
            }
            SessionState::Feedback(_) | SessionState::GameOver => {}
        }
    }

    fn on_feedback(&self, feedback: &AnswerFeedback) {
        match feedback.outcome {
            Outcome::Correct => {
                self.line(&format!("  ✓ {} {}", feedback.icon, feedback.expected));
            }
            Outcome::Wrong => {
                let said = feedback.said.as_deref().unwrap_or("...");
                self.line(&format!("  ✗ {}  (heard: {said})", feedback.expected));
            }
        }
    }

    fn on_game_over(&self, summary: &GameSummary) {
        self.line("");
        self.line(&format!("Game over! {}", summary.rating.label()));
        self.line(&format!(
            "  score {}  best streak {}  correct {}/{} ({}%)",
            summary.score,
            summary.best_streak,
            summary.correct,
            summary.answered,
            summary.accuracy_percent
        ));
        if summary.mistakes > 0 {
            self.line(&format!(
                "  /review to practise {} missed word(s), /start for a new game, /menu to leave",
                summary.mistakes
            ));
        } else {
            self.line("  /start for a new game, /menu to leave");
        }
    }

    fn on_input_status(&self, status: &RecognitionStatus) {
        match status {
            RecognitionStatus::Listening => self.line("  (listening)"),
            RecognitionStatus::Idle => {}
            RecognitionStatus::PermissionDenied => {
                self.line("Microphone access denied; type your answers.");
            }
            RecognitionStatus::Unsupported => {
                self.line("Speech input unavailable; type your answers.");
            }
            RecognitionStatus::Failed(reason) => {
                self.line(&format!("Speech input failed ({reason}); type your answers."));
            }
        }
    }
}

impl CueSink for TerminalPresenter {
    fn on_streak_milestone(&self, streak: u32) {
        self.line(&format!("  🔥 {streak} in a row!"));
    }

    fn on_game_start(&self) {
        self.line("Get ready!");
    }

    fn on_time_warning(&self, seconds_left: u32) {
        self.line(&format!("  ⏰ {seconds_left}s left"));
    }
}

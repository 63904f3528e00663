//! Game session state machine
//!
//! ```text
//! Idle ──start_game──▶ Countdown(3) ─tick─▶ … ─▶ Countdown(1) ─tick─▶ Playing
//! Playing ──answer──▶ Feedback(outcome) ──delay──▶ Playing | GameOver
//! Playing | Feedback ──clock hits 0──▶ GameOver
//! GameOver ──start_game──▶ Countdown(3)
//! GameOver ──start_review──▶ Playing
//! GameOver ──acknowledge──▶ Idle
//! ```
//!
//! The controller is driven only by method calls: lifecycle requests,
//! answers, and timer firings handed back by the [`Scheduler`]. Every input
//! that is not valid for the current state is ignored and reported as
//! `false`.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::{
    AnswerFeedback, CueSink, GameSummary, Outcome, PresentationSink, ScoreState, SessionState,
    StateSnapshot,
};
use crate::config::GameConfig;
use crate::matcher;
use crate::timer::{Scheduler, TimerBook, TimerId, TimerKind};
use crate::words::{DatasetProvider, Round, WordPair, generate_round};

/// Drives one player's sessions
pub struct GameController {
    config: GameConfig,
    dataset: Arc<dyn DatasetProvider>,
    rng: Box<dyn RngCore + Send>,
    state: SessionState,
    score: ScoreState,
    round: Round,
    index: usize,
    timers: TimerBook,
    scheduler: Arc<dyn Scheduler>,
    presentation: Arc<dyn PresentationSink>,
    cues: Arc<dyn CueSink>,
}

impl GameController {
    /// Create an idle controller
    pub fn new(
        config: GameConfig,
        dataset: Arc<dyn DatasetProvider>,
        scheduler: Arc<dyn Scheduler>,
        presentation: Arc<dyn PresentationSink>,
        cues: Arc<dyn CueSink>,
    ) -> Self {
        Self {
            config,
            dataset,
            rng: Box::new(StdRng::from_entropy()),
            state: SessionState::Idle,
            score: ScoreState::default(),
            round: Round::default(),
            index: 0,
            timers: TimerBook::new(),
            scheduler,
            presentation,
            cues,
        }
    }

    /// Replace the shuffle source (deterministic rounds in tests)
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Start a new game from `Idle` or `GameOver`
    pub fn start_game(&mut self) -> bool {
        if !matches!(self.state, SessionState::Idle | SessionState::GameOver) {
            tracing::debug!(state = self.state.name(), "start ignored");
            return false;
        }

        self.cancel_all_timers();
        self.round = Round::default();
        self.index = 0;

        tracing::debug!(countdown = self.config.countdown_from, "game starting");
        self.cues.on_game_start();
        self.enter_countdown(self.config.countdown_from);
        true
    }

    /// Replay the words missed in the round that just ended
    ///
    /// Only valid from `GameOver` with at least one mistake. Skips the
    /// countdown.
    pub fn start_review(&mut self) -> bool {
        if self.state != SessionState::GameOver || self.score.mistakes.is_empty() {
            return false;
        }

        let mistakes = std::mem::take(&mut self.score.mistakes);
        let round = generate_round(&mistakes, mistakes.len(), &mut *self.rng);
        tracing::info!(words = round.len(), "review round starting");

        self.cues.on_game_start();
        self.begin_round(round);
        true
    }

    /// Leave the game-over screen
    pub fn acknowledge_game_over(&mut self) -> bool {
        if self.state != SessionState::GameOver {
            return false;
        }
        self.set_state(SessionState::Idle);
        true
    }

    /// Judge a batch of ranked recognition candidates
    pub fn submit_candidates(&mut self, candidates: &[String]) -> bool {
        if self.state != SessionState::Playing {
            tracing::trace!(state = self.state.name(), "stale answer dropped");
            return false;
        }
        let Some(word) = self.round.get(self.index).cloned() else {
            return false;
        };

        let outcome = if matcher::matches(candidates, &word.target) {
            self.record_correct()
        } else {
            self.record_wrong(&word)
        };

        let feedback = AnswerFeedback {
            outcome,
            expected: word.target.clone(),
            said: candidates.first().cloned(),
            icon: word.icon.clone(),
        };
        tracing::debug!(
            word = %word.source,
            outcome = ?outcome,
            said = ?feedback.said,
            score = self.score.score,
            streak = self.score.streak,
            "answer judged"
        );

        self.presentation.on_feedback(&feedback);
        self.set_state(SessionState::Feedback(outcome));
        self.arm(TimerKind::FeedbackDelay, self.config.feedback_delay);
        true
    }

    /// Judge a typed answer
    ///
    /// Blank input is ignored; anything else is one lowercased candidate.
    pub fn submit_text(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.submit_candidates(&[text.to_lowercase()])
    }

    /// Process a timer firing delivered by the scheduler
    ///
    /// Returns `false` for firings that were cancelled, superseded, or not
    /// owned by the controller.
    pub fn handle_timer(&mut self, timer: TimerId) -> bool {
        if !self.timers.fire(timer) {
            return false;
        }

        match timer.kind {
            TimerKind::Countdown => self.countdown_tick(),
            TimerKind::RoundClock => self.clock_tick(),
            TimerKind::FeedbackDelay => self.feedback_elapsed(),
            TimerKind::RecognizerRestart => false,
        }
    }

    /// Whether speech capture should be running
    #[must_use]
    pub fn wants_listening(&self) -> bool {
        self.state == SessionState::Playing
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current score
    #[must_use]
    pub const fn score(&self) -> &ScoreState {
        &self.score
    }

    /// Word being asked, while playing or showing feedback
    #[must_use]
    pub fn current_word(&self) -> Option<&WordPair> {
        match self.state {
            SessionState::Playing | SessionState::Feedback(_) => self.round.get(self.index),
            _ => None,
        }
    }

    /// Round being played
    #[must_use]
    pub const fn round(&self) -> &Round {
        &self.round
    }

    /// Figures of the current or last round
    #[must_use]
    pub fn summary(&self) -> GameSummary {
        GameSummary::from(&self.score)
    }

    /// Full state notification as sent to presentation
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            state: self.state,
            current_word: self.current_word().cloned(),
            progress: self.progress(),
            time_left_secs: self.score.time_left_secs,
            score: self.score.score,
            streak: self.score.streak,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn progress(&self) -> f64 {
        if self.round.is_empty() {
            0.0
        } else {
            self.index as f64 / self.round.len() as f64
        }
    }

    fn enter_countdown(&mut self, value: u32) {
        if value == 0 {
            let round = generate_round(self.dataset.words(), self.config.round_words, &mut *self.rng);
            self.begin_round(round);
            return;
        }

        self.cues.on_countdown_tick(value);
        self.set_state(SessionState::Countdown(value));
        self.arm(TimerKind::Countdown, self.config.countdown_interval);
    }

    fn countdown_tick(&mut self) -> bool {
        let SessionState::Countdown(value) = self.state else {
            return false;
        };
        self.enter_countdown(value.saturating_sub(1));
        true
    }

    fn begin_round(&mut self, round: Round) {
        self.cancel_all_timers();
        self.score = ScoreState::for_round(self.config.round_secs);
        self.round = round;
        self.index = 0;

        if self.round.is_empty() {
            tracing::warn!("round has no words");
            self.finish();
            return;
        }

        tracing::info!(
            words = self.round.len(),
            secs = self.config.round_secs,
            "round started"
        );
        self.set_state(SessionState::Playing);
        self.arm(TimerKind::RoundClock, self.config.clock_tick);
    }

    fn clock_tick(&mut self) -> bool {
        if !matches!(self.state, SessionState::Playing | SessionState::Feedback(_)) {
            return false;
        }

        self.score.time_left_secs = self.score.time_left_secs.saturating_sub(1);
        let left = self.score.time_left_secs;
        if left == 0 {
            tracing::debug!("round clock expired");
            self.finish();
            return true;
        }

        if left <= self.config.low_time_secs {
            self.cues.on_time_warning(left);
        }
        self.notify();
        self.arm(TimerKind::RoundClock, self.config.clock_tick);
        true
    }

    fn feedback_elapsed(&mut self) -> bool {
        if !matches!(self.state, SessionState::Feedback(_)) {
            return false;
        }

        self.index += 1;
        if self.index < self.round.len() {
            self.set_state(SessionState::Playing);
        } else {
            tracing::debug!("no words left");
            self.finish();
        }
        true
    }

    fn record_correct(&mut self) -> Outcome {
        let threshold = self.config.streak_bonus_threshold;
        let score = &mut self.score;
        score.streak += 1;
        score.best_streak = score.best_streak.max(score.streak);
        score.correct_count += 1;
        score.answered += 1;
        score.score += if score.streak >= threshold { 2 } else { 1 };

        self.cues.on_correct();
        if threshold > 0 && score.streak % threshold == 0 {
            self.cues.on_streak_milestone(score.streak);
        }
        Outcome::Correct
    }

    fn record_wrong(&mut self, word: &WordPair) -> Outcome {
        self.score.streak = 0;
        self.score.answered += 1;
        self.score.record_mistake(word);

        self.cues.on_wrong();
        Outcome::Wrong
    }

    fn finish(&mut self) {
        self.cancel_all_timers();

        let summary = self.summary();
        tracing::info!(
            score = summary.score,
            best_streak = summary.best_streak,
            correct = summary.correct,
            answered = summary.answered,
            mistakes = summary.mistakes,
            "game over"
        );

        self.cues.on_game_over();
        self.set_state(SessionState::GameOver);
        self.presentation.on_game_over(&summary);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(from = self.state.name(), to = state.name(), "state change");
        }
        self.state = state;
        self.notify();
    }

    fn notify(&self) {
        self.presentation.on_state(&self.snapshot());
    }

    fn arm(&mut self, kind: TimerKind, after: std::time::Duration) {
        let timer = self.timers.arm(kind);
        self.scheduler.schedule(timer, after);
    }

    fn cancel_all_timers(&mut self) {
        for timer in self.timers.disarm_all() {
            self.scheduler.cancel(timer);
        }
    }
}

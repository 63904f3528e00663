//! Shared test utilities
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use voiceflip::config::GameConfig;
use voiceflip::recognition::CaptureSink;
use voiceflip::{
    AnswerFeedback, CaptureEvent, CaptureHandle, CaptureOptions, CaptureProvider, CueSink, Dataset,
    Error, GameController, GameSummary, PresentationSink, RecognitionListener, RecognitionStatus,
    Scheduler, SessionState, StateSnapshot, TimerId, TimerKind, WordPair,
};

/// Scheduler that only records what it was asked to do
#[derive(Default)]
pub struct RecordingScheduler {
    pub scheduled: Mutex<Vec<(TimerId, Duration)>>,
    pub cancelled: Mutex<Vec<TimerId>>,
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, timer: TimerId, after: Duration) {
        self.scheduled.lock().unwrap().push((timer, after));
    }

    fn cancel(&self, timer: TimerId) {
        self.cancelled.lock().unwrap().push(timer);
    }
}

impl RecordingScheduler {
    /// Most recently scheduled timer of `kind`
    pub fn last(&self, kind: TimerKind) -> Option<TimerId> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(timer, _)| timer.kind == kind)
            .map(|(timer, _)| *timer)
    }

    /// Delay requested for the most recent timer of `kind`
    pub fn last_delay(&self, kind: TimerKind) -> Option<Duration> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(timer, _)| timer.kind == kind)
            .map(|(_, after)| *after)
    }

    pub fn was_cancelled(&self, timer: TimerId) -> bool {
        self.cancelled.lock().unwrap().contains(&timer)
    }
}

/// Presentation sink keeping every notification
#[derive(Default)]
pub struct RecordingPresentation {
    pub states: Mutex<Vec<StateSnapshot>>,
    pub feedback: Mutex<Vec<AnswerFeedback>>,
    pub summaries: Mutex<Vec<GameSummary>>,
    pub statuses: Mutex<Vec<RecognitionStatus>>,
}

impl PresentationSink for RecordingPresentation {
    fn on_state(&self, snapshot: &StateSnapshot) {
        self.states.lock().unwrap().push(snapshot.clone());
    }

    fn on_feedback(&self, feedback: &AnswerFeedback) {
        self.feedback.lock().unwrap().push(feedback.clone());
    }

    fn on_game_over(&self, summary: &GameSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }

    fn on_input_status(&self, status: &RecognitionStatus) {
        self.statuses.lock().unwrap().push(status.clone());
    }
}

impl RecordingPresentation {
    pub fn last_state(&self) -> Option<StateSnapshot> {
        self.states.lock().unwrap().last().cloned()
    }

    /// Expected answer for the word currently on screen
    pub fn current_target(&self) -> Option<String> {
        self.last_state()
            .and_then(|s| s.current_word)
            .map(|word| word.target)
    }
}

/// One cue as received by a cue sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Correct,
    StreakMilestone(u32),
    Wrong,
    CountdownTick(u32),
    GameStart,
    GameOver,
    TimeWarning(u32),
}

#[derive(Default)]
pub struct RecordingCues(pub Mutex<Vec<Cue>>);

impl RecordingCues {
    pub fn all(&self) -> Vec<Cue> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, cue: Cue) {
        self.0.lock().unwrap().push(cue);
    }
}

impl CueSink for RecordingCues {
    fn on_correct(&self) {
        self.push(Cue::Correct);
    }

    fn on_streak_milestone(&self, streak: u32) {
        self.push(Cue::StreakMilestone(streak));
    }

    fn on_wrong(&self) {
        self.push(Cue::Wrong);
    }

    fn on_countdown_tick(&self, value: u32) {
        self.push(Cue::CountdownTick(value));
    }

    fn on_game_start(&self) {
        self.push(Cue::GameStart);
    }

    fn on_game_over(&self) {
        self.push(Cue::GameOver);
    }

    fn on_time_warning(&self, seconds_left: u32) {
        self.push(Cue::TimeWarning(seconds_left));
    }
}

/// Recognition listener keeping every notification
#[derive(Default)]
pub struct RecordingListener {
    pub candidates: Mutex<Vec<Vec<String>>>,
    pub statuses: Mutex<Vec<RecognitionStatus>>,
}

impl RecognitionListener for RecordingListener {
    fn on_candidates(&self, candidates: Vec<String>) {
        self.candidates.lock().unwrap().push(candidates);
    }

    fn on_status(&self, status: RecognitionStatus) {
        self.statuses.lock().unwrap().push(status);
    }
}

impl RecordingListener {
    pub fn statuses(&self) -> Vec<RecognitionStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn candidates(&self) -> Vec<Vec<String>> {
        self.candidates.lock().unwrap().clone()
    }
}

/// What a scripted capture provider was asked to do
#[derive(Default)]
pub struct CaptureLog {
    pub permission_requests: usize,
    pub opened: usize,
    pub resumed: usize,
    pub halted: usize,
    /// Event channel of the last opened instance
    pub sink: Option<CaptureSink>,
}

/// Capture provider driven entirely by the test
pub struct ScriptedProvider {
    pub supported: bool,
    pub grant_permission: bool,
    pub fail_open: bool,
    pub log: Arc<Mutex<CaptureLog>>,
}

impl ScriptedProvider {
    pub fn new() -> (Self, Arc<Mutex<CaptureLog>>) {
        let log = Arc::new(Mutex::new(CaptureLog::default()));
        let provider = Self {
            supported: true,
            grant_permission: true,
            fail_open: false,
            log: Arc::clone(&log),
        };
        (provider, log)
    }
}

impl CaptureProvider for ScriptedProvider {
    type Handle = ScriptedHandle;

    fn supported(&self) -> bool {
        self.supported
    }

    fn request_permission(&mut self) -> bool {
        self.log.lock().unwrap().permission_requests += 1;
        self.grant_permission
    }

    fn open(&mut self, _options: &CaptureOptions, sink: CaptureSink) -> voiceflip::Result<ScriptedHandle> {
        if self.fail_open {
            return Err(Error::Recognition("no audio device".to_string()));
        }
        let mut log = self.log.lock().unwrap();
        log.opened += 1;
        log.sink = Some(sink);
        Ok(ScriptedHandle {
            log: Arc::clone(&self.log),
        })
    }
}

pub struct ScriptedHandle {
    log: Arc<Mutex<CaptureLog>>,
}

impl CaptureHandle for ScriptedHandle {
    fn resume(&mut self) -> voiceflip::Result<()> {
        self.log.lock().unwrap().resumed += 1;
        Ok(())
    }

    fn halt(&mut self) {
        self.log.lock().unwrap().halted += 1;
    }
}

/// Push an event as the capture instance would
pub fn emit(log: &Arc<Mutex<CaptureLog>>, event: CaptureEvent) {
    let log = log.lock().unwrap();
    if let Some(sink) = &log.sink {
        sink.send(event).unwrap();
    }
}

/// Final utterance with the given alternatives
pub fn utterance(alternatives: &[&str]) -> CaptureEvent {
    CaptureEvent::Utterance {
        alternatives: alternatives.iter().map(ToString::to_string).collect(),
        is_final: true,
    }
}

pub fn words(pairs: &[(&str, &str)]) -> Vec<WordPair> {
    pairs
        .iter()
        .map(|(source, target)| WordPair::new(*source, *target, ""))
        .collect()
}

/// Controller wired to recording collaborators
pub struct Harness {
    pub controller: GameController,
    pub scheduler: Arc<RecordingScheduler>,
    pub presentation: Arc<RecordingPresentation>,
    pub cues: Arc<RecordingCues>,
}

impl Harness {
    pub fn new(words: Vec<WordPair>, config: GameConfig) -> Self {
        let scheduler = Arc::new(RecordingScheduler::default());
        let presentation = Arc::new(RecordingPresentation::default());
        let cues = Arc::new(RecordingCues::default());
        let controller = GameController::new(
            config,
            Arc::new(Dataset::new(words).unwrap()),
            scheduler.clone(),
            presentation.clone(),
            cues.clone(),
        )
        .with_rng(StdRng::seed_from_u64(11));

        Self {
            controller,
            scheduler,
            presentation,
            cues,
        }
    }

    /// Fire the most recently scheduled timer of `kind`
    pub fn fire(&mut self, kind: TimerKind) -> bool {
        let timer = self
            .scheduler
            .last(kind)
            .unwrap_or_else(|| panic!("no {kind:?} timer scheduled"));
        self.controller.handle_timer(timer)
    }

    /// Start a game and run the countdown to `Playing`
    pub fn play(&mut self) {
        assert!(self.controller.start_game());
        while let SessionState::Countdown(_) = self.controller.state() {
            assert!(self.fire(TimerKind::Countdown));
        }
        assert_eq!(self.controller.state(), SessionState::Playing);
    }

    /// Expected answer of the current word
    pub fn target(&self) -> String {
        self.controller.current_word().unwrap().target.clone()
    }

    pub fn answer_correctly(&mut self) {
        let target = self.target();
        assert!(self.controller.submit_candidates(&[target]));
    }

    pub fn answer_wrong(&mut self) {
        assert!(self.controller.submit_candidates(&["zzzzzz".to_string()]));
    }

    /// Let the feedback display elapse
    pub fn next(&mut self) {
        assert!(self.fire(TimerKind::FeedbackDelay));
    }
}

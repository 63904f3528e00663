//! Event loop wiring the controller to speech capture and timers
//!
//! Everything that can change game state arrives as an [`Event`] on one
//! queue and is handled to completion before the next one is read. After each
//! event the loop reconciles capture: it runs exactly while the controller is
//! `Playing`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::game::{CueSink, GameController, PresentationSink};
use crate::recognition::{
    CaptureEvent, CaptureProvider, PermissionState, RecognitionListener, RecognitionManager,
    RecognitionStatus,
};
use crate::timer::{Scheduler, TimerId, TimerKind, TokioScheduler};
use crate::words::DatasetProvider;

/// Requests coming from the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    StartGame,
    StartReview,
    /// Leave the game-over screen
    Menu,
    /// Typed answer
    Answer(String),
    Quit,
}

/// Anything the loop reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Input(Input),
    Timer(TimerId),
    /// Finalized utterance from the recognition manager
    Candidates(Vec<String>),
    /// Speech input status from the recognition manager
    Status(RecognitionStatus),
}

/// Sends player input into a running [`GameRuntime`]
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl RuntimeHandle {
    /// Queue an input; returns `false` once the runtime has stopped
    pub fn send(&self, input: Input) -> bool {
        self.tx.send(Event::Input(input)).is_ok()
    }
}

/// Posts recognition output back into the event queue
struct ChannelListener {
    tx: mpsc::UnboundedSender<Event>,
}

impl RecognitionListener for ChannelListener {
    fn on_candidates(&self, candidates: Vec<String>) {
        let _ = self.tx.send(Event::Candidates(candidates));
    }

    fn on_status(&self, status: RecognitionStatus) {
        let _ = self.tx.send(Event::Status(status));
    }
}

/// Single-threaded game loop
pub struct GameRuntime<P: CaptureProvider> {
    controller: GameController,
    recognition: Option<RecognitionManager<P>>,
    presentation: Arc<dyn PresentationSink>,
    tx: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
    captures: mpsc::UnboundedReceiver<CaptureEvent>,
}

impl<P: CaptureProvider> GameRuntime<P> {
    /// Build the runtime
    ///
    /// Without a `provider`, or with voice disabled, only typed answers are
    /// accepted and presentation is told capture is unsupported. Must be
    /// called within a tokio runtime.
    pub fn new(
        config: &Config,
        dataset: Arc<dyn DatasetProvider>,
        provider: Option<P>,
        permission: PermissionState,
        presentation: Arc<dyn PresentationSink>,
        cues: Arc<dyn CueSink>,
    ) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let (capture_tx, captures) = mpsc::unbounded_channel();
        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(tx.clone(), Event::Timer));

        let controller = GameController::new(
            config.game.clone(),
            dataset,
            Arc::clone(&scheduler),
            Arc::clone(&presentation),
            cues,
        );

        let recognition = provider.filter(|_| config.voice.enabled).map(|provider| {
            RecognitionManager::new(
                provider,
                config.voice.capture_options(),
                permission,
                capture_tx,
                scheduler,
                Arc::new(ChannelListener { tx: tx.clone() }),
            )
        });
        if recognition.is_none() {
            tracing::info!("speech input off, typed answers only");
            presentation.on_input_status(&RecognitionStatus::Unsupported);
        }

        Self {
            controller,
            recognition,
            presentation,
            tx,
            events,
            captures,
        }
    }

    /// Handle for sending player input
    #[must_use]
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            tx: self.tx.clone(),
        }
    }

    /// The controller, for inspection
    #[must_use]
    pub const fn controller(&self) -> &GameController {
        &self.controller
    }

    /// The recognition manager, if speech input is on
    #[must_use]
    pub const fn recognition(&self) -> Option<&RecognitionManager<P>> {
        self.recognition.as_ref()
    }

    /// Run until `Input::Quit`
    pub async fn run(mut self) -> Self {
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    if !self.dispatch(event) {
                        break;
                    }
                }
                Some(capture) = self.captures.recv() => {
                    if let Some(recognition) = self.recognition.as_mut() {
                        recognition.handle_event(capture);
                    }
                }
                else => break,
            }
            self.reconcile();
        }

        if let Some(recognition) = self.recognition.as_mut() {
            recognition.stop();
        }
        tracing::debug!("runtime stopped");
        self
    }

    /// Apply one event; returns `false` when the loop should end
    pub fn dispatch(&mut self, event: Event) -> bool {
        match event {
            Event::Input(input) => {
                tracing::trace!(?input, "input");
                match input {
                    Input::StartGame => {
                        self.controller.start_game();
                    }
                    Input::StartReview => {
                        self.controller.start_review();
                    }
                    Input::Menu => {
                        self.controller.acknowledge_game_over();
                    }
                    Input::Answer(text) => {
                        self.controller.submit_text(&text);
                    }
                    Input::Quit => return false,
                }
            }
            Event::Timer(timer) if timer.kind == TimerKind::RecognizerRestart => {
                if let Some(recognition) = self.recognition.as_mut() {
                    recognition.handle_timer(timer);
                }
            }
            Event::Timer(timer) => {
                self.controller.handle_timer(timer);
            }
            Event::Candidates(candidates) => {
                self.controller.submit_candidates(&candidates);
            }
            Event::Status(status) => self.presentation.on_input_status(&status),
        }
        true
    }

    /// Start or stop capture to match the controller state
    pub fn reconcile(&mut self) {
        let Some(recognition) = self.recognition.as_mut() else {
            return;
        };

        let wanted = self.controller.wants_listening();
        if wanted && !recognition.desired_active() {
            recognition.start();
        } else if !wanted && recognition.desired_active() {
            recognition.stop();
        }
    }
}

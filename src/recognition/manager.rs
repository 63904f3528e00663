//! Recognition session lifecycle
//!
//! `desired_active` is the caller's intent, `phase` is what the capture
//! instance is actually doing. They diverge while a stream ends and is
//! restarted; every decision below re-checks intent so that a `stop()` always
//! wins over a restart that is already scheduled.

use std::sync::Arc;

use uuid::Uuid;

use super::{
    CaptureEvent, CaptureHandle, CaptureOptions, CaptureProvider, CaptureSink, PermissionState,
    RecognitionListener, RecognitionStatus, clean_alternatives,
};
use crate::timer::{Scheduler, TimerBook, TimerId, TimerKind};

/// Lifecycle phase of the capture instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// No capture running
    Stopped,
    /// Capture requested, waiting for the instance to come up
    Starting,
    /// Capture running
    Listening,
    /// Stream ended on its own; a restart is pending
    Ending,
}

/// Keeps a single capture instance running for as long as the caller wants it
pub struct RecognitionManager<P: CaptureProvider> {
    provider: P,
    options: CaptureOptions,
    sink: CaptureSink,
    scheduler: Arc<dyn Scheduler>,
    listener: Arc<dyn RecognitionListener>,
    handle: Option<P::Handle>,
    session_id: Option<Uuid>,
    phase: CapturePhase,
    desired_active: bool,
    permission: PermissionState,
    /// Denial came from the capture instance rather than the initial state
    denied_by_capture: bool,
    supported: Option<bool>,
    timers: TimerBook,
    listening_reported: bool,
    restarts: u64,
}

impl<P: CaptureProvider> RecognitionManager<P> {
    /// Create a manager
    ///
    /// `permission` is whatever the process already knows about microphone
    /// access; `Unknown` makes the first `start()` ask the provider.
    /// Capture events for this manager must be read from the receiving end of
    /// `sink` and passed to [`Self::handle_event`].
    pub fn new(
        provider: P,
        options: CaptureOptions,
        permission: PermissionState,
        sink: CaptureSink,
        scheduler: Arc<dyn Scheduler>,
        listener: Arc<dyn RecognitionListener>,
    ) -> Self {
        Self {
            provider,
            options,
            sink,
            scheduler,
            listener,
            handle: None,
            session_id: None,
            phase: CapturePhase::Stopped,
            desired_active: false,
            permission,
            denied_by_capture: false,
            supported: None,
            timers: TimerBook::new(),
            listening_reported: false,
            restarts: 0,
        }
    }

    /// Start (or keep) listening
    ///
    /// Idempotent while starting or listening. Reuses the existing capture
    /// instance when there is one.
    pub fn start(&mut self) {
        if !self.check_supported() {
            return;
        }

        if self.permission == PermissionState::Unknown {
            self.permission = if self.provider.request_permission() {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            };
            if self.permission == PermissionState::Denied {
                self.report_permission_denied();
            }
        }
        if self.permission == PermissionState::Denied {
            return;
        }

        self.desired_active = true;
        self.cancel_restart();

        match self.phase {
            CapturePhase::Starting | CapturePhase::Listening => {}
            CapturePhase::Stopped | CapturePhase::Ending => self.launch(),
        }
    }

    /// Stop listening
    ///
    /// Unconditional: cancels any scheduled restart and halts the instance
    /// whatever phase it is in. A permission denial raised by the capture
    /// instance ends with the session, so the next `start()` asks again.
    pub fn stop(&mut self) {
        self.desired_active = false;
        self.cancel_restart();

        if self.denied_by_capture {
            self.denied_by_capture = false;
            self.permission = PermissionState::Unknown;
        }

        if let Some(handle) = self.handle.as_mut() {
            handle.halt();
        }
        if self.phase != CapturePhase::Stopped {
            tracing::debug!(session = ?self.session_id, "capture stopped");
        }
        self.phase = CapturePhase::Stopped;
        self.set_listening(false);
    }

    /// Process an event reported by the capture instance
    pub fn handle_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Started => {
                if self.desired_active {
                    self.phase = CapturePhase::Listening;
                    self.set_listening(true);
                }
            }
            CaptureEvent::Utterance {
                alternatives,
                is_final,
            } => {
                if !is_final || !self.desired_active {
                    return;
                }
                if self.phase == CapturePhase::Starting {
                    self.phase = CapturePhase::Listening;
                    self.set_listening(true);
                }

                let candidates = clean_alternatives(alternatives);
                if candidates.is_empty() {
                    return;
                }
                tracing::debug!(?candidates, "utterance recognized");
                self.listener.on_candidates(candidates);
            }
            CaptureEvent::Ended => {
                if self.desired_active {
                    self.phase = CapturePhase::Ending;
                    self.schedule_restart();
                } else {
                    self.phase = CapturePhase::Stopped;
                }
            }
            CaptureEvent::Error(error) if error.is_fatal() => {
                tracing::warn!(?error, "microphone access denied");
                self.permission = PermissionState::Denied;
                self.denied_by_capture = true;
                self.desired_active = false;
                self.cancel_restart();
                if let Some(mut handle) = self.handle.take() {
                    handle.halt();
                }
                self.phase = CapturePhase::Stopped;
                self.listening_reported = false;
                self.report_permission_denied();
            }
            CaptureEvent::Error(error) => {
                // The stream ends right after; the restart path recovers
                tracing::debug!(?error, "transient capture error");
            }
        }
    }

    /// Process a timer firing delivered by the scheduler
    pub fn handle_timer(&mut self, timer: TimerId) {
        if !self.timers.fire(timer) || !self.desired_active {
            return;
        }

        self.restarts += 1;
        tracing::debug!(
            session = ?self.session_id,
            restarts = self.restarts,
            "restarting capture"
        );
        self.launch();
    }

    /// Current lifecycle phase
    #[must_use]
    pub const fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Whether the caller currently wants capture running
    #[must_use]
    pub const fn desired_active(&self) -> bool {
        self.desired_active
    }

    /// Whether capture is confirmed running
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.phase == CapturePhase::Listening
    }

    /// Identity of the logical capture session, stable across restarts
    #[must_use]
    pub const fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// What is known about microphone access
    #[must_use]
    pub const fn permission(&self) -> PermissionState {
        self.permission
    }

    /// Number of automatic restarts performed
    #[must_use]
    pub const fn restart_count(&self) -> u64 {
        self.restarts
    }

    /// Restart firing currently awaited, if any
    #[must_use]
    pub fn pending_restart(&self) -> Option<TimerId> {
        self.timers.pending(TimerKind::RecognizerRestart)
    }

    /// Bring the single capture instance up, creating it on first use
    fn launch(&mut self) {
        if self.handle.is_none() {
            match self.provider.open(&self.options, self.sink.clone()) {
                Ok(handle) => {
                    let session_id = Uuid::new_v4();
                    tracing::info!(
                        session = %session_id,
                        language = %self.options.language,
                        alternatives = self.options.alternatives,
                        "capture instance opened"
                    );
                    self.handle = Some(handle);
                    self.session_id = Some(session_id);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to open capture instance");
                    // Not retried for the rest of the process
                    self.supported = Some(false);
                    self.desired_active = false;
                    self.phase = CapturePhase::Stopped;
                    self.listener.on_status(RecognitionStatus::Failed(e.to_string()));
                    return;
                }
            }
        }

        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        match handle.resume() {
            Ok(()) => self.phase = CapturePhase::Starting,
            Err(e) => {
                tracing::debug!(error = %e, "capture resume failed, will retry");
                self.phase = CapturePhase::Ending;
                self.schedule_restart();
            }
        }
    }

    fn schedule_restart(&mut self) {
        let timer = self.timers.arm(TimerKind::RecognizerRestart);
        self.scheduler.schedule(timer, self.options.restart_debounce);
    }

    fn cancel_restart(&mut self) {
        if let Some(timer) = self.timers.disarm(TimerKind::RecognizerRestart) {
            self.scheduler.cancel(timer);
        }
    }

    fn check_supported(&mut self) -> bool {
        if let Some(supported) = self.supported {
            return supported;
        }

        let supported = self.provider.supported();
        self.supported = Some(supported);
        if !supported {
            tracing::warn!("speech capture unsupported, typed answers only");
            self.listener.on_status(RecognitionStatus::Unsupported);
        }
        supported
    }

    fn report_permission_denied(&self) {
        self.listener.on_status(RecognitionStatus::PermissionDenied);
    }

    fn set_listening(&mut self, listening: bool) {
        if self.listening_reported == listening {
            return;
        }
        self.listening_reported = listening;
        self.listener.on_status(if listening {
            RecognitionStatus::Listening
        } else {
            RecognitionStatus::Idle
        });
    }
}

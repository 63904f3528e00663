//! Scheduled timers
//!
//! Every timer is a one-shot callback identified by its kind and a
//! generation number. Owners keep a [`TimerBook`] of the generation they are
//! currently waiting for; a firing whose generation no longer matches was
//! cancelled or superseded and is dropped. Cancellation therefore never
//! depends on the scheduler winning a race against an in-flight timer.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Pre-round countdown step
    Countdown,
    /// Round clock second
    RoundClock,
    /// End of the feedback display
    FeedbackDelay,
    /// Debounced recognizer restart
    RecognizerRestart,
}

/// Identity of one scheduled firing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    /// Timer purpose
    pub kind: TimerKind,
    /// Generation that must still be current when the timer fires
    pub generation: u64,
}

/// Schedules one-shot timers
///
/// Implementations deliver the [`TimerId`] back to the owner once `after`
/// has elapsed. They must never block the caller.
pub trait Scheduler: Send + Sync {
    /// Arrange for `timer` to fire after `after`
    fn schedule(&self, timer: TimerId, after: Duration);

    /// Best-effort cancellation of a pending firing
    ///
    /// Owners must still discard stale firings through their [`TimerBook`].
    fn cancel(&self, _timer: TimerId) {}
}

/// Tracks the generation each timer kind is currently waiting for
#[derive(Debug, Default)]
pub struct TimerBook {
    next_generation: u64,
    pending: HashMap<TimerKind, u64>,
}

impl TimerBook {
    /// Create an empty book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for a fresh firing of `kind`, superseding any previous one
    pub fn arm(&mut self, kind: TimerKind) -> TimerId {
        self.next_generation += 1;
        self.pending.insert(kind, self.next_generation);
        TimerId {
            kind,
            generation: self.next_generation,
        }
    }

    /// Stop waiting for `kind`; returns the firing that was pending, if any
    pub fn disarm(&mut self, kind: TimerKind) -> Option<TimerId> {
        self.pending
            .remove(&kind)
            .map(|generation| TimerId { kind, generation })
    }

    /// Stop waiting for every kind
    pub fn disarm_all(&mut self) -> Vec<TimerId> {
        self.pending
            .drain()
            .map(|(kind, generation)| TimerId { kind, generation })
            .collect()
    }

    /// Accept a firing if it is the one currently awaited
    ///
    /// Returns `false` for cancelled or superseded generations. An accepted
    /// firing is consumed: the same id is never accepted twice.
    pub fn fire(&mut self, timer: TimerId) -> bool {
        if self.pending.get(&timer.kind) == Some(&timer.generation) {
            self.pending.remove(&timer.kind);
            true
        } else {
            false
        }
    }

    /// The firing currently awaited for `kind`
    #[must_use]
    pub fn pending(&self, kind: TimerKind) -> Option<TimerId> {
        self.pending
            .get(&kind)
            .map(|generation| TimerId {
                kind,
                generation: *generation,
            })
    }
}

/// Tokio-backed scheduler that posts firings into a channel
///
/// Each timer is a sleeping task; cancelling aborts the task.
pub struct TokioScheduler<E> {
    tx: mpsc::UnboundedSender<E>,
    wrap: fn(TimerId) -> E,
    tasks: Mutex<HashMap<TimerId, JoinHandle<()>>>,
}

impl<E: Send + 'static> TokioScheduler<E> {
    /// Create a scheduler delivering `wrap(timer)` on `tx`
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<E>, wrap: fn(TimerId) -> E) -> Self {
        Self {
            tx,
            wrap,
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl<E: Send + 'static> Scheduler for TokioScheduler<E> {
    fn schedule(&self, timer: TimerId, after: Duration) {
        let tx = self.tx.clone();
        let event = (self.wrap)(timer);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Receiver gone means the runtime is shutting down
            let _ = tx.send(event);
        });

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|_, task| !task.is_finished());
            tasks.insert(timer, handle);
        }
    }

    fn cancel(&self, timer: TimerId) {
        if let Ok(mut tasks) = self.tasks.lock() {
            if let Some(task) = tasks.remove(&timer) {
                task.abort();
            }
        }
    }
}

//! Capture backed by an external recognizer process
//!
//! The program owns the microphone and the speech engine. It is started with
//! `VOICEFLIP_LANG` and `VOICEFLIP_ALTERNATIVES` in its environment and writes
//! one JSON object per line on stdout:
//!
//! ```text
//! {"type":"start"}
//! {"type":"result","final":true,"alternatives":["кот","код"]}
//! {"type":"error","error":"no-speech"}
//! {"type":"end"}
//! ```
//!
//! Exiting counts as the end of the stream, so a program that handles a
//! single utterance and quits is restarted transparently.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::{CaptureError, CaptureEvent, CaptureHandle, CaptureOptions, CaptureProvider, CaptureSink};
use crate::{Error, Result};

/// One line of recognizer output
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecognizerMessage {
    Start,
    Result {
        #[serde(default = "default_final", rename = "final")]
        is_final: bool,
        alternatives: Vec<String>,
    },
    Error {
        error: String,
    },
    End,
}

const fn default_final() -> bool {
    true
}

impl From<RecognizerMessage> for CaptureEvent {
    fn from(message: RecognizerMessage) -> Self {
        match message {
            RecognizerMessage::Start => Self::Started,
            RecognizerMessage::Result {
                is_final,
                alternatives,
            } => Self::Utterance {
                alternatives,
                is_final,
            },
            RecognizerMessage::Error { error } => Self::Error(CaptureError::from_code(&error)),
            RecognizerMessage::End => Self::Ended,
        }
    }
}

/// Provider that runs a recognizer program per capture run
#[derive(Debug, Clone)]
pub struct CommandCaptureProvider {
    program: String,
    args: Vec<String>,
}

impl CommandCaptureProvider {
    /// Create a provider for `program` with extra arguments
    #[must_use]
    pub const fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl CaptureProvider for CommandCaptureProvider {
    type Handle = CommandCaptureHandle;

    fn supported(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn open(&mut self, options: &CaptureOptions, sink: CaptureSink) -> Result<Self::Handle> {
        let program = which::which(&self.program).map_err(|e| {
            Error::Recognition(format!("recognizer {} not found: {e}", self.program))
        })?;

        let mut command = Command::new(program);
        command
            .args(&self.args)
            .env("VOICEFLIP_LANG", &options.language)
            .env("VOICEFLIP_ALTERNATIVES", options.alternatives.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        Ok(CommandCaptureHandle {
            command,
            sink,
            child: None,
            reader: None,
            current_run: Arc::new(AtomicU64::new(0)),
        })
    }
}

/// One logical capture instance; each run is a fresh child process
pub struct CommandCaptureHandle {
    command: Command,
    sink: CaptureSink,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
    current_run: Arc<AtomicU64>,
}

impl CommandCaptureHandle {
    /// A run is live while its process runs and its output is still relayed
    fn is_running(&mut self) -> bool {
        let relaying = self.reader.as_ref().is_some_and(|r| !r.is_finished());
        relaying
            && self
                .child
                .as_mut()
                .is_some_and(|child| matches!(child.try_wait(), Ok(None)))
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "recognizer already exited");
            }
        }
    }
}

impl CaptureHandle for CommandCaptureHandle {
    fn resume(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // A process that announced its end but kept running is replaced
        self.kill_child();

        let mut child = self.command.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Recognition("recognizer stdout unavailable".to_string()))?;

        let run = self.current_run.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(run, pid = ?child.id(), "recognizer process started");

        // Queued before the reader exists so it always precedes `Ended`
        let _ = self.sink.send(CaptureEvent::Started);

        self.reader = Some(tokio::spawn(forward_output(
            stdout,
            self.sink.clone(),
            Arc::clone(&self.current_run),
            run,
        )));
        self.child = Some(child);
        Ok(())
    }

    fn halt(&mut self) {
        // Invalidate the run first so its reader stays silent
        self.current_run.fetch_add(1, Ordering::SeqCst);
        self.kill_child();
    }
}

/// Relay recognizer output of one run until it exits or is superseded
async fn forward_output(
    stdout: ChildStdout,
    sink: CaptureSink,
    current_run: Arc<AtomicU64>,
    run: u64,
) {
    let is_current = || current_run.load(Ordering::SeqCst) == run;
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "recognizer output failed");
                break;
            }
        };
        if !is_current() {
            return;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RecognizerMessage>(line) {
            Ok(RecognizerMessage::End) => break,
            Ok(message) => {
                if sink.send(message.into()).is_err() {
                    return;
                }
            }
            Err(e) => tracing::warn!(error = %e, line, "unparseable recognizer output"),
        }
    }

    if is_current() {
        let _ = sink.send(CaptureEvent::Ended);
    }
}

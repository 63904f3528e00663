//! End-to-end runtime tests on virtual time

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use voiceflip::{
    CaptureEvent, Config, Dataset, GameRuntime, Input, PermissionState, RecognitionStatus,
    SessionState,
};

mod common;
use common::{RecordingCues, RecordingPresentation, ScriptedProvider, emit, utterance, words};

fn config(round_words: usize) -> Config {
    let mut config = Config::default();
    config.game.round_words = round_words;
    config
}

fn dataset() -> Arc<Dataset> {
    Arc::new(Dataset::new(words(&[("Apple", "яблоко"), ("Cat", "кот")])).unwrap())
}

#[tokio::test(start_paused = true)]
async fn typed_game_runs_to_game_over() {
    let presentation = Arc::new(RecordingPresentation::default());
    let runtime = GameRuntime::<ScriptedProvider>::new(
        &config(2),
        dataset(),
        None,
        PermissionState::Unknown,
        presentation.clone(),
        Arc::new(RecordingCues::default()),
    );
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    handle.send(Input::StartGame);
    sleep(Duration::from_secs(3)).await;
    assert_eq!(
        presentation.last_state().unwrap().state,
        SessionState::Playing
    );

    for _ in 0..2 {
        let target = presentation.current_target().unwrap();
        handle.send(Input::Answer(format!("  {target} ")));
        sleep(Duration::from_secs(2)).await;
    }
    assert_eq!(
        presentation.last_state().unwrap().state,
        SessionState::GameOver
    );

    handle.send(Input::Quit);
    let runtime = task.await.unwrap();
    assert_eq!(runtime.controller().score().score, 2);
    assert_eq!(
        presentation.statuses.lock().unwrap().first(),
        Some(&RecognitionStatus::Unsupported)
    );
}

#[tokio::test(start_paused = true)]
async fn round_clock_ends_an_unanswered_game() {
    let mut config = config(2);
    config.game.round_secs = 5;
    let presentation = Arc::new(RecordingPresentation::default());
    let cues = Arc::new(RecordingCues::default());
    let runtime = GameRuntime::<ScriptedProvider>::new(
        &config,
        dataset(),
        None,
        PermissionState::Unknown,
        presentation.clone(),
        cues.clone(),
    );
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    handle.send(Input::StartGame);
    // 2.4s countdown plus 5s of clock
    sleep(Duration::from_millis(7_000)).await;
    assert_eq!(
        presentation.last_state().unwrap().state,
        SessionState::Playing
    );
    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(
        presentation.last_state().unwrap().state,
        SessionState::GameOver
    );

    handle.send(Input::Menu);
    handle.send(Input::Quit);
    let runtime = task.await.unwrap();
    assert_eq!(runtime.controller().state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn capture_follows_playing_state() {
    let (provider, log) = ScriptedProvider::new();
    let presentation = Arc::new(RecordingPresentation::default());
    let runtime = GameRuntime::new(
        &config(2),
        dataset(),
        Some(provider),
        PermissionState::Granted,
        presentation.clone(),
        Arc::new(RecordingCues::default()),
    );
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    handle.send(Input::StartGame);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(log.lock().unwrap().opened, 0, "no capture during countdown");

    sleep(Duration::from_secs(2)).await;
    assert_eq!(log.lock().unwrap().opened, 1);
    assert_eq!(log.lock().unwrap().resumed, 1);

    emit(&log, CaptureEvent::Started);
    let target = presentation.current_target().unwrap();
    emit(&log, utterance(&[target.as_str()]));
    sleep(Duration::from_millis(100)).await;

    // Feedback stops capture
    assert_eq!(log.lock().unwrap().halted, 1);
    assert_eq!(presentation.feedback.lock().unwrap().len(), 1);

    // Next word resumes the same instance
    sleep(Duration::from_secs(2)).await;
    assert_eq!(log.lock().unwrap().opened, 1);
    assert_eq!(log.lock().unwrap().resumed, 2);

    handle.send(Input::Quit);
    let runtime = task.await.unwrap();
    assert!(!runtime.recognition().unwrap().desired_active());
    assert_eq!(runtime.controller().score().score, 1);
    assert_eq!(log.lock().unwrap().halted, 2);
}

#[tokio::test(start_paused = true)]
async fn stale_candidates_after_game_over_are_dropped() {
    let (provider, log) = ScriptedProvider::new();
    let mut config = config(1);
    config.game.round_secs = 2;
    let presentation = Arc::new(RecordingPresentation::default());
    let runtime = GameRuntime::new(
        &config,
        dataset(),
        Some(provider),
        PermissionState::Granted,
        presentation.clone(),
        Arc::new(RecordingCues::default()),
    );
    let handle = runtime.handle();
    let task = tokio::spawn(runtime.run());

    handle.send(Input::StartGame);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(
        presentation.last_state().unwrap().state,
        SessionState::GameOver
    );

    emit(&log, CaptureEvent::Started);
    emit(&log, utterance(&["яблоко", "кот"]));
    sleep(Duration::from_millis(100)).await;

    handle.send(Input::Quit);
    let runtime = task.await.unwrap();
    assert_eq!(runtime.controller().score().answered, 0);
    assert!(presentation.feedback.lock().unwrap().is_empty());
}

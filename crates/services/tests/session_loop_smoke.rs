use std::sync::Arc;

use quiz_core::model::{Prompt, SessionConfig, SessionMode, SessionOutcome};
use quiz_core::time::fixed_clock;
use services::{
    PlayerInput, RecordingPresentation, RoundEvent, RoundStateMachine, SessionHistoryService,
    SessionLoopService, SessionRuntime,
};
use storage::MemoryResponseLog;
use storage::repository::{InMemoryRepository, SessionHistoryRepository};
use tokio::sync::mpsc;

fn prompts() -> Vec<Prompt> {
    vec![
        Prompt::new("Largest planet?", "Jupiter", ["Mars".into(), "Venus".into()]).unwrap(),
        Prompt::new("H2O is?", "Water", ["Salt".into(), "Air".into()]).unwrap(),
        Prompt::new("2+2?", "4", ["3".into(), "5".into()]).unwrap(),
    ]
}

fn runtime(log: MemoryResponseLog) -> (SessionRuntime, mpsc::UnboundedReceiver<RoundEvent>) {
    let machine = RoundStateMachine::new(Box::new(RecordingPresentation::new()), Box::new(log))
        .with_clock(fixed_clock())
        .with_seed(9);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    (SessionRuntime::new(machine).with_event_sink(events_tx), events_rx)
}

#[tokio::test(start_paused = true)]
async fn session_loop_records_played_session() {
    let repo = InMemoryRepository::new();
    let loop_svc = SessionLoopService::new(Arc::new(repo.clone()));
    let log = MemoryResponseLog::new();
    let (mut rt, mut events) = runtime(log.clone());
    let (input_tx, mut input_rx) = mpsc::channel(8);

    // Always strike the right target as soon as a round appears.
    let player = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let RoundEvent::RoundStarted { correct_slot, .. } = event {
                if input_tx
                    .send(PlayerInput::Strike(correct_slot.index()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    });

    let played = loop_svc
        .play(
            &mut rt,
            SessionMode::Timed,
            SessionConfig::new(prompts()),
            &mut input_rx,
        )
        .await
        .unwrap()
        .expect("session finished");

    assert_eq!(played.report.outcome(), SessionOutcome::Won);
    assert_eq!(played.report.score(), 100);
    assert_eq!(played.report.lives_remaining(), Some(3));
    assert!(played.persist_error.is_none());
    assert_eq!(log.persisted().len(), 1);

    let stored = repo.get_session(played.history_id).await.unwrap();
    assert_eq!(stored.records.len(), 3);
    assert!(stored.records.iter().all(|r| r.was_correct));

    let history = SessionHistoryService::new(Arc::new(repo));
    let items = history.list_recent(5).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].stars, 3);

    drop(rt);
    player.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn quitting_records_nothing() {
    let repo = InMemoryRepository::new();
    let loop_svc = SessionLoopService::new(Arc::new(repo.clone()));
    let log = MemoryResponseLog::new();
    let (mut rt, _events) = runtime(log.clone());
    let (input_tx, mut input_rx) = mpsc::channel(8);

    input_tx.send(PlayerInput::Quit).await.unwrap();
    let played = loop_svc
        .play(
            &mut rt,
            SessionMode::Practice,
            SessionConfig::new(prompts()),
            &mut input_rx,
        )
        .await
        .unwrap();

    assert!(played.is_none());
    assert!(log.persisted().is_empty());
    assert!(repo.list_sessions(10).await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn response_log_failure_does_not_block_history() {
    let repo = InMemoryRepository::new();
    let loop_svc = SessionLoopService::new(Arc::new(repo.clone()));
    let (mut rt, _events) = runtime(MemoryResponseLog::failing());
    let (_input_tx, mut input_rx) = mpsc::channel(8);
    let config = SessionConfig::new(prompts())
        .with_duration_secs(3)
        .unwrap();

    let played = loop_svc
        .play(&mut rt, SessionMode::Timed, config, &mut input_rx)
        .await
        .unwrap()
        .expect("timer ends the session");

    assert_eq!(played.report.outcome(), SessionOutcome::Lost);
    assert!(played.persist_error.is_some());
    assert_eq!(repo.list_sessions(10).await.unwrap().len(), 1);
}

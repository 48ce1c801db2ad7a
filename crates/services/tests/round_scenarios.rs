use std::time::{Duration, Instant};

use quiz_core::model::{EndReason, Prompt, SessionConfig, SessionMode, SessionOutcome};
use quiz_core::time::fixed_clock;
use services::{
    Phase, PresentationCommand, RecordingPresentation, RoundEvent, RoundStateMachine,
};
use storage::MemoryResponseLog;

fn prompts(n: usize) -> Vec<Prompt> {
    (0..n)
        .map(|i| {
            Prompt::new(
                format!("Q{i}"),
                format!("right{i}"),
                [format!("wrong{i}a"), format!("wrong{i}b")],
            )
            .unwrap()
        })
        .collect()
}

struct Game {
    machine: RoundStateMachine,
    presentation: RecordingPresentation,
    log: MemoryResponseLog,
    t0: Instant,
}

impl Game {
    fn new() -> Self {
        let presentation = RecordingPresentation::new();
        let log = MemoryResponseLog::new();
        let machine =
            RoundStateMachine::new(Box::new(presentation.clone()), Box::new(log.clone()))
                .with_clock(fixed_clock())
                .with_seed(2024);
        Self {
            machine,
            presentation,
            log,
            t0: Instant::now(),
        }
    }

    fn at(&self, ms: u64) -> Instant {
        self.t0 + Duration::from_millis(ms)
    }

    fn correct(&self) -> usize {
        self.machine
            .current_round()
            .map(|r| r.correct_slot().index())
            .expect("active round")
    }

    fn wrong(&self) -> usize {
        (self.correct() + 1) % 3
    }
}

fn ended(events: &[RoundEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, RoundEvent::SessionEnded { .. }))
}

#[test]
fn practice_session_answered_correctly_is_won() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(2));
    let hit = config.hit_feedback().as_millis() as u64;
    g.machine
        .start_session(SessionMode::Practice, config, g.at(0));

    g.machine.target_struck(g.correct(), g.at(0));
    g.machine.poll(g.at(hit));
    g.machine.target_struck(g.correct(), g.at(hit));
    let events = g.machine.poll(g.at(2 * hit));

    assert!(ended(&events));
    let report = g.machine.report().unwrap();
    assert!(report.completed());
    assert_eq!(report.score(), 100);
    assert_eq!(report.outcome(), SessionOutcome::Won);
    assert_eq!(report.stars(), 3);
    assert_eq!(g.machine.phase(), Phase::Ended(SessionOutcome::Won));
    assert_eq!(g.log.persisted().len(), 1);
    assert_eq!(g.log.persisted()[0].len(), 2);
}

#[test]
fn completed_session_below_threshold_is_lost() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(4));
    let hit = config.hit_feedback().as_millis() as u64;
    let miss = config.miss_feedback().as_millis() as u64;
    g.machine
        .start_session(SessionMode::Practice, config, g.at(0));

    // Six misses on the first prompt, then every prompt answered correctly.
    let mut t = 0;
    for _ in 0..6 {
        g.machine.target_struck(g.wrong(), g.at(t));
        t += miss;
        g.machine.poll(g.at(t));
    }
    for _ in 0..4 {
        g.machine.target_struck(g.correct(), g.at(t));
        t += hit;
        g.machine.poll(g.at(t));
    }

    let report = g.machine.report().unwrap();
    assert_eq!(report.answered(), 10);
    assert_eq!(report.correct(), 4);
    assert_eq!(report.score(), 40);
    assert!(report.completed());
    assert_eq!(report.outcome(), SessionOutcome::Lost);
}

#[test]
fn three_misses_exhaust_lives() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(3)).with_max_lives(3).unwrap();
    let miss = config.miss_feedback().as_millis() as u64;
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    let round = g.machine.current_round().unwrap().number();
    let mut events = Vec::new();
    for i in 0..3 {
        assert_eq!(g.machine.current_round().unwrap().number(), round);
        events = g.machine.target_struck(g.wrong(), g.at(i * miss));
        g.machine.poll(g.at((i + 1) * miss));
        if i < 2 {
            assert_eq!(g.machine.phase(), Phase::AwaitingInput);
        }
    }

    assert!(ended(&events));
    let report = g.machine.report().unwrap();
    assert_eq!(report.reason(), EndReason::LivesExhausted);
    assert_eq!(report.outcome(), SessionOutcome::Lost);
    assert_eq!(report.answered(), 3);
    assert_eq!(report.correct(), 0);
    assert_eq!(report.lives_remaining(), Some(0));
    assert_eq!(g.machine.lives_remaining(), Some(0));

    let lives: Vec<u32> = g
        .presentation
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            PresentationCommand::LivesDisplay(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(lives, vec![3, 2, 1, 0]);
}

#[test]
fn timeout_cancels_pending_miss_unlock() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(3))
        .with_duration_secs(2)
        .unwrap();
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    // Miss delay would unlock at 2.3 s; the timer runs out at 2 s.
    g.machine.target_struck(g.wrong(), g.at(1_800));
    let events = g.machine.poll(g.at(5_000));

    assert!(ended(&events));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, RoundEvent::RoundUnlocked { .. }))
    );
    let report = g.machine.report().unwrap();
    assert_eq!(report.reason(), EndReason::TimeExpired);
    assert_eq!(report.outcome(), SessionOutcome::Lost);
    assert_eq!(report.time_remaining_secs(), Some(0));
    assert!(g.machine.is_locked());
}

#[test]
fn timeout_cancels_pending_advance() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(3))
        .with_duration_secs(2)
        .unwrap();
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    g.machine.target_struck(g.correct(), g.at(1_000));
    let events = g.machine.poll(g.at(4_000));

    assert!(ended(&events));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, RoundEvent::RoundStarted { .. }))
    );
    assert_eq!(g.machine.report().unwrap().answered(), 1);
}

#[test]
fn timer_wins_a_tie_with_the_unlock() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(3))
        .with_duration_secs(2)
        .unwrap();
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    g.machine.target_struck(g.wrong(), g.at(1_500));
    let events = g.machine.poll(g.at(2_000));

    assert!(ended(&events));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, RoundEvent::RoundUnlocked { .. }))
    );
}

#[test]
fn timeout_records_unresolved_round_only_when_enabled() {
    for record in [false, true] {
        let mut g = Game::new();
        let config = SessionConfig::new(prompts(2))
            .with_duration_secs(1)
            .unwrap()
            .with_record_unresolved_rounds(record);
        g.machine.start_session(SessionMode::Timed, config, g.at(0));

        g.machine.poll(g.at(1_000));

        let persisted = g.log.persisted();
        assert_eq!(persisted.len(), 1);
        if record {
            assert_eq!(persisted[0].len(), 1);
            assert_eq!(persisted[0][0].chosen_option, None);
            assert!(!persisted[0][0].was_correct);
        } else {
            assert!(persisted[0].is_empty());
        }
        // Unanswered rounds do not count toward the score.
        assert_eq!(g.machine.report().unwrap().answered(), 0);
    }
}

#[test]
fn answered_round_is_not_recorded_again_on_timeout() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(2))
        .with_duration_secs(1)
        .unwrap()
        .with_record_unresolved_rounds(true);
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    g.machine.target_struck(g.wrong(), g.at(100));
    g.machine.poll(g.at(1_000));

    let persisted = g.log.persisted();
    assert_eq!(persisted[0].len(), 1);
    assert!(persisted[0][0].chosen_option.is_some());
}

#[test]
fn empty_prompt_set_ends_immediately() {
    let mut g = Game::new();
    let events = g
        .machine
        .start_session(SessionMode::Timed, SessionConfig::new(Vec::new()), g.at(0));

    assert!(ended(&events));
    let report = g.machine.report().unwrap();
    assert!(report.completed());
    assert_eq!(report.score(), 0);
    assert_eq!(report.outcome(), SessionOutcome::Lost);
    assert!(g.machine.current_round().is_none());
    assert_eq!(g.log.persisted().len(), 1);
    assert!(g.machine.target_struck(0, g.at(10)).is_empty());
}

#[test]
fn new_session_drops_steps_from_the_previous_one() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(3));
    let hit = config.hit_feedback().as_millis() as u64;
    g.machine
        .start_session(SessionMode::Practice, config.clone(), g.at(0));
    g.machine.target_struck(g.correct(), g.at(0));

    g.machine
        .start_session(SessionMode::Practice, config, g.at(10));
    let events = g.machine.poll(g.at(hit + 10));

    assert!(events.is_empty());
    assert_eq!(g.machine.current_round().unwrap().number(), 1);
    assert_eq!(g.machine.stats().answered(), 0);
    assert!(!g.machine.is_locked());
}

#[test]
fn persist_runs_once_per_session() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(1));
    g.machine
        .start_session(SessionMode::Practice, config, g.at(0));
    g.machine.target_struck(g.correct(), g.at(0));

    g.machine.poll(g.at(10_000));
    g.machine.poll(g.at(20_000));
    assert!(g.machine.target_struck(0, g.at(20_000)).is_empty());

    assert_eq!(g.log.persisted().len(), 1);
    assert_eq!(g.machine.next_deadline(), None);
    let outcomes = g
        .presentation
        .commands()
        .into_iter()
        .filter(|c| matches!(c, PresentationCommand::ShowOutcome { .. }))
        .count();
    assert_eq!(outcomes, 1);
}

#[test]
fn timer_display_counts_down_and_stops_at_zero() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(1))
        .with_duration_secs(3)
        .unwrap();
    g.machine.start_session(SessionMode::Timed, config, g.at(0));
    g.machine.poll(g.at(3_000));

    let displays: Vec<String> = g
        .presentation
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            PresentationCommand::TimerDisplay(text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(displays, vec!["00:03", "00:02", "00:01", "00:00"]);
    assert_eq!(
        g.machine.report().unwrap().reason(),
        EndReason::TimeExpired
    );
}

#[test]
fn strike_after_unpolled_timeout_is_not_scored() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(3))
        .with_duration_secs(1)
        .unwrap()
        .with_max_lives(1)
        .unwrap();
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    // Nothing polled at the 1 s deadline; the strike itself arrives late.
    let events = g.machine.target_struck(g.wrong(), g.at(1_500));

    assert!(ended(&events));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, RoundEvent::RoundResolved { .. }))
    );
    let report = g.machine.report().unwrap();
    assert_eq!(report.reason(), EndReason::TimeExpired);
    assert_eq!(report.answered(), 0);
    assert_eq!(report.time_remaining_secs(), Some(0));
    assert_eq!(report.lives_remaining(), Some(1));
    assert!(g.log.persisted()[0].is_empty());
}

#[test]
fn pause_after_unpolled_timeout_ends_the_session() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(2))
        .with_duration_secs(1)
        .unwrap();
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    let events = g.machine.pause(g.at(1_200));

    assert!(ended(&events));
    assert_eq!(g.machine.phase(), Phase::Ended(SessionOutcome::Lost));
    assert_eq!(
        g.machine.report().unwrap().reason(),
        EndReason::TimeExpired
    );
    assert!(g.machine.resume(g.at(1_300)).is_empty());
}

#[test]
fn late_resume_runs_overdue_unlock_first() {
    let mut g = Game::new();
    let config = SessionConfig::new(prompts(2))
        .with_duration_secs(10)
        .unwrap();
    let miss = config.miss_feedback().as_millis() as u64;
    g.machine.start_session(SessionMode::Timed, config, g.at(0));

    g.machine.target_struck(g.wrong(), g.at(100));
    g.machine.pause(g.at(200));
    // Feedback delays keep running while paused.
    let events = g.machine.resume(g.at(100 + miss + 50));

    assert!(
        events
            .iter()
            .any(|e| matches!(e, RoundEvent::RoundUnlocked { .. }))
    );
    assert!(!g.machine.is_locked());
    assert_eq!(g.machine.time_remaining_secs(), Some(10));
}

#[test]
fn practice_start_clears_a_running_countdown() {
    let mut g = Game::new();
    g.machine
        .start_session(SessionMode::Timed, SessionConfig::new(prompts(2)), g.at(0));
    g.presentation.take();

    g.machine
        .start_session(SessionMode::Practice, SessionConfig::new(prompts(2)), g.at(500));

    assert!(
        g.presentation
            .commands()
            .contains(&PresentationCommand::TimerDisplay("00:00".into()))
    );
    assert_eq!(g.machine.next_deadline(), None);
    assert_eq!(g.machine.time_remaining_secs(), None);
}

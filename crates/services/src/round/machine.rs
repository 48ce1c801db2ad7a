use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{
    EndReason, Generation, ResponseRecord, SessionConfig, SessionMode, SessionReport,
    SessionStats, Slot,
};
use storage::{ResponseLog, ResponseLogError};

use super::agenda::{Agenda, Step, Ticket};
use super::{ActiveRound, Phase, Resolution, RoundEvent};
use crate::lives::LivesTracker;
use crate::presentation::Presentation;
use crate::sequencer::{QuestionSequencer, arrange_options};
use crate::timer::{TimerService, TimerSignal, TimerState};

#[derive(Debug)]
struct SessionState {
    mode: SessionMode,
    config: SessionConfig,
    stats: SessionStats,
    started_at: DateTime<Utc>,
    rounds_shown: u32,
}

/// Owns one session at a time and decides what every input and deadline means.
///
/// The machine never sleeps or reads the monotonic clock. Each operation takes
/// `now`; the caller waits until [`next_deadline`](Self::next_deadline) and then
/// calls [`poll`](Self::poll). Every delayed continuation carries the session
/// generation and round that scheduled it, and is dropped if either has moved on.
pub struct RoundStateMachine {
    presentation: Box<dyn Presentation + Send>,
    log: Box<dyn ResponseLog>,
    clock: Clock,
    rng: StdRng,
    sequencer: QuestionSequencer,
    timer: TimerService,
    lives: LivesTracker,
    agenda: Agenda,
    generation: Generation,
    phase: Phase,
    session: Option<SessionState>,
    round: Option<ActiveRound>,
    report: Option<SessionReport>,
    persist_error: Option<ResponseLogError>,
    last_start: Option<(SessionMode, SessionConfig)>,
}

impl RoundStateMachine {
    #[must_use]
    pub fn new(presentation: Box<dyn Presentation + Send>, log: Box<dyn ResponseLog>) -> Self {
        Self {
            presentation,
            log,
            clock: Clock::default(),
            rng: StdRng::from_rng(&mut rand::rng()),
            sequencer: QuestionSequencer::default(),
            timer: TimerService::new(),
            lives: LivesTracker::default(),
            agenda: Agenda::default(),
            generation: Generation::default(),
            phase: Phase::Idle,
            session: None,
            round: None,
            report: None,
            persist_error: None,
            last_start: None,
        }
    }

    /// Wall clock used for record and report timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Make prompt order and option placement reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    //
    // ─── OPERATIONS ────────────────────────────────────────────────────────────
    //

    /// Start a fresh session, discarding anything left from the previous one.
    pub fn start_session(
        &mut self,
        mode: SessionMode,
        config: SessionConfig,
        now: Instant,
    ) -> Vec<RoundEvent> {
        let mut events = Vec::new();

        self.agenda.clear();
        self.generation = self.generation.next();
        if self.round.take().is_some() {
            self.presentation.clear_targets();
        }
        self.report = None;
        self.persist_error = None;
        self.log.clear();

        self.sequencer.load(config.prompts().to_vec());
        self.sequencer.initialize_shuffle(&mut self.rng);

        if mode.is_timed() {
            let lives = self.lives.reset(config.max_lives());
            self.presentation.update_lives_display(lives);
            let signal = self.timer.start(config.duration_secs(), now);
            self.forward_timer(signal, now, &mut events);
        } else {
            self.stop_timer();
            self.timer.reset();
            self.lives = LivesTracker::default();
        }

        info!(
            generation = %self.generation,
            mode = %mode,
            prompts = self.sequencer.len(),
            "session started"
        );

        self.last_start = Some((mode, config.clone()));
        self.session = Some(SessionState {
            mode,
            config,
            stats: SessionStats::new(),
            started_at: self.clock.now(),
            rounds_shown: 0,
        });

        self.display_next_round(now, &mut events);
        events
    }

    /// Player struck the target at `index`.
    ///
    /// Ignored unless a round is awaiting input. The first accepted strike
    /// locks the round until it is unlocked or replaced. Anything already due
    /// at `now` runs first, so an overdue timeout beats the strike.
    pub fn target_struck(&mut self, index: usize, now: Instant) -> Vec<RoundEvent> {
        let mut events = self.poll(now);

        let Some(slot) = Slot::new(index) else {
            debug!(index, "ignoring strike outside the target slots");
            return events;
        };
        if self.phase != Phase::AwaitingInput {
            debug!(%slot, phase = ?self.phase, "ignoring strike, round not accepting input");
            return events;
        }
        let (Some(round), Some(session)) = (self.round.as_mut(), self.session.as_mut()) else {
            debug!(%slot, "ignoring strike, no active round");
            return events;
        };
        if round.locked {
            debug!(%slot, round = round.number, "ignoring strike, round locked");
            return events;
        }

        round.locked = true;
        round.recorded = true;
        let correct = slot == round.layout.correct_slot();
        let number = round.number;
        session.stats.record(correct);
        self.log.append(ResponseRecord::answered(
            round.prompt.text(),
            round.layout.option(slot),
            correct,
            self.clock.now(),
        ));
        events.push(RoundEvent::RoundResolved {
            round: number,
            slot,
            correct,
        });
        debug!(round = number, %slot, correct, "strike scored");

        let mode = session.mode;
        let hit_feedback = session.config.hit_feedback();
        let miss_feedback = session.config.miss_feedback();
        let ticket = self.ticket(number);

        if correct {
            self.phase = Phase::Resolving(Resolution::Success);
            self.presentation.play_hit_sequence(slot);
            self.agenda
                .schedule(now + hit_feedback, ticket, Step::AdvanceRound);
            return events;
        }

        self.phase = Phase::Resolving(Resolution::Failure);
        self.presentation.play_miss_sequence();

        if mode.is_timed() {
            let remaining = self.lives.decrement();
            self.presentation.update_lives_display(remaining);
            if self.lives.is_exhausted() {
                self.end_session(EndReason::LivesExhausted, now, &mut events);
                return events;
            }
        }

        self.agenda
            .schedule(now + miss_feedback, ticket, Step::UnlockRound);
        events
    }

    /// Run every timer tick and scheduled step due at or before `now`, in
    /// deadline order. A tick wins over a step due at the same instant.
    pub fn poll(&mut self, now: Instant) -> Vec<RoundEvent> {
        let mut events = Vec::new();

        loop {
            let tick_due = self.timer.next_deadline().filter(|due| *due <= now);
            let step_due = self.agenda.next_deadline().filter(|due| *due <= now);

            match (tick_due, step_due) {
                (None, None) => break,
                (Some(tick), step) if step.is_none_or(|step| tick <= step) => {
                    for signal in self.timer.tick(tick) {
                        self.forward_timer(signal, tick, &mut events);
                    }
                }
                _ => {
                    let Some((due, ticket, step)) = self.agenda.pop_due(now) else {
                        break;
                    };
                    self.run_step(ticket, step, due, &mut events);
                }
            }
        }

        events
    }

    /// Pause the countdown of a running timed session.
    ///
    /// Returns whatever was already due at `now`; check
    /// [`timer_state`](Self::timer_state) to see whether the pause took.
    pub fn pause(&mut self, now: Instant) -> Vec<RoundEvent> {
        let events = self.poll(now);
        if self.phase.is_running() && self.timer.pause() {
            debug!(remaining = self.timer.remaining_secs(), "timer paused");
        }
        events
    }

    /// Resume a paused countdown. The next tick is a full second after `now`.
    pub fn resume(&mut self, now: Instant) -> Vec<RoundEvent> {
        let events = self.poll(now);
        if !self.phase.is_running() {
            return events;
        }
        if let Some(TimerSignal::Display(text)) = self.timer.resume(now) {
            self.presentation.update_timer_display(&text);
            debug!(remaining = self.timer.remaining_secs(), "timer resumed");
        }
        events
    }

    /// Stop the countdown and start over with the last mode and configuration.
    pub fn restart(&mut self, now: Instant) -> Vec<RoundEvent> {
        let Some((mode, config)) = self.last_start.clone() else {
            debug!("restart requested before any session");
            return Vec::new();
        };
        let mut events = self.poll(now);
        self.stop_timer();
        info!(mode = %mode, "restarting session");
        events.extend(self.start_session(mode, config, now));
        events
    }

    /// Leave the session without scoring or persisting it.
    pub fn abandon(&mut self) {
        self.agenda.clear();
        self.generation = self.generation.next();
        self.stop_timer();
        self.presentation.clear_targets();
        if self.session.take().is_some() {
            info!("session abandoned");
        }
        self.round = None;
        self.report = None;
        self.persist_error = None;
        self.phase = Phase::Idle;
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timer.next_deadline(), self.agenda.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `false` exactly when a strike would currently be scored.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        !(self.phase == Phase::AwaitingInput && self.round.as_ref().is_some_and(|r| !r.locked))
    }

    #[must_use]
    pub fn current_round(&self) -> Option<&ActiveRound> {
        self.round.as_ref()
    }

    #[must_use]
    pub fn mode(&self) -> Option<SessionMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.session.as_ref().map(|s| s.stats).unwrap_or_default()
    }

    /// `None` outside timed sessions.
    #[must_use]
    pub fn lives_remaining(&self) -> Option<u32> {
        self.timed_session().then(|| self.lives.remaining())
    }

    /// `None` outside timed sessions.
    #[must_use]
    pub fn time_remaining_secs(&self) -> Option<u32> {
        self.timed_session().then(|| self.timer.remaining_secs())
    }

    #[must_use]
    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    /// Report of the session that ended last, until the next start.
    #[must_use]
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn persist_error(&self) -> Option<&ResponseLogError> {
        self.persist_error.as_ref()
    }

    /// Answer log of the current (or just ended) session.
    #[must_use]
    pub fn records(&self) -> Vec<ResponseRecord> {
        self.log.records()
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    fn display_next_round(&mut self, now: Instant, events: &mut Vec<RoundEvent>) {
        self.phase = Phase::Displaying;

        let Some(prompt) = self.sequencer.next_prompt().cloned() else {
            self.end_session(EndReason::PromptsExhausted, now, events);
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.rounds_shown += 1;
        let number = session.rounds_shown;
        let layout = arrange_options(&prompt, &mut self.rng);
        let correct_slot = layout.correct_slot();

        self.presentation
            .display_prompt(prompt.text(), layout.options());
        self.presentation.spawn_targets(correct_slot);

        self.round = Some(ActiveRound {
            number,
            prompt,
            layout,
            locked: false,
            recorded: false,
        });
        self.phase = Phase::AwaitingInput;

        debug!(round = number, %correct_slot, "round displayed");
        events.push(RoundEvent::RoundStarted {
            round: number,
            correct_slot,
        });
    }

    fn run_step(&mut self, ticket: Ticket, step: Step, at: Instant, events: &mut Vec<RoundEvent>) {
        if ticket.generation != self.generation {
            debug!(?step, generation = %ticket.generation, "dropping step from an old session");
            return;
        }

        match step {
            Step::AdvanceRound => {
                if self.phase != Phase::Resolving(Resolution::Success)
                    || !self.is_current_round(ticket.round)
                {
                    debug!(?step, round = ticket.round, "dropping stale step");
                    return;
                }
                self.round = None;
                self.presentation.clear_targets();
                self.display_next_round(at, events);
            }
            Step::UnlockRound => {
                if self.phase != Phase::Resolving(Resolution::Failure)
                    || !self.is_current_round(ticket.round)
                {
                    debug!(?step, round = ticket.round, "dropping stale step");
                    return;
                }
                if let Some(round) = self.round.as_mut() {
                    round.locked = false;
                }
                self.phase = Phase::AwaitingInput;
                debug!(round = ticket.round, "round unlocked for retry");
                events.push(RoundEvent::RoundUnlocked {
                    round: ticket.round,
                });
            }
            Step::RevealOutcome => {
                let (Phase::Ended(_), Some(report)) = (self.phase, self.report.as_ref()) else {
                    debug!(?step, "dropping stale step");
                    return;
                };
                self.presentation.show_outcome(report);
                events.push(RoundEvent::OutcomeRevealed);
            }
        }
    }

    fn forward_timer(&mut self, signal: TimerSignal, at: Instant, events: &mut Vec<RoundEvent>) {
        match signal {
            TimerSignal::Display(text) => self.presentation.update_timer_display(&text),
            TimerSignal::Timeout => self.on_timeout(at, events),
        }
    }

    fn on_timeout(&mut self, at: Instant, events: &mut Vec<RoundEvent>) {
        if !self.phase.is_running() {
            debug!(phase = ?self.phase, "ignoring timeout outside a running session");
            return;
        }

        let record_unresolved = self
            .session
            .as_ref()
            .is_some_and(|s| s.config.record_unresolved_rounds());
        if record_unresolved {
            if let Some(round) = self.round.as_mut().filter(|r| !r.recorded) {
                round.recorded = true;
                self.log
                    .append(ResponseRecord::unanswered(round.prompt.text(), self.clock.now()));
            }
        }

        self.end_session(EndReason::TimeExpired, at, events);
    }

    fn end_session(&mut self, reason: EndReason, at: Instant, events: &mut Vec<RoundEvent>) {
        self.agenda.clear();

        let Some((mode, stats, started_at, outcome_delay, rounds_shown)) =
            self.session.as_ref().map(|s| {
                (
                    s.mode,
                    s.stats,
                    s.started_at,
                    s.config.outcome_delay(),
                    s.rounds_shown,
                )
            })
        else {
            return;
        };

        let (lives_remaining, time_remaining) = if mode.is_timed() {
            (Some(self.lives.remaining()), Some(self.timer.remaining_secs()))
        } else {
            (None, None)
        };
        self.stop_timer();
        if self.round.take().is_some() {
            self.presentation.clear_targets();
        }

        let report = SessionReport::conclude(
            mode,
            reason,
            stats,
            lives_remaining,
            time_remaining,
            started_at,
            self.clock.now(),
        );
        self.phase = Phase::Ended(report.outcome());

        let persist_error = match self.log.persist() {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "failed to persist responses");
                Some(err)
            }
        };

        info!(
            reason = reason.as_str(),
            outcome = report.outcome().as_str(),
            score = report.score(),
            answered = report.answered(),
            correct = report.correct(),
            "session ended"
        );

        self.report = Some(report.clone());
        self.persist_error.clone_from(&persist_error);
        events.push(RoundEvent::SessionEnded {
            report,
            persist_error,
        });

        let ticket = self.ticket(rounds_shown);
        self.agenda
            .schedule(at + outcome_delay, ticket, Step::RevealOutcome);
    }

    //
    // ─── HELPERS ───────────────────────────────────────────────────────────────
    //

    fn stop_timer(&mut self) {
        if matches!(self.timer.state(), TimerState::Running | TimerState::Paused) {
            if let TimerSignal::Display(text) = self.timer.stop() {
                self.presentation.update_timer_display(&text);
            }
        }
    }

    fn timed_session(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.mode.is_timed())
    }

    fn is_current_round(&self, number: u32) -> bool {
        self.round.as_ref().is_some_and(|r| r.number == number)
    }

    fn ticket(&self, round: u32) -> Ticket {
        Ticket {
            generation: self.generation,
            round,
        }
    }
}

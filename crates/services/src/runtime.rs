//! Cooperative driver for [`RoundStateMachine`] on tokio time.
//!
//! One task owns the machine. It sleeps until the machine's next deadline or
//! the next player input, whichever comes first, and feeds the current
//! instant back in. Under a paused tokio clock the whole session runs in
//! virtual time.

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::debug;

use quiz_core::model::{SessionConfig, SessionMode, SessionReport};

use crate::round::{RoundEvent, RoundStateMachine};

/// Everything a player can do while a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    Strike(usize),
    Pause,
    Resume,
    Restart,
    Quit,
}

/// How [`SessionRuntime::drive`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The session ended and its outcome was revealed (or the player left
    /// after it ended).
    Finished(SessionReport),
    /// The player quit, or the input channel closed, mid-session.
    Abandoned,
}

pub struct SessionRuntime {
    machine: RoundStateMachine,
    events: Option<mpsc::UnboundedSender<RoundEvent>>,
}

impl SessionRuntime {
    #[must_use]
    pub fn new(machine: RoundStateMachine) -> Self {
        Self {
            machine,
            events: None,
        }
    }

    /// Forward every [`RoundEvent`] to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: mpsc::UnboundedSender<RoundEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    #[must_use]
    pub fn machine(&self) -> &RoundStateMachine {
        &self.machine
    }

    #[must_use]
    pub fn into_machine(self) -> RoundStateMachine {
        self.machine
    }

    pub fn start(&mut self, mode: SessionMode, config: SessionConfig) {
        let events = self.machine.start_session(mode, config, now());
        self.emit(events);
    }

    /// Run until the session is over or the player leaves.
    pub async fn drive(&mut self, inputs: &mut mpsc::Receiver<PlayerInput>) -> DriveOutcome {
        loop {
            if let Some(report) = self.finished_report() {
                return DriveOutcome::Finished(report);
            }

            let deadline = self.machine.next_deadline();
            // Deadlines first: a timeout that is already due outranks input.
            tokio::select! {
                biased;
                () = sleep_until(deadline) => {
                    let events = self.machine.poll(now());
                    self.emit(events);
                }
                input = inputs.recv() => {
                    let Some(input) = input.filter(|i| *i != PlayerInput::Quit) else {
                        return self.leave();
                    };
                    self.handle_input(input);
                }
            }
        }
    }

    fn handle_input(&mut self, input: PlayerInput) {
        let now = now();
        debug!(?input, "player input");
        let events = match input {
            PlayerInput::Strike(index) => self.machine.target_struck(index, now),
            PlayerInput::Pause => self.machine.pause(now),
            PlayerInput::Resume => self.machine.resume(now),
            PlayerInput::Restart => self.machine.restart(now),
            PlayerInput::Quit => Vec::new(),
        };
        self.emit(events);
    }

    fn leave(&mut self) -> DriveOutcome {
        if self.machine.phase().is_ended() {
            if let Some(report) = self.machine.report() {
                return DriveOutcome::Finished(report.clone());
            }
        }
        self.machine.abandon();
        DriveOutcome::Abandoned
    }

    fn finished_report(&self) -> Option<SessionReport> {
        if !self.machine.phase().is_ended() || self.machine.next_deadline().is_some() {
            return None;
        }
        self.machine.report().cloned()
    }

    fn emit(&self, events: Vec<RoundEvent>) {
        let Some(sink) = &self.events else {
            return;
        };
        for event in events {
            if sink.send(event).is_err() {
                debug!("event receiver dropped");
                return;
            }
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}

//! Countdown for timed sessions.
//!
//! The timer never sleeps. Callers ask for [`TimerService::next_deadline`],
//! wait until then, and hand the instant back to [`TimerService::tick`].

use std::time::{Duration, Instant};

use quiz_core::time::format_countdown;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
    Stopped,
}

/// Output of a timer transition, forwarded by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerSignal {
    /// New `MM:SS` text for the countdown display.
    Display(String),
    /// Natural expiry. Emitted at most once per `start`.
    Timeout,
}

#[derive(Debug, Clone)]
pub struct TimerService {
    state: TimerState,
    remaining_secs: u32,
    next_tick: Option<Instant>,
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            remaining_secs: 0,
            next_tick: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// When the next tick is due. `None` unless running.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            TimerState::Running => self.next_tick,
            _ => None,
        }
    }

    /// Begin counting down from `duration_secs`, from any state.
    pub fn start(&mut self, duration_secs: u32, now: Instant) -> TimerSignal {
        self.remaining_secs = duration_secs;
        self.state = TimerState::Running;
        self.next_tick = Some(now + TICK_INTERVAL);
        self.display()
    }

    /// Returns `false` if the timer was not running.
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.state = TimerState::Paused;
        self.next_tick = None;
        true
    }

    /// Continue a paused countdown. The next tick is a full interval after `now`.
    pub fn resume(&mut self, now: Instant) -> Option<TimerSignal> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        self.next_tick = Some(now + TICK_INTERVAL);
        Some(self.display())
    }

    /// Force the countdown to zero without firing the timeout.
    pub fn stop(&mut self) -> TimerSignal {
        self.remaining_secs = 0;
        self.state = TimerState::Stopped;
        self.next_tick = None;
        self.display()
    }

    /// Back to `Idle` without emitting anything.
    pub fn reset(&mut self) {
        self.remaining_secs = 0;
        self.state = TimerState::Idle;
        self.next_tick = None;
    }

    /// Process at most one due tick.
    ///
    /// Returns the display update, followed by `Timeout` when this tick
    /// reached zero. Returns nothing if no tick is due at `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<TimerSignal> {
        let Some(due) = self.next_deadline() else {
            return Vec::new();
        };
        if now < due {
            return Vec::new();
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let mut signals = vec![self.display()];

        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            self.next_tick = None;
            signals.push(TimerSignal::Timeout);
        } else {
            // Ticks stay on the scheduled cadence even when processed late.
            self.next_tick = Some(due + TICK_INTERVAL);
        }
        signals
    }

    fn display(&self) -> TimerSignal {
        TimerSignal::Display(format_countdown(self.remaining_secs))
    }
}

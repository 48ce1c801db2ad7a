use std::time::Instant;

use quiz_core::model::Generation;

/// Continuation the state machine queued for later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Hit feedback finished; show the next prompt.
    AdvanceRound,
    /// Miss feedback finished; accept input on the same targets again.
    UnlockRound,
    /// Outcome delay finished; show the result panel.
    RevealOutcome,
}

/// Identifies the session and round a step was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket {
    pub(crate) generation: Generation,
    pub(crate) round: u32,
}

#[derive(Debug)]
struct Scheduled {
    due: Instant,
    seq: u64,
    ticket: Ticket,
    step: Step,
}

/// Pending timed steps. Steps due at the same instant run in scheduling order.
#[derive(Debug, Default)]
pub(crate) struct Agenda {
    entries: Vec<Scheduled>,
    next_seq: u64,
}

impl Agenda {
    pub(crate) fn schedule(&mut self, due: Instant, ticket: Ticket, step: Step) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.push(Scheduled {
            due,
            seq,
            ticket,
            step,
        });
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Remove and return the earliest step due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<(Instant, Ticket, Step)> {
        let (index, _) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))?;
        let entry = self.entries.swap_remove(index);
        Some((entry.due, entry.ticket, entry.step))
    }

    /// Cancel everything.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ticket(round: u32) -> Ticket {
        Ticket {
            generation: Generation::new(1),
            round,
        }
    }

    #[test]
    fn pops_earliest_due_first() {
        let t0 = Instant::now();
        let mut agenda = Agenda::default();
        agenda.schedule(t0 + Duration::from_millis(500), ticket(2), Step::UnlockRound);
        agenda.schedule(t0 + Duration::from_millis(100), ticket(1), Step::AdvanceRound);

        assert_eq!(agenda.next_deadline(), Some(t0 + Duration::from_millis(100)));
        assert!(agenda.pop_due(t0).is_none());

        let later = t0 + Duration::from_secs(1);
        let (_, first, step) = agenda.pop_due(later).unwrap();
        assert_eq!((first.round, step), (1, Step::AdvanceRound));
        let (_, second, step) = agenda.pop_due(later).unwrap();
        assert_eq!((second.round, step), (2, Step::UnlockRound));
        assert!(agenda.pop_due(later).is_none());
    }

    #[test]
    fn same_instant_keeps_scheduling_order() {
        let due = Instant::now();
        let mut agenda = Agenda::default();
        agenda.schedule(due, ticket(1), Step::UnlockRound);
        agenda.schedule(due, ticket(1), Step::RevealOutcome);

        assert_eq!(agenda.pop_due(due).map(|(_, _, s)| s), Some(Step::UnlockRound));
        assert_eq!(agenda.pop_due(due).map(|(_, _, s)| s), Some(Step::RevealOutcome));
    }

    #[test]
    fn clear_cancels_pending_steps() {
        let due = Instant::now();
        let mut agenda = Agenda::default();
        agenda.schedule(due, ticket(1), Step::AdvanceRound);
        agenda.clear();

        assert_eq!(agenda.len(), 0);
        assert_eq!(agenda.next_deadline(), None);
        assert!(agenda.pop_due(due).is_none());
    }
}

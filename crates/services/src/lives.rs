/// Remaining mistakes allowed in a timed session.
///
/// Each mutator returns the new count so the caller can forward it to the
/// lives display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LivesTracker {
    max: u32,
    remaining: u32,
}

impl LivesTracker {
    #[must_use]
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    pub fn reset(&mut self, max: u32) -> u32 {
        self.max = max;
        self.remaining = max;
        self.remaining
    }

    /// Lose one life. Never goes below zero.
    pub fn decrement(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_floors_at_zero() {
        let mut lives = LivesTracker::new(2);
        assert_eq!(lives.decrement(), 1);
        assert!(!lives.is_exhausted());
        assert_eq!(lives.decrement(), 0);
        assert!(lives.is_exhausted());
        assert_eq!(lives.decrement(), 0);
    }

    #[test]
    fn reset_restores_budget() {
        let mut lives = LivesTracker::new(3);
        lives.decrement();
        assert_eq!(lives.reset(5), 5);
        assert_eq!(lives.max(), 5);
        assert_eq!(lives.remaining(), 5);
    }
}

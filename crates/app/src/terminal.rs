use std::io::Write;

use quiz_core::model::{SLOT_COUNT, SessionReport, Slot};
use services::Presentation;
use tracing::debug;

/// Line-oriented rendering for a terminal. Targets are numbered 1 to 3.
pub struct TerminalPresentation<W> {
    out: W,
}

impl TerminalPresentation<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalPresentation<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            debug!(error = %err, "terminal write failed");
        }
    }
}

/// Only every tenth second and the last five are worth a line.
fn worth_showing(countdown: &str) -> bool {
    let secs = countdown
        .rsplit(':')
        .next()
        .and_then(|s| s.parse::<u32>().ok());
    let mins = countdown
        .split(':')
        .next()
        .and_then(|m| m.parse::<u32>().ok());
    match (mins, secs) {
        (Some(0), Some(s)) if s <= 5 => true,
        (_, Some(s)) => s % 10 == 0,
        _ => true,
    }
}

impl<W: Write> Presentation for TerminalPresentation<W> {
    fn display_prompt(&mut self, text: &str, options: &[String; SLOT_COUNT]) {
        self.line("");
        self.line(text);
        let row = options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("[{}] {option}", i + 1))
            .collect::<Vec<_>>()
            .join("   ");
        self.line(&format!("  {row}"));
    }

    fn spawn_targets(&mut self, _correct_slot: Slot) {
        self.line("Strike a target (1-3):");
    }

    fn play_hit_sequence(&mut self, slot: Slot) {
        self.line(&format!("Hit! Target {} was right.", slot.index() + 1));
    }

    fn play_miss_sequence(&mut self) {
        self.line("Miss.");
    }

    fn show_outcome(&mut self, report: &SessionReport) {
        let verdict = if report.won() { "You won" } else { "You lost" };
        self.line("");
        self.line(&format!(
            "{verdict}: {}/{} correct, score {}%, {} star(s).",
            report.correct(),
            report.answered(),
            report.score(),
            report.stars()
        ));
    }

    fn update_timer_display(&mut self, text: &str) {
        if worth_showing(text) {
            self.line(&format!("Time {text}"));
        }
    }

    fn update_lives_display(&mut self, remaining: u32) {
        self.line(&format!("Lives {remaining}"));
    }

    fn clear_targets(&mut self) {}
}

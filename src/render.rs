use crate::error::RenderError;
use crate::history::HistoryEntry;
use crate::scoring::ScoreReport;
use crate::session::SessionResult;
use crate::target::TargetText;
use crate::typing::{TypingMachine, TypingMode};

/// Read-only snapshot of the typing state, handed to the renderer after each key.
#[derive(Debug, Clone, Copy)]
pub struct TypingView<'a> {
    pub target: &'a TargetText,
    pub committed: &'a [String],
    pub buffer: &'a str,
    pub mode: TypingMode,
    pub seconds_remaining: Option<f64>,
}

impl<'a> TypingView<'a> {
    pub fn of(machine: &'a TypingMachine) -> Self {
        Self {
            target: machine.target(),
            committed: machine.committed(),
            buffer: machine.buffer(),
            mode: machine.mode(),
            seconds_remaining: None,
        }
    }

    pub fn with_seconds_remaining(mut self, secs: Option<f64>) -> Self {
        self.seconds_remaining = secs;
        self
    }

    /// Everything typed so far, committed lines first.
    pub fn current_input(&self) -> String {
        let mut input = self.committed.join("\n");
        if !self.committed.is_empty() && !self.buffer.is_empty() {
            input.push('\n');
        }
        input.push_str(self.buffer);
        input
    }

    pub fn active_line(&self) -> usize {
        match self.mode {
            TypingMode::Legacy => 0,
            TypingMode::MultiLine => self.committed.len(),
        }
    }
}

/// Snapshot shown once a session has been scored.
#[derive(Debug, Clone, Copy)]
pub struct ResultsView<'a> {
    pub report: &'a ScoreReport,
    pub result: &'a SessionResult,
    pub author: Option<&'a str>,
    pub history: &'a [HistoryEntry],
}

/// Draws typing and results screens. Implementations never own typing state.
pub trait Renderer {
    fn render_typing(&mut self, view: &TypingView<'_>) -> Result<(), RenderError>;
    fn render_results(&mut self, view: &ResultsView<'_>) -> Result<(), RenderError>;
}

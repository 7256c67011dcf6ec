use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::keystroke::Keystroke;
use crate::target::TargetText;

/// How keystrokes are turned into lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TypingMode {
    /// The whole target is one line typed into one capped buffer.
    Legacy,
    /// Each target line is typed and committed with Enter before the next.
    MultiLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    Active,
    Completed,
    Cancelled,
}

/// Converts keystrokes into edits against a target text.
///
/// The machine never reads a clock; timing belongs to the session controller.
#[derive(Debug, Clone)]
pub struct TypingMachine {
    target: TargetText,
    mode: TypingMode,
    state: TypingState,
    buffer: String,
    buffer_len: usize,
    committed: Vec<String>,
}

impl TypingMachine {
    pub fn new(target: TargetText, mode: TypingMode) -> Self {
        let target = match mode {
            TypingMode::Legacy if target.line_count() > 1 => target.flattened(),
            _ => target,
        };

        Self {
            target,
            mode,
            state: TypingState::Active,
            buffer: String::new(),
            buffer_len: 0,
            committed: Vec::new(),
        }
    }

    pub fn process_key(&mut self, key: Keystroke) -> TypingState {
        if !self.is_active() {
            return self.state;
        }

        trace!(?key, mode = %self.mode, "key");
        match key {
            Keystroke::Printable(c) => self.write(c),
            Keystroke::Backspace => self.backspace(),
            Keystroke::Commit => self.commit(),
            Keystroke::Cancel => self.cancel(),
            Keystroke::Unknown => {}
        }

        self.state
    }

    fn write(&mut self, c: char) {
        match self.mode {
            TypingMode::Legacy => {
                if self.buffer_len >= self.target.line_len(0) {
                    debug!("input overflowed the target, stopping");
                    self.transition(TypingState::Completed);
                    return;
                }
                self.push(c);
                if self.target.line(0) == Some(self.buffer.as_str()) {
                    self.transition(TypingState::Completed);
                }
            }
            TypingMode::MultiLine => {
                self.push(c);
                if self.final_line_filled() {
                    self.commit_buffer();
                    self.transition(TypingState::Completed);
                }
            }
        }
    }

    fn push(&mut self, c: char) {
        self.buffer.push(c);
        self.buffer_len += 1;
    }

    fn backspace(&mut self) {
        if self.buffer.pop().is_some() {
            self.buffer_len -= 1;
        }
    }

    fn commit(&mut self) {
        match self.mode {
            TypingMode::Legacy => self.transition(TypingState::Completed),
            TypingMode::MultiLine => {
                if self.buffer.is_empty() {
                    return;
                }
                self.commit_buffer();
                if self.committed.len() == self.target.line_count() {
                    self.transition(TypingState::Completed);
                }
            }
        }
    }

    fn cancel(&mut self) {
        if self.mode == TypingMode::MultiLine {
            self.transition(TypingState::Cancelled);
        }
    }

    fn commit_buffer(&mut self) {
        self.committed.push(std::mem::take(&mut self.buffer));
        self.buffer_len = 0;
    }

    /// Lines complete on length alone; the characters may all be wrong.
    fn final_line_filled(&self) -> bool {
        let last = self.target.line_count() - 1;
        self.committed.len() == last
            && self.buffer_len == self.target.line_len(last)
            && self
                .committed
                .iter()
                .enumerate()
                .all(|(idx, line)| line.chars().count() == self.target.line_len(idx))
    }

    fn transition(&mut self, next: TypingState) {
        debug!(from = ?self.state, to = ?next, "typing state");
        self.state = next;
    }

    /// Stop the session because time ran out, keeping the line in progress.
    pub fn finish(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.mode == TypingMode::MultiLine
            && !self.buffer.is_empty()
            && self.committed.len() < self.target.line_count()
        {
            self.commit_buffer();
        }
        self.transition(TypingState::Completed);
    }

    /// Stop the session because no more input can be read.
    pub fn abandon(&mut self) {
        if self.is_active() {
            self.transition(TypingState::Cancelled);
        }
    }

    pub fn state(&self) -> TypingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TypingState::Active
    }

    pub fn mode(&self) -> TypingMode {
        self.mode
    }

    pub fn target(&self) -> &TargetText {
        &self.target
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    /// Index of the target line the buffer is being typed against.
    pub fn active_line(&self) -> usize {
        match self.mode {
            TypingMode::Legacy => 0,
            TypingMode::MultiLine => self.committed.len(),
        }
    }

    /// The finalized input lines handed to scoring.
    pub fn transcript(&self) -> Vec<String> {
        match self.mode {
            TypingMode::Legacy => vec![self.buffer.clone()],
            TypingMode::MultiLine => self.committed.clone(),
        }
    }
}

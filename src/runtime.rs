use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEventKind};

use crate::error::InputReadError;
use crate::keystroke::Keystroke;

/// Source of keystrokes for the session loop.
pub trait KeySource {
    /// Block until a keystroke arrives.
    ///
    /// With a `timeout`, returns `Ok(None)` once it expires without input.
    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<Keystroke>, InputReadError>;
}

/// Production key source reading straight from the terminal on the calling thread.
#[derive(Debug, Default)]
pub struct CrosstermKeySource;

impl CrosstermKeySource {
    pub fn new() -> Self {
        Self
    }

    fn next_event(&self, timeout: Option<Duration>) -> io::Result<Option<CtEvent>> {
        if let Some(t) = timeout {
            if !event::poll(t)? {
                return Ok(None);
            }
        }
        event::read().map(Some)
    }
}

impl KeySource for CrosstermKeySource {
    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<Keystroke>, InputReadError> {
        match self.next_event(timeout)? {
            None => Ok(None),
            Some(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => Ok(Some(key.into())),
            // Resizes and releases still trigger a redraw in the caller.
            Some(_) => Ok(Some(Keystroke::Unknown)),
        }
    }
}

/// Bounded retry for transient read failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_consecutive_failures: u32,
}

impl RetryPolicy {
    pub fn new(max_consecutive_failures: u32) -> Self {
        Self {
            max_consecutive_failures,
        }
    }

    pub fn should_retry(&self, err: &InputReadError, failures_so_far: u32) -> bool {
        err.is_transient() && failures_so_far < self.max_consecutive_failures
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(8)
    }
}

/// Scripted key source for tests and headless runs.
///
/// Reports [`InputReadError::Closed`] once the script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedKeySource {
    script: VecDeque<Result<Option<Keystroke>, InputReadError>>,
}

impl ScriptedKeySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: Keystroke) -> Self {
        self.script.push_back(Ok(Some(key)));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.script
            .extend(Keystroke::sequence(text).into_iter().map(|k| Ok(Some(k))));
        self
    }

    pub fn fail(mut self, kind: io::ErrorKind) -> Self {
        self.script
            .push_back(Err(InputReadError::Io(io::Error::new(kind, "scripted failure"))));
        self
    }

    pub fn timeout(mut self) -> Self {
        self.script.push_back(Ok(None));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl KeySource for ScriptedKeySource {
    fn read_key(&mut self, _timeout: Option<Duration>) -> Result<Option<Keystroke>, InputReadError> {
        self.script.pop_front().unwrap_or(Err(InputReadError::Closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn scripted_source_replays_in_order_then_closes() {
        let mut keys = ScriptedKeySource::new().text("ab").key(Keystroke::Commit);
        assert_eq!(keys.remaining(), 3);

        assert_matches!(keys.read_key(None), Ok(Some(Keystroke::Printable('a'))));
        assert_matches!(keys.read_key(None), Ok(Some(Keystroke::Printable('b'))));
        assert_matches!(keys.read_key(None), Ok(Some(Keystroke::Commit)));
        assert_matches!(keys.read_key(None), Err(InputReadError::Closed));
    }

    #[test]
    fn scripted_source_yields_failures_and_timeouts() {
        let mut keys = ScriptedKeySource::new()
            .fail(io::ErrorKind::Interrupted)
            .timeout();

        assert_matches!(keys.read_key(None), Err(InputReadError::Io(_)));
        assert_matches!(keys.read_key(Some(Duration::from_millis(1))), Ok(None));
    }

    #[test]
    fn retry_policy_is_bounded() {
        let policy = RetryPolicy::new(2);
        let transient = InputReadError::Io(io::Error::new(io::ErrorKind::Other, "flaky"));

        assert!(policy.should_retry(&transient, 0));
        assert!(policy.should_retry(&transient, 1));
        assert!(!policy.should_retry(&transient, 2));
        assert!(!policy.should_retry(&InputReadError::Closed, 0));
    }

    #[test]
    fn default_policy_allows_eight_failures() {
        assert_eq!(RetryPolicy::default().max_consecutive_failures, 8);
    }
}

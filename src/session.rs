use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{InputReadError, RenderError, StoreError};
use crate::history::{HistoryEntry, HistoryStore};
use crate::render::{Renderer, ResultsView, TypingView};
use crate::runtime::{KeySource, RetryPolicy};
use crate::scoring::{self, ScoreReport};
use crate::target::{Prompt, TargetText};
use crate::typing::{TypingMachine, TypingState};

/// Wall-clock source, injectable so sessions can be replayed deterministically.
pub trait Clock {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Append each finished session to the history store.
    pub save: bool,
    /// Stop the session once this much time has passed.
    pub time_limit: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save: true,
            time_limit: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything typed during one attempt, frozen once the attempt ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub target: TargetText,
    pub committed: Vec<String>,
    pub started_at: SystemTime,
    pub ended_at: SystemTime,
}

/// Non-fatal problems met while running a session.
#[derive(Debug, Error)]
pub enum SessionNotice {
    #[error("stopped reading input: {0}")]
    InputAbandoned(#[source] InputReadError),
    #[error("{0}")]
    Render(#[from] RenderError),
    #[error("could not save this session: {0}")]
    SaveFailed(#[source] StoreError),
    #[error("could not load session history: {0}")]
    HistoryUnavailable(#[source] StoreError),
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub result: SessionResult,
    pub report: ScoreReport,
    pub state: TypingState,
    pub notices: Vec<SessionNotice>,
}

/// Drives one attempt from first key to scored result.
pub struct SessionController<K, R, C = SystemClock> {
    config: SessionConfig,
    keys: K,
    renderer: R,
    clock: C,
    history: Box<dyn HistoryStore>,
}

impl<K: KeySource, R: Renderer, C: Clock> SessionController<K, R, C> {
    pub fn new(
        config: SessionConfig,
        keys: K,
        renderer: R,
        clock: C,
        history: Box<dyn HistoryStore>,
    ) -> Self {
        Self {
            config,
            keys,
            renderer,
            clock,
            history,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn keys(&mut self) -> &mut K {
        &mut self.keys
    }

    pub fn renderer(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Run a single attempt at `prompt`. Can be called again to restart.
    pub fn run(&mut self, prompt: &Prompt) -> SessionOutcome {
        let mut machine = TypingMachine::new(prompt.text.clone(), prompt.typing_mode);
        let mut notices = Vec::new();

        let started_at = self.clock.now();
        info!(
            mode = %prompt.typing_mode,
            scoring = %prompt.scoring_mode,
            lines = machine.target().line_count(),
            "session started"
        );

        self.draw(&machine, started_at, &mut notices);
        let mut failures = 0;

        while machine.is_active() {
            let remaining = self.remaining(started_at);
            if remaining == Some(Duration::ZERO) {
                debug!("time limit reached");
                machine.finish();
                break;
            }

            match self.keys.read_key(remaining) {
                Ok(Some(key)) => {
                    failures = 0;
                    machine.process_key(key);
                    self.draw(&machine, started_at, &mut notices);
                }
                Ok(None) => {
                    debug!("time limit reached while waiting for input");
                    machine.finish();
                }
                Err(err) if self.config.retry.should_retry(&err, failures) => {
                    failures += 1;
                    debug!(error = %err, failures, "retrying key read");
                }
                Err(err) => {
                    warn!(error = %err, "abandoning session input");
                    machine.abandon();
                    notices.push(SessionNotice::InputAbandoned(err));
                }
            }
        }

        let result = SessionResult {
            target: machine.target().clone(),
            committed: machine.transcript(),
            started_at,
            ended_at: self.clock.now(),
        };
        let report = scoring::score(&result, prompt.scoring_mode);
        info!(
            state = ?machine.state(),
            wpm = report.wpm,
            accuracy = report.accuracy,
            "session finished"
        );

        if self.config.save {
            let entry = HistoryEntry::from_report(result.ended_at, &report);
            if let Err(e) = self.history.append(&entry) {
                warn!(error = %e, "failed to save session");
                notices.push(SessionNotice::SaveFailed(e));
            }
        }

        let history = self.history.read_all().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read history");
            notices.push(SessionNotice::HistoryUnavailable(e));
            Vec::new()
        });

        let view = ResultsView {
            report: &report,
            result: &result,
            author: prompt.author.as_deref(),
            history: &history,
        };
        if let Err(e) = self.renderer.render_results(&view) {
            warn!(error = %e, "failed to render results");
            notices.push(e.into());
        }

        SessionOutcome {
            result,
            report,
            state: machine.state(),
            notices,
        }
    }

    fn remaining(&self, started_at: SystemTime) -> Option<Duration> {
        let limit = self.config.time_limit?;
        let elapsed = self
            .clock
            .now()
            .duration_since(started_at)
            .unwrap_or_default();
        Some(limit.saturating_sub(elapsed))
    }

    fn draw(
        &mut self,
        machine: &TypingMachine,
        started_at: SystemTime,
        notices: &mut Vec<SessionNotice>,
    ) {
        let secs = self.remaining(started_at).map(|d| d.as_secs_f64());
        let view = TypingView::of(machine).with_seconds_remaining(secs);
        if let Err(e) = self.renderer.render_typing(&view) {
            debug!(error = %e, "render failed");
            // one notice per session is enough, a broken terminal fails every frame
            if !notices.iter().any(|n| matches!(n, SessionNotice::Render(_))) {
                notices.push(e.into());
            }
        }
    }
}

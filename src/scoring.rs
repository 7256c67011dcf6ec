use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::session::SessionResult;

/// Elapsed time substituted when the clock reports zero or negative duration.
pub const MIN_ELAPSED_SECS: f64 = 1.0;

/// Characters per word in the character-rate formula.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Which words-per-minute formula to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ScoringMode {
    /// Whole words matched at the same ordinal position, for whitespace-delimited text.
    WordCount,
    /// Correct characters divided by five, for scripts without word boundaries.
    CharRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreReport {
    pub wpm: f64,
    pub accuracy: f64,
    pub total_chars: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub max_streak: usize,
    pub matched_words: usize,
    pub elapsed_secs: f64,
}

/// Outcome of the left-to-right positional scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionalTally {
    pub correct: usize,
    pub max_streak: usize,
}

/// Compare input lines against target lines position by position.
///
/// Lines pair up by ordinal; within a line only the overlapping prefix is
/// compared. Nothing is realigned, so a dropped character shifts every later
/// comparison on that line. The streak restarts on each new line.
pub fn compare_positional<T, I>(target: &[T], input: &[I]) -> PositionalTally
where
    T: AsRef<str>,
    I: AsRef<str>,
{
    let mut tally = PositionalTally::default();

    for (expected, typed) in target.iter().zip(input) {
        let mut streak = 0;
        for (e, t) in expected.as_ref().chars().zip(typed.as_ref().chars()) {
            if e == t {
                tally.correct += 1;
                streak += 1;
                tally.max_streak = tally.max_streak.max(streak);
            } else {
                streak = 0;
            }
        }
    }

    tally
}

/// Count whitespace-separated words that are equal at the same ordinal position.
pub fn matched_words<'a>(
    target: impl IntoIterator<Item = &'a str>,
    input: impl IntoIterator<Item = &'a str>,
) -> usize {
    target
        .into_iter()
        .zip(input)
        .filter(|(expected, typed)| expected == typed)
        .count()
}

pub fn accuracy(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 / total as f64) * 100.0
}

/// Seconds between two timestamps; a zero or negative span becomes [`MIN_ELAPSED_SECS`].
pub fn elapsed_secs(started_at: SystemTime, ended_at: SystemTime) -> f64 {
    let secs = ended_at
        .duration_since(started_at)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    if secs > 0.0 {
        secs
    } else {
        MIN_ELAPSED_SECS
    }
}

pub fn score(result: &SessionResult, mode: ScoringMode) -> ScoreReport {
    let target = result.target.lines();
    let tally = compare_positional(target, &result.committed);

    let total_chars = result.target.total_chars();
    let elapsed_secs = elapsed_secs(result.started_at, result.ended_at);
    let minutes = elapsed_secs / 60.0;

    let matched_words = matched_words(
        result.target.words(),
        result.committed.iter().flat_map(|l| l.split_whitespace()),
    );

    let wpm = match mode {
        ScoringMode::WordCount => matched_words as f64 / minutes,
        ScoringMode::CharRate => (tally.correct as f64 / CHARS_PER_WORD) / minutes,
    };

    ScoreReport {
        wpm,
        accuracy: accuracy(tally.correct, total_chars),
        total_chars,
        correct_chars: tally.correct,
        incorrect_chars: total_chars - tally.correct,
        max_streak: tally.max_streak,
        matched_words,
        elapsed_secs,
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid language or mode selection. Raised before a session starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown language '{0}' (see `typyn show-languages`)")]
    UnknownLanguage(String),
    #[error("{language} has no {mode} corpus")]
    UnsupportedMode { language: String, mode: String },
    #[error("--quotes and --sentences cannot be combined")]
    ConflictingModes,
    #[error("word count must be at least 1")]
    ZeroWords,
}

/// Corpus file missing, unparsable, or unable to produce a target text.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus file not found: {0}")]
    Missing(String),
    #[error("failed to read corpus file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corpus file {file} is not valid: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("requested {requested} words but the list only has {available}")]
    NotEnoughWords { requested: usize, available: usize },
    #[error("target text must contain at least one non-empty line")]
    EmptyText,
}

/// Why a prompt could not be produced.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// Failure reading the next keystroke.
#[derive(Debug, Error)]
pub enum InputReadError {
    #[error("terminal read failed: {0}")]
    Io(#[from] io::Error),
    #[error("input source closed")]
    Closed,
}

impl InputReadError {
    /// Whether another read attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, InputReadError::Io(_))
    }
}

/// Persistence failure in a history store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history io error: {0}")]
    Io(#[from] io::Error),
    #[error("history entry could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("history store was opened read-only")]
    ReadOnly,
}

#[derive(Debug, Error)]
#[error("render failed: {0}")]
pub struct RenderError(#[from] pub io::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_read_errors_are_transient() {
        let err = InputReadError::from(io::Error::new(io::ErrorKind::Interrupted, "eintr"));
        assert!(err.is_transient());
        assert!(!InputReadError::Closed.is_transient());
    }

    #[test]
    fn config_errors_name_the_offending_value() {
        let err = ConfigError::UnknownLanguage("klingon".into());
        assert!(err.to_string().contains("klingon"));

        let err = ConfigError::UnsupportedMode {
            language: "chinese".into(),
            mode: "words".into(),
        };
        assert_eq!(err.to_string(), "chinese has no words corpus");
    }

    #[test]
    fn not_enough_words_reports_both_counts() {
        let err = CorpusError::NotEnoughWords {
            requested: 50,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "requested 50 words but the list only has 3"
        );
    }
}

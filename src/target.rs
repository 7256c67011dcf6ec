use crate::error::CorpusError;
use crate::scoring::ScoringMode;
use crate::typing::TypingMode;

/// The text a session asks the player to type: one or more non-empty lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetText {
    lines: Vec<String>,
}

impl TargetText {
    pub fn new<I, S>(lines: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() || lines.iter().any(|l| l.is_empty()) {
            return Err(CorpusError::EmptyText);
        }
        Ok(Self { lines })
    }

    pub fn single(line: impl Into<String>) -> Result<Self, CorpusError> {
        Self::new([line.into()])
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length of a line in characters, zero when out of range.
    pub fn line_len(&self, idx: usize) -> usize {
        self.line(idx).map_or(0, |l| l.chars().count())
    }

    pub fn total_chars(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }

    /// Collapse all lines into one, separated by single spaces.
    pub fn flattened(&self) -> TargetText {
        Self {
            lines: vec![self.lines.join(" ")],
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().flat_map(|l| l.split_whitespace())
    }
}

/// A target text together with how it should be typed and scored.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: TargetText,
    pub author: Option<String>,
    pub typing_mode: TypingMode,
    pub scoring_mode: ScoringMode,
}

impl Prompt {
    pub fn new(text: TargetText, typing_mode: TypingMode, scoring_mode: ScoringMode) -> Self {
        Self {
            text,
            author: None,
            typing_mode,
            scoring_mode,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

pub mod core;
pub mod provider;
pub mod quotes;
pub mod sentences;

pub use self::core::{CorpusFiles, WordList};
pub use provider::{CorpusProvider, LocalCorpus};
pub use quotes::Quote;
pub use sentences::SentenceSet;

use crate::error::ConfigError;
use crate::scoring::ScoringMode;

/// Which kind of corpus a session draws its text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CorpusMode {
    Words,
    Quote,
    SentenceSet,
}

impl CorpusMode {
    fn dir(&self) -> &'static str {
        match self {
            CorpusMode::Words => "words",
            CorpusMode::Quote => "quotes",
            CorpusMode::SentenceSet => "sentences",
        }
    }
}

/// How a language separates words, which decides the WPM formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Whitespace,
    Continuous,
}

impl Script {
    pub fn scoring_mode(&self) -> ScoringMode {
        match self {
            Script::Whitespace => ScoringMode::WordCount,
            Script::Continuous => ScoringMode::CharRate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum LanguageId {
    #[strum(serialize = "chinese")]
    Chinese,
    #[strum(serialize = "english")]
    English,
    #[strum(serialize = "español")]
    Spanish,
}

impl LanguageId {
    pub const ALL: [LanguageId; 3] = [LanguageId::Chinese, LanguageId::English, LanguageId::Spanish];

    /// Parse a `--lang` value; accepts the code, the english name, and ISO 639-1.
    pub fn from_code(code: &str) -> Result<Self, ConfigError> {
        match code.trim().to_lowercase().as_str() {
            "chinese" | "zh" | "中文" => Ok(LanguageId::Chinese),
            "english" | "en" => Ok(LanguageId::English),
            "español" | "espanol" | "spanish" | "es" => Ok(LanguageId::Spanish),
            _ => Err(ConfigError::UnknownLanguage(code.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::Chinese => "中文",
            LanguageId::English => "English",
            LanguageId::Spanish => "Spanish",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            LanguageId::Chinese => "🇨🇳",
            LanguageId::English => "🇬🇧",
            LanguageId::Spanish => "🇪🇸",
        }
    }

    pub fn script(&self) -> Script {
        match self {
            LanguageId::Chinese => Script::Continuous,
            LanguageId::English | LanguageId::Spanish => Script::Whitespace,
        }
    }

    pub fn modes(&self) -> &'static [CorpusMode] {
        match self {
            LanguageId::Chinese => &[CorpusMode::SentenceSet],
            LanguageId::English => &[CorpusMode::Words, CorpusMode::Quote, CorpusMode::SentenceSet],
            LanguageId::Spanish => &[CorpusMode::Words, CorpusMode::Quote],
        }
    }

    pub fn default_mode(&self) -> CorpusMode {
        self.modes()[0]
    }

    pub fn supports(&self, mode: CorpusMode) -> bool {
        self.modes().contains(&mode)
    }

    /// Corpus file for a mode, relative to the corpus root.
    pub fn corpus_path(&self, mode: CorpusMode) -> String {
        let stem = match self {
            LanguageId::Chinese => "chinese",
            LanguageId::English => "english",
            LanguageId::Spanish => "spanish",
        };
        format!("{}/{stem}.json", mode.dir())
    }
}

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::core::{CorpusFiles, WordList};
use super::quotes::{self, Quote};
use super::sentences::SentenceSet;
use super::{CorpusMode, LanguageId};
use crate::error::{ConfigError, CorpusError, PromptError};
use crate::target::{Prompt, TargetText};
use crate::typing::TypingMode;

/// Supplies the text for a session.
pub trait CorpusProvider {
    fn get(&mut self, language: LanguageId, mode: CorpusMode, count: usize) -> Result<Prompt, PromptError>;
}

/// Provider backed by the embedded corpora or a directory override.
#[derive(Debug)]
pub struct LocalCorpus {
    files: CorpusFiles,
    rng: StdRng,
}

impl LocalCorpus {
    pub fn new(files: CorpusFiles) -> Self {
        Self {
            files,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(files: CorpusFiles, seed: u64) -> Self {
        Self {
            files,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CorpusProvider for LocalCorpus {
    fn get(&mut self, language: LanguageId, mode: CorpusMode, count: usize) -> Result<Prompt, PromptError> {
        if !language.supports(mode) {
            return Err(ConfigError::UnsupportedMode {
                language: language.to_string(),
                mode: mode.to_string(),
            }
            .into());
        }
        let path = language.corpus_path(mode);
        let scoring = language.script().scoring_mode();

        let prompt = match mode {
            CorpusMode::Words => {
                if count == 0 {
                    return Err(ConfigError::ZeroWords.into());
                }
                let list: WordList = self.files.load(&path)?;
                let words = list.sample(&mut self.rng, count)?;
                Prompt::new(TargetText::single(words.join(" "))?, TypingMode::Legacy, scoring)
            }
            CorpusMode::Quote => {
                let all: Vec<Quote> = self.files.load(&path)?;
                let quote = quotes::choose(&all, &mut self.rng)?;
                Prompt::new(TargetText::single(quote.quote.trim())?, TypingMode::Legacy, scoring)
                    .with_author(quote.author.clone())
            }
            CorpusMode::SentenceSet => {
                let set: SentenceSet = self.files.load(&path)?;
                Prompt::new(set.choose(&mut self.rng)?, TypingMode::MultiLine, scoring)
            }
        };

        tracing::debug!(
            %language,
            %mode,
            lines = prompt.text.line_count(),
            chars = prompt.text.total_chars(),
            "prompt selected"
        );
        Ok(prompt)
    }
}

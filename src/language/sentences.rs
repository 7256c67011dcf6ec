use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::CorpusError;
use crate::target::TargetText;

/// Groups of lines typed one line at a time.
#[derive(Deserialize, Clone, Debug)]
pub struct SentenceSet {
    pub name: String,
    pub groups: Vec<Vec<String>>,
}

impl SentenceSet {
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TargetText, CorpusError> {
        let group = self.groups.choose(rng).ok_or(CorpusError::EmptyText)?;
        TargetText::new(group.iter().map(|line| line.trim()))
    }
}

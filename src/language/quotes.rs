use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::CorpusError;

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub quote: String,
    pub author: String,
}

/// Pick one quote at random; an empty collection has nothing to type.
pub fn choose<'a, R: Rng + ?Sized>(quotes: &'a [Quote], rng: &mut R) -> Result<&'a Quote, CorpusError> {
    quotes.choose(rng).ok_or(CorpusError::EmptyText)
}

use std::fs;
use std::io;
use std::path::PathBuf;

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CorpusError;

static LANG_DIR: Dir = include_dir!("src/lang");

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    /// Draw `count` distinct entries without replacement.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> Result<Vec<String>, CorpusError> {
        if count > self.words.len() {
            return Err(CorpusError::NotEnoughWords {
                requested: count,
                available: self.words.len(),
            });
        }
        Ok(self.words.choose_multiple(rng, count).cloned().collect())
    }
}

/// Where corpus files are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorpusFiles {
    /// Files compiled into the binary.
    #[default]
    Embedded,
    /// A directory on disk; files it lacks fall back to the embedded copy.
    Directory(PathBuf),
}

impl CorpusFiles {
    pub fn read(&self, relative: &str) -> Result<String, CorpusError> {
        if let CorpusFiles::Directory(root) = self {
            let path = root.join(relative);
            match fs::read_to_string(&path) {
                Ok(contents) => return Ok(contents),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "corpus override missing, using embedded copy");
                }
                Err(source) => return Err(CorpusError::Read { path, source }),
            }
        }
        read_embedded(relative)
    }

    pub fn load<T: DeserializeOwned>(&self, relative: &str) -> Result<T, CorpusError> {
        let contents = self.read(relative)?;
        serde_json::from_str(&contents).map_err(|source| CorpusError::Parse {
            file: relative.to_string(),
            source,
        })
    }
}

fn read_embedded(relative: &str) -> Result<String, CorpusError> {
    LANG_DIR
        .get_file(relative)
        .and_then(|file| file.contents_utf8())
        .map(str::to_string)
        .ok_or_else(|| CorpusError::Missing(relative.to_string()))
}

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::history::HistoryBackend;
use crate::language::{CorpusFiles, CorpusMode, LanguageId};
use crate::runtime::RetryPolicy;
use crate::session::SessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub words: usize,
    pub time_secs: u64,
    pub enforce_time_limit: bool,
    pub quotes: bool,
    pub sentences: bool,
    pub save: bool,
    pub history_backend: HistoryBackend,
    pub corpus_dir: Option<PathBuf>,
    pub input_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "english".to_string(),
            words: 15,
            time_secs: 40,
            enforce_time_limit: false,
            quotes: false,
            sentences: false,
            save: true,
            history_backend: HistoryBackend::JsonLines,
            corpus_dir: None,
            input_retries: RetryPolicy::default().max_consecutive_failures,
        }
    }
}

/// Validated settings for one run of the game.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub language: LanguageId,
    pub mode: CorpusMode,
    pub words: usize,
    pub time_secs: u64,
    pub enforce_time_limit: bool,
    pub save: bool,
    pub history_backend: HistoryBackend,
    pub corpus: CorpusFiles,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let language = LanguageId::from_code(&self.language)?;
        let mode = match (self.quotes, self.sentences) {
            (true, true) => return Err(ConfigError::ConflictingModes),
            (true, false) => CorpusMode::Quote,
            (false, true) => CorpusMode::SentenceSet,
            (false, false) => language.default_mode(),
        };
        if !language.supports(mode) {
            return Err(ConfigError::UnsupportedMode {
                language: language.to_string(),
                mode: mode.to_string(),
            });
        }
        if mode == CorpusMode::Words && self.words == 0 {
            return Err(ConfigError::ZeroWords);
        }

        Ok(Settings {
            language,
            mode,
            words: self.words,
            time_secs: self.time_secs,
            enforce_time_limit: self.enforce_time_limit,
            save: self.save,
            history_backend: self.history_backend,
            corpus: self
                .corpus_dir
                .clone()
                .map_or(CorpusFiles::Embedded, CorpusFiles::Directory),
            retry: RetryPolicy::new(self.input_retries),
        })
    }
}

impl Settings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            save: self.save,
            time_limit: (self.enforce_time_limit && self.time_secs > 0)
                .then(|| Duration::from_secs(self.time_secs)),
            retry: self.retry,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typyn") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typyn_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
            tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"language": "español", "history_backend": "sqlite"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.language, "español");
        assert_eq!(cfg.history_backend, HistoryBackend::Sqlite);
        assert_eq!(cfg.words, 15);
        assert_eq!(cfg.time_secs, 40);
        assert!(cfg.save);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{{{").unwrap();

        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn default_config_resolves_to_english_words() {
        let settings = Config::default().resolve().unwrap();

        assert_eq!(settings.language, LanguageId::English);
        assert_eq!(settings.mode, CorpusMode::Words);
        assert_eq!(settings.corpus, CorpusFiles::Embedded);
        assert_eq!(settings.retry, RetryPolicy::new(8));
        assert_eq!(settings.session_config().time_limit, None);
    }

    #[test]
    fn chinese_defaults_to_sentence_sets() {
        let cfg = Config {
            language: "chinese".into(),
            words: 0,
            ..Config::default()
        };
        assert_eq!(cfg.resolve().unwrap().mode, CorpusMode::SentenceSet);
    }

    #[test]
    fn resolve_rejects_invalid_combinations() {
        let both = Config {
            quotes: true,
            sentences: true,
            ..Config::default()
        };
        assert_matches!(both.resolve(), Err(ConfigError::ConflictingModes));

        let spanish_sentences = Config {
            language: "español".into(),
            sentences: true,
            ..Config::default()
        };
        assert_matches!(
            spanish_sentences.resolve(),
            Err(ConfigError::UnsupportedMode { .. })
        );

        let zero = Config {
            words: 0,
            ..Config::default()
        };
        assert_matches!(zero.resolve(), Err(ConfigError::ZeroWords));

        let unknown = Config {
            language: "latin".into(),
            ..Config::default()
        };
        assert_matches!(unknown.resolve(), Err(ConfigError::UnknownLanguage(_)));
    }

    #[test]
    fn time_limit_only_when_enforced() {
        let cfg = Config {
            time_secs: 30,
            enforce_time_limit: true,
            corpus_dir: Some(PathBuf::from("/srv/corpus")),
            ..Config::default()
        };
        let settings = cfg.resolve().unwrap();

        assert_eq!(
            settings.session_config().time_limit,
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            settings.corpus,
            CorpusFiles::Directory(PathBuf::from("/srv/corpus"))
        );
    }
}

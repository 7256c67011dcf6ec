use directories::ProjectDirs;
use std::path::PathBuf;

use crate::history::HistoryBackend;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("typyn"))
        } else {
            ProjectDirs::from("", "", "typyn").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn history_path(backend: HistoryBackend) -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(backend.file_name()))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir()
    }
}

// Library surface for the binary and integration tests.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod keystroke;
pub mod language;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod target;
pub mod typing;
pub mod ui;

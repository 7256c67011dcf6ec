use anyhow::{Context, Result};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use itertools::Itertools;
use std::io::{self, stdin, BufRead, Write};

use typyn::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Settings},
    history::{open_store, Access, HistoryStore, MemoryStore},
    keystroke::Keystroke,
    language::{CorpusProvider, LanguageId, LocalCorpus},
    logging,
    runtime::{CrosstermKeySource, KeySource, RetryPolicy},
    session::{SessionController, SessionNotice, SystemClock},
    target::Prompt,
    ui::TerminalRenderer,
};

/// terminal typing game with positional scoring and session history
#[derive(Parser, Debug)]
#[command(
    name = "typyn",
    version,
    about,
    disable_help_subcommand = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// play a round (default)
    Run(RunArgs),
    /// show usage
    Help,
    /// print the version
    Version,
    /// list the available languages and their modes
    ShowLanguages,
    /// erase the saved session history
    DeleteSaves,
}

#[derive(Args, Debug, Default, Clone)]
struct RunArgs {
    /// language to type in (see `show-languages`)
    #[arg(short = 'l', long)]
    lang: Option<String>,

    /// number of words to type
    #[arg(short = 'w', long)]
    words: Option<usize>,

    /// session length in seconds
    #[arg(short = 't', long)]
    time: Option<u64>,

    /// type a quote instead of random words
    #[arg(long)]
    quotes: bool,

    /// type a multi-line sentence set
    #[arg(long)]
    sentences: bool,

    /// stop the session when --time runs out
    #[arg(long)]
    enforce_time: bool,

    /// record finished sessions in the history
    #[arg(long, value_name = "BOOL")]
    save: Option<bool>,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(lang) = &self.lang {
            config.language = lang.clone();
        }
        if let Some(words) = self.words {
            config.words = words;
        }
        if let Some(time) = self.time {
            config.time_secs = time;
        }
        if let Some(save) = self.save {
            config.save = save;
        }
        config.quotes |= self.quotes;
        config.sentences |= self.sentences;
        config.enforce_time_limit |= self.enforce_time;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitType {
    Restart,
    New,
    Quit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init(&dir));

    match cli.command {
        None => play(&cli.run),
        Some(Command::Run(args)) => play(&args),
        Some(Command::Help) => {
            Cli::command().print_long_help()?;
            Ok(())
        }
        Some(Command::Version) => {
            println!("typyn {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Command::ShowLanguages) => {
            show_languages();
            Ok(())
        }
        Some(Command::DeleteSaves) => delete_saves(),
    }
}

fn load_settings(args: &RunArgs) -> Result<Settings> {
    let store = FileConfigStore::new();
    let mut config = store.load();
    args.apply(&mut config);
    config
        .resolve()
        .with_context(|| format!("invalid settings (config file: {})", store.path().display()))
}

fn open_history(settings: &Settings) -> Box<dyn HistoryStore> {
    let Some(path) = AppDirs::history_path(settings.history_backend) else {
        tracing::warn!("no state directory, history kept in memory");
        return Box::new(MemoryStore::default());
    };
    match open_store(settings.history_backend, &path, Access::from_save_flag(settings.save)) {
        Ok(store) => store,
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "history unavailable, kept in memory");
            eprintln!("warning: history unavailable ({err}), this run will not be saved");
            Box::new(MemoryStore::default())
        }
    }
}

fn play(args: &RunArgs) -> Result<()> {
    let settings = load_settings(args)?;
    let mut corpus = LocalCorpus::new(settings.corpus.clone());
    let prompt = corpus
        .get(settings.language, settings.mode, settings.words)
        .context("could not prepare a prompt")?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let history = open_history(&settings);

    let screen = enter_screen()?;
    let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut controller = SessionController::new(
        settings.session_config(),
        CrosstermKeySource::new(),
        TerminalRenderer::new(terminal).with_locale(settings.language),
        SystemClock,
        history,
    );

    let played = play_rounds(&mut controller, &mut corpus, &settings, prompt);

    controller.renderer().terminal_mut().show_cursor()?;
    screen.finish()?;

    for notice in played? {
        eprintln!("warning: {notice}");
    }
    Ok(())
}

fn play_rounds<B: Backend>(
    controller: &mut SessionController<CrosstermKeySource, TerminalRenderer<B>, SystemClock>,
    corpus: &mut LocalCorpus,
    settings: &Settings,
    mut prompt: Prompt,
) -> Result<Vec<SessionNotice>> {
    let mut notices = Vec::new();
    loop {
        let outcome = controller.run(&prompt);
        notices.extend(outcome.notices);

        let retry = controller.config().retry;
        match await_exit(controller.keys(), &retry) {
            ExitType::Restart => {}
            ExitType::New => {
                prompt = corpus
                    .get(settings.language, settings.mode, settings.words)
                    .context("could not prepare a prompt")?;
            }
            ExitType::Quit => return Ok(notices),
        }
    }
}

fn await_exit<K: KeySource>(keys: &mut K, retry: &RetryPolicy) -> ExitType {
    let mut failures = 0;
    loop {
        match keys.read_key(None) {
            Ok(Some(Keystroke::Printable('r'))) => return ExitType::Restart,
            Ok(Some(Keystroke::Printable('n'))) => return ExitType::New,
            Ok(Some(Keystroke::Printable('q') | Keystroke::Cancel)) => return ExitType::Quit,
            Ok(_) => failures = 0,
            Err(err) if retry.should_retry(&err, failures) => {
                failures += 1;
                tracing::debug!(error = %err, failures, "retrying key read on results screen");
            }
            Err(err) => {
                tracing::warn!(error = %err, "no more input, quitting");
                return ExitType::Quit;
            }
        }
    }
}

/// Runs a restore action once, either through `finish` or when dropped.
struct RestoreGuard<F: FnOnce() -> io::Result<()>> {
    restore: Option<F>,
}

impl<F: FnOnce() -> io::Result<()>> RestoreGuard<F> {
    fn new(restore: F) -> Self {
        Self {
            restore: Some(restore),
        }
    }

    fn finish(mut self) -> io::Result<()> {
        self.restore.take().map_or(Ok(()), |restore| restore())
    }
}

impl<F: FnOnce() -> io::Result<()>> Drop for RestoreGuard<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            if let Err(err) = restore() {
                tracing::warn!(%err, "could not restore the terminal");
            }
        }
    }
}

fn restore_screen() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

/// Raw mode and the alternate screen, undone on every exit path.
fn enter_screen() -> io::Result<RestoreGuard<fn() -> io::Result<()>>> {
    enable_raw_mode()?;
    let guard = RestoreGuard::new(restore_screen as fn() -> io::Result<()>);
    execute!(io::stdout(), EnterAlternateScreen)?;
    Ok(guard)
}

fn show_languages() {
    for lang in LanguageId::ALL {
        println!(
            "{} {:<10} {:<10} {}",
            lang.flag(),
            lang.to_string(),
            lang.name(),
            lang.modes().iter().join(", ")
        );
    }
}

fn delete_saves() -> Result<()> {
    let backend = FileConfigStore::new().load().history_backend;
    let path = AppDirs::history_path(backend)
        .context("could not determine the state directory")?;

    print!("Delete all saved sessions in {}? Type 'yes' to confirm: ", path.display());
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin().lock().read_line(&mut answer)?;

    if answer.trim() != "yes" {
        println!("Nothing deleted.");
        return Ok(());
    }

    let mut store = open_store(backend, &path, Access::ReadWrite)
        .context("could not open the history")?;
    store.truncate().context("could not delete the history")?;
    tracing::info!(path = %path.display(), "history deleted");
    println!("History deleted.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use typyn::runtime::ScriptedKeySource;

    #[test]
    fn restore_guard_runs_on_early_return() {
        let restored = Cell::new(0);
        let setup = |fail: bool| -> io::Result<()> {
            let _guard = RestoreGuard::new(|| {
                restored.set(restored.get() + 1);
                Ok(())
            });
            if fail {
                return Err(io::Error::new(io::ErrorKind::Other, "no terminal"));
            }
            Ok(())
        };

        assert!(setup(true).is_err());
        assert_eq!(restored.get(), 1);
        assert!(setup(false).is_ok());
        assert_eq!(restored.get(), 2);
    }

    #[test]
    fn restore_guard_finishes_once() {
        let restored = Cell::new(0);
        let guard = RestoreGuard::new(|| {
            restored.set(restored.get() + 1);
            Err(io::Error::new(io::ErrorKind::Other, "still raw"))
        });

        assert!(guard.finish().is_err());
        assert_eq!(restored.get(), 1);
    }

    #[test]
    fn await_exit_reads_the_choice() {
        let retry = RetryPolicy::default();
        let mut keys = ScriptedKeySource::new().text("xn");
        assert_eq!(await_exit(&mut keys, &retry), ExitType::New);

        let mut keys = ScriptedKeySource::new().key(Keystroke::Commit).text("r");
        assert_eq!(await_exit(&mut keys, &retry), ExitType::Restart);

        let mut keys = ScriptedKeySource::new().key(Keystroke::Cancel);
        assert_eq!(await_exit(&mut keys, &retry), ExitType::Quit);
    }

    #[test]
    fn await_exit_retries_transient_errors() {
        let mut keys = ScriptedKeySource::new()
            .fail(io::ErrorKind::Interrupted)
            .fail(io::ErrorKind::WouldBlock)
            .text("r");

        assert_eq!(await_exit(&mut keys, &RetryPolicy::new(2)), ExitType::Restart);
    }

    #[test]
    fn await_exit_quits_once_retries_run_out() {
        let mut keys = ScriptedKeySource::new()
            .fail(io::ErrorKind::Interrupted)
            .fail(io::ErrorKind::Interrupted)
            .text("r");
        assert_eq!(await_exit(&mut keys, &RetryPolicy::new(1)), ExitType::Quit);
        assert_eq!(keys.remaining(), 1);

        let mut closed = ScriptedKeySource::new();
        assert_eq!(await_exit(&mut closed, &RetryPolicy::default()), ExitType::Quit);
    }
}

use std::cell::Cell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use assert_matches::assert_matches;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};

use typyn::history::{Access, HistoryStore, JsonLinesStore, MemoryStore};
use typyn::keystroke::Keystroke;
use typyn::language::{CorpusFiles, CorpusMode, CorpusProvider, LanguageId, LocalCorpus};
use typyn::runtime::ScriptedKeySource;
use typyn::scoring::ScoringMode;
use typyn::session::{Clock, SessionConfig, SessionController};
use typyn::target::{Prompt, TargetText};
use typyn::typing::{TypingMode, TypingState};
use typyn::ui::TerminalRenderer;

// Headless runs of the full controller: scripted keys, a TestBackend
// terminal and a clock that only moves when read.
struct ManualClock {
    now: Cell<SystemTime>,
    step: Duration,
}

impl ManualClock {
    fn stepping(step: Duration) -> Self {
        Self {
            now: Cell::new(UNIX_EPOCH + Duration::from_secs(1_714_560_000)),
            step,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        let t = self.now.get();
        self.now.set(t + self.step);
        t
    }
}

type Headless = SessionController<ScriptedKeySource, TerminalRenderer<TestBackend>, ManualClock>;

fn headless(keys: ScriptedKeySource, step: Duration, history: Box<dyn HistoryStore>) -> Headless {
    SessionController::new(
        SessionConfig::default(),
        keys,
        TerminalRenderer::new(Terminal::new(TestBackend::new(100, 30)).unwrap()),
        ManualClock::stepping(step),
        history,
    )
}

fn screen(controller: &mut Headless) -> String {
    controller
        .renderer()
        .terminal()
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect()
}

#[test]
fn headless_word_session_scores_and_shows_results() {
    let mut corpus = LocalCorpus::seeded(CorpusFiles::Embedded, 3);
    let prompt = corpus.get(LanguageId::English, CorpusMode::Words, 5).unwrap();
    let text = prompt.text.line(0).unwrap().to_string();

    // one minute between session start and end
    let mut controller = headless(
        ScriptedKeySource::new().text(&text),
        Duration::from_secs(60),
        Box::new(MemoryStore::default()),
    );
    let outcome = controller.run(&prompt);

    assert_eq!(outcome.state, TypingState::Completed);
    assert_eq!(outcome.report.accuracy, 100.0);
    assert_eq!(outcome.report.matched_words, 5);
    assert_eq!(outcome.report.wpm, 5.0);
    assert!(outcome.notices.is_empty());

    let results = screen(&mut controller);
    assert!(results.contains("5 wpm"));
    assert!(results.contains("1 sessions"));
    assert!(results.contains("(r)estart / (n)ew / (q)uit"));
}

#[test]
fn headless_sentence_set_commits_line_by_line() {
    let prompt = Prompt::new(
        TargetText::new(["hello", "world"]).unwrap(),
        TypingMode::MultiLine,
        ScoringMode::CharRate,
    );
    let keys = ScriptedKeySource::new().text("hello\nworld");
    let mut controller = headless(keys, Duration::from_secs(6), Box::new(MemoryStore::default()));

    let outcome = controller.run(&prompt);

    assert_eq!(outcome.state, TypingState::Completed);
    assert_eq!(outcome.result.committed, vec!["hello", "world"]);
    assert_eq!(outcome.report.correct_chars, 10);
    // 10 correct chars is 2 words in 0.1 minutes
    assert!((outcome.report.wpm - 20.0).abs() < 1e-9);
}

#[test]
fn headless_english_sentences_count_words_across_lines() {
    let mut corpus = LocalCorpus::seeded(CorpusFiles::Embedded, 11);
    let prompt = corpus.get(LanguageId::English, CorpusMode::SentenceSet, 0).unwrap();
    assert_eq!(prompt.typing_mode, TypingMode::MultiLine);
    assert_eq!(prompt.scoring_mode, ScoringMode::WordCount);

    let typed = prompt.text.lines().join("\n");
    let mut controller = headless(
        ScriptedKeySource::new().text(&typed),
        Duration::from_secs(60),
        Box::new(MemoryStore::default()),
    );
    let outcome = controller.run(&prompt);

    let words = prompt.text.words().count();
    assert_eq!(outcome.state, TypingState::Completed);
    assert_eq!(outcome.report.matched_words, words);
    assert_eq!(outcome.report.wpm, words as f64);
    assert_eq!(outcome.report.accuracy, 100.0);
}

#[test]
fn headless_multi_line_word_count_with_a_typo() {
    let prompt = Prompt::new(
        TargetText::new(["the cat", "sat down"]).unwrap(),
        TypingMode::MultiLine,
        ScoringMode::WordCount,
    );
    let keys = ScriptedKeySource::new().text("the cat\nsat dwn\n");
    let mut controller = headless(keys, Duration::from_secs(30), Box::new(MemoryStore::default()));

    let outcome = controller.run(&prompt);

    assert_eq!(outcome.state, TypingState::Completed);
    assert_eq!(outcome.report.matched_words, 3);
    assert_eq!(outcome.report.wpm, 6.0);
    assert_eq!(outcome.report.accuracy, 80.0);
    assert_eq!(outcome.report.max_streak, 7);
}

#[test]
fn headless_cancelled_multi_line_word_count_scores_committed_lines() {
    let prompt = Prompt::new(
        TargetText::new(["the cat", "sat down"]).unwrap(),
        TypingMode::MultiLine,
        ScoringMode::WordCount,
    );
    let keys = ScriptedKeySource::new()
        .text("the cat\nsat d")
        .key(Keystroke::Cancel);
    let mut controller = headless(keys, Duration::from_secs(30), Box::new(MemoryStore::default()));

    let outcome = controller.run(&prompt);

    assert_eq!(outcome.state, TypingState::Cancelled);
    assert_eq!(outcome.result.committed, vec!["the cat"]);
    assert_eq!(outcome.report.matched_words, 2);
    assert_eq!(outcome.report.wpm, 4.0);
    assert_eq!(outcome.report.correct_chars, 7);
    assert!(outcome.notices.is_empty());
}

#[test]
fn headless_multi_line_mistakes_do_not_realign() {
    let prompt = Prompt::new(
        TargetText::new(["hello", "world"]).unwrap(),
        TypingMode::MultiLine,
        ScoringMode::CharRate,
    );
    let keys = ScriptedKeySource::new().text("hxllo\nworld\n");
    let mut controller = headless(keys, Duration::from_secs(1), Box::new(MemoryStore::default()));

    let outcome = controller.run(&prompt);

    assert_eq!(outcome.report.correct_chars, 9);
    assert_eq!(outcome.report.incorrect_chars, 1);
    assert_eq!(outcome.report.max_streak, 5);
    assert_eq!(outcome.report.accuracy, 90.0);
}

#[test]
fn headless_backspace_and_cancel_in_legacy_mode() {
    let prompt = Prompt::new(
        TargetText::single("abc").unwrap(),
        TypingMode::Legacy,
        ScoringMode::WordCount,
    );
    let keys = ScriptedKeySource::new()
        .text("ax")
        .key(Keystroke::Backspace)
        .key(Keystroke::Cancel)
        .text("b")
        .key(Keystroke::Commit);
    let mut controller = headless(keys, Duration::from_secs(1), Box::new(MemoryStore::default()));

    let outcome = controller.run(&prompt);

    assert_eq!(outcome.state, TypingState::Completed);
    assert_eq!(outcome.result.committed, vec!["ab"]);
    assert_eq!(outcome.report.correct_chars, 2);
}

#[test]
fn headless_restart_appends_to_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    let prompt = Prompt::new(
        TargetText::single("go").unwrap(),
        TypingMode::Legacy,
        ScoringMode::WordCount,
    );
    let mut controller = headless(
        ScriptedKeySource::new()
            .text("go")
            .text("gx")
            .key(Keystroke::Commit),
        Duration::from_secs(1),
        Box::new(JsonLinesStore::new(&path, Access::ReadWrite)),
    );

    controller.run(&prompt);
    let second = controller.run(&prompt);
    assert_eq!(second.report.accuracy, 50.0);

    let saved = JsonLinesStore::new(&path, Access::ReadOnly).read_all().unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].accuracy, 100.0);
    assert_eq!(saved[1].accuracy, 50.0);
    assert!(screen(&mut controller).contains("2 sessions"));
}

#[test]
fn headless_closed_input_still_yields_a_result() {
    let prompt = Prompt::new(
        TargetText::single("long text").unwrap(),
        TypingMode::Legacy,
        ScoringMode::WordCount,
    );
    let mut controller = headless(
        ScriptedKeySource::new().text("long"),
        Duration::from_secs(1),
        Box::new(MemoryStore::default()),
    );

    let outcome = controller.run(&prompt);

    assert_eq!(outcome.state, TypingState::Cancelled);
    assert_eq!(outcome.result.committed, vec!["long"]);
    assert_eq!(outcome.notices.len(), 1);
}

#[test]
fn terminal_keys_map_to_keystrokes() {
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
    let letter = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);

    assert_matches!(Keystroke::from(ctrl_c), Keystroke::Cancel);
    assert_matches!(Keystroke::from(enter), Keystroke::Commit);
    assert_matches!(Keystroke::from(letter), Keystroke::Printable('q'));
}

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A key token as seen by the typing state machine.
///
/// Every platform spelling of backspace and enter is folded into a single
/// variant here so the state machine never has to know about terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Printable(char),
    Backspace,
    Commit,
    Cancel,
    Unknown,
}

impl Keystroke {
    /// Classify a raw character as a terminal in cooked or raw mode would send it.
    pub fn from_char(c: char) -> Self {
        match c {
            '\n' | '\r' => Keystroke::Commit,
            '\u{8}' | '\u{7f}' => Keystroke::Backspace,
            '\u{1b}' => Keystroke::Cancel,
            c if c.is_control() => Keystroke::Unknown,
            c => Keystroke::Printable(c),
        }
    }

    /// Expand a string into printable keystrokes, handy for scripted input.
    pub fn sequence(text: &str) -> Vec<Keystroke> {
        text.chars().map(Keystroke::from_char).collect()
    }
}

impl From<KeyEvent> for Keystroke {
    fn from(key: KeyEvent) -> Self {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Keystroke::Cancel,
                KeyCode::Char('h') => Keystroke::Backspace,
                KeyCode::Char('j') | KeyCode::Char('m') => Keystroke::Commit,
                _ => Keystroke::Unknown,
            };
        }

        if key.modifiers.contains(KeyModifiers::ALT) {
            return Keystroke::Unknown;
        }

        match key.code {
            KeyCode::Backspace => Keystroke::Backspace,
            KeyCode::Enter => Keystroke::Commit,
            KeyCode::Esc => Keystroke::Cancel,
            KeyCode::Char(c) => Keystroke::from_char(c),
            _ => Keystroke::Unknown,
        }
    }
}

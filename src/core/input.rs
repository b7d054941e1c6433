/// Keyboard bindings for the table.
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::protocol::Action;

/// Chips wagered by the bet key. Not adjustable from the keyboard.
pub const BET_AMOUNT: u32 = 10;

/// Shown in the help line of the board.
pub const KEY_HELP: &str = " [B] Bet 10 | [F] Fold | [C] Check | [A] Call | [Q] Quit";

/// Maps a key to the action it sends, if any.
pub fn action_for_key(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('b') => Some(Action::Bet(BET_AMOUNT)),
        KeyCode::Char('f') => Some(Action::Fold),
        KeyCode::Char('c') => Some(Action::Check),
        KeyCode::Char('a') => Some(Action::Call),
        _ => None,
    }
}

/// Presses and OS key-repeats count; releases and chords don't.
pub fn is_actionable(key: &KeyEvent) -> bool {
    matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat)
        && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

pub fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

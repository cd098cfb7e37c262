use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action to take in the main event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLoopAction {
    Continue,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    NewChat,
    DeleteSession,
    NextSession,
    PreviousSession,
    CyclePersona,
    ToggleSearch,
    ClearAttachment,
    Insert(char),
    InsertNewline,
    UseSuggestion,
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Ignore,
}

pub fn map_key(key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('n') if ctrl => KeyAction::NewChat,
        KeyCode::Char('d') if ctrl => KeyAction::DeleteSession,
        KeyCode::Char('j') if ctrl => KeyAction::NextSession,
        KeyCode::Char('k') if ctrl => KeyAction::PreviousSession,
        KeyCode::Char('p') if ctrl => KeyAction::CyclePersona,
        KeyCode::Char('g') if ctrl => KeyAction::ToggleSearch,
        KeyCode::Char('a') if ctrl => KeyAction::CursorHome,
        KeyCode::Char('e') if ctrl => KeyAction::CursorEnd,
        KeyCode::Char(_) if ctrl => KeyAction::Ignore,
        KeyCode::Down if alt => KeyAction::NextSession,
        KeyCode::Up if alt => KeyAction::PreviousSession,
        KeyCode::Char(ch) => KeyAction::Insert(ch),
        KeyCode::Enter if shift || alt => KeyAction::InsertNewline,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Tab => KeyAction::UseSuggestion,
        KeyCode::Esc => KeyAction::ClearAttachment,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Delete => KeyAction::Delete,
        KeyCode::Left => KeyAction::CursorLeft,
        KeyCode::Right => KeyAction::CursorRight,
        KeyCode::Home => KeyAction::CursorHome,
        KeyCode::End => KeyAction::CursorEnd,
        KeyCode::Up => KeyAction::ScrollUp,
        KeyCode::Down => KeyAction::ScrollDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        _ => KeyAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn control_chords_map_to_session_actions() {
        let ctrl = KeyModifiers::CONTROL;
        assert_eq!(map_key(key(KeyCode::Char('c'), ctrl)), KeyAction::Quit);
        assert_eq!(map_key(key(KeyCode::Char('n'), ctrl)), KeyAction::NewChat);
        assert_eq!(map_key(key(KeyCode::Char('d'), ctrl)), KeyAction::DeleteSession);
        assert_eq!(map_key(key(KeyCode::Char('p'), ctrl)), KeyAction::CyclePersona);
        assert_eq!(map_key(key(KeyCode::Char('g'), ctrl)), KeyAction::ToggleSearch);
        assert_eq!(map_key(key(KeyCode::Char('j'), ctrl)), KeyAction::NextSession);
        assert_eq!(map_key(key(KeyCode::Char('k'), ctrl)), KeyAction::PreviousSession);
        assert_eq!(map_key(key(KeyCode::Char('z'), ctrl)), KeyAction::Ignore);
    }

    #[test]
    fn alt_arrows_switch_sessions_and_plain_arrows_scroll() {
        assert_eq!(
            map_key(key(KeyCode::Up, KeyModifiers::ALT)),
            KeyAction::PreviousSession
        );
        assert_eq!(
            map_key(key(KeyCode::Down, KeyModifiers::ALT)),
            KeyAction::NextSession
        );
        assert_eq!(map_key(key(KeyCode::Up, KeyModifiers::NONE)), KeyAction::ScrollUp);
    }

    #[test]
    fn printable_keys_insert_text() {
        assert_eq!(
            map_key(key(KeyCode::Char('N'), KeyModifiers::SHIFT)),
            KeyAction::Insert('N')
        );
        assert_eq!(map_key(key(KeyCode::Enter, KeyModifiers::NONE)), KeyAction::Submit);
        assert_eq!(
            map_key(key(KeyCode::Enter, KeyModifiers::SHIFT)),
            KeyAction::InsertNewline
        );
        assert_eq!(
            map_key(key(KeyCode::Enter, KeyModifiers::ALT)),
            KeyAction::InsertNewline
        );
        assert_eq!(map_key(key(KeyCode::Tab, KeyModifiers::NONE)), KeyAction::UseSuggestion);
        assert_eq!(
            map_key(key(KeyCode::Esc, KeyModifiers::NONE)),
            KeyAction::ClearAttachment
        );
    }
}

//! Input handling

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Processed input action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Regular character input
    Char(char),
    /// Enter/submit
    Submit,
    /// Backspace
    Backspace,
    /// Delete
    Delete,
    /// Move cursor left
    Left,
    /// Move cursor right
    Right,
    /// Move up (agent picker)
    Up,
    /// Move down (agent picker)
    Down,
    /// Move to start of line
    Home,
    /// Move to end of line
    End,
    /// Scroll history up
    PageUp,
    /// Scroll history down
    PageDown,
    /// Tab (next suggestion)
    Tab,
    /// Shift+Tab (previous suggestion)
    BackTab,
    /// Escape (leave the contact form)
    Escape,
    /// Ctrl+C (interrupt)
    Interrupt,
    /// Ctrl+D (EOF)
    Eof,
    /// Ctrl+L (clear transcript)
    Clear,
    /// Ctrl+U (clear line)
    ClearLine,
    /// Ctrl+W (delete word)
    DeleteWord,
    /// Bracketed paste
    Paste(String),
    /// Ctrl+Q (quit application)
    Quit,
    /// Ctrl+K (open agent picker)
    AgentSelect,
    /// Ctrl+R (reset conversation)
    Reset,
    /// Unmapped key
    Unknown,
}

/// Convert a crossterm key event to an action
pub fn key_to_action(event: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Action::Interrupt,
            KeyCode::Char('d') => Action::Eof,
            KeyCode::Char('l') => Action::Clear,
            KeyCode::Char('u') => Action::ClearLine,
            KeyCode::Char('w') => Action::DeleteWord,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('k') => Action::AgentSelect,
            KeyCode::Char('r') => Action::Reset,
            _ => Action::Unknown,
        };
    }

    if modifiers.contains(KeyModifiers::ALT) {
        return Action::Unknown;
    }

    match code {
        KeyCode::Char(c) => Action::Char(c),
        KeyCode::Enter => Action::Submit,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => Action::BackTab,
        KeyCode::Tab => Action::Tab,
        KeyCode::BackTab => Action::BackTab,
        KeyCode::Esc => Action::Escape,
        _ => Action::Unknown,
    }
}

/// Convert a crossterm event to an action
pub fn event_to_action(event: Event) -> Option<Action> {
    match event {
        Event::Key(key_event) => Some(key_to_action(key_event)),
        Event::Paste(text) => Some(Action::Paste(text)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_ctrl_k_opens_agent_picker() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('k'), KeyModifiers::CONTROL)),
            Action::AgentSelect
        );
    }

    #[test]
    fn test_tab_and_shift_tab() {
        assert_eq!(key_to_action(key(KeyCode::Tab, KeyModifiers::NONE)), Action::Tab);
        assert_eq!(
            key_to_action(key(KeyCode::Tab, KeyModifiers::SHIFT)),
            Action::BackTab
        );
    }

    #[test]
    fn test_paste_event() {
        assert_eq!(
            event_to_action(Event::Paste("hola".into())),
            Some(Action::Paste("hola".into()))
        );
        assert_eq!(event_to_action(Event::FocusGained), None);
    }
}

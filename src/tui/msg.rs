//! TEA Message Types for the viewer
//!
//! Messages describe what the user did, not how to handle it. They are the
//! only way to change viewer state and are processed by a single update
//! function.

use crossterm::event::{KeyCode, KeyModifiers};

/// All possible messages/actions in the viewer
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    // === Scrolling ===
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    JumpToTop,
    JumpToBottom,
    /// Scroll so the next section starts under the look-ahead cursor
    NextSection,
    PrevSection,

    // === Navigation panel ===
    TogglePanel,

    // === Question blocks ===
    /// Expand or collapse the option listing of the active question
    ToggleOptions,

    // === Modals ===
    ToggleHelp,
    CloseHelp,

    // === Actions ===
    Reload,

    // === Lifecycle ===
    Quit,
    Tick,
    Resize(u16, u16),

    /// No operation (for unhandled keys)
    Noop,
}

/// Convert a key event to a message
///
/// Pure pattern matching; while the help overlay is open only the keys that
/// close it (or quit) do anything.
pub fn key_to_msg(code: KeyCode, modifiers: KeyModifiers, help_open: bool) -> Msg {
    if help_open {
        return match code {
            KeyCode::Esc | KeyCode::Char('?') => Msg::CloseHelp,
            KeyCode::Char('q') => Msg::CloseHelp,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Msg::Quit,
            _ => Msg::Noop,
        };
    }

    match code {
        // Quit
        KeyCode::Char('q') => Msg::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Msg::Quit,

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => Msg::ScrollDown,
        KeyCode::Char('k') | KeyCode::Up => Msg::ScrollUp,
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => Msg::PageDown,
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => Msg::PageUp,
        KeyCode::PageDown => Msg::PageDown,
        KeyCode::PageUp => Msg::PageUp,
        KeyCode::Char('g') | KeyCode::Home => Msg::JumpToTop,
        KeyCode::Char('G') | KeyCode::End => Msg::JumpToBottom,
        KeyCode::Char(']') | KeyCode::Char('n') => Msg::NextSection,
        KeyCode::Char('[') | KeyCode::Char('p') => Msg::PrevSection,

        // Panel
        KeyCode::Char('t') | KeyCode::Tab => Msg::TogglePanel,

        // Question blocks
        KeyCode::Enter | KeyCode::Char(' ') => Msg::ToggleOptions,

        // Modals
        KeyCode::Char('?') => Msg::ToggleHelp,
        KeyCode::Esc => Msg::CloseHelp,

        // Actions
        KeyCode::Char('r') => Msg::Reload,

        _ => Msg::Noop,
    }
}

/// Check if a message moves the reading position
pub fn is_scroll(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::ScrollDown
            | Msg::ScrollUp
            | Msg::PageDown
            | Msg::PageUp
            | Msg::JumpToTop
            | Msg::JumpToBottom
            | Msg::NextSection
            | Msg::PrevSection
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_to_msg_scrolling() {
        assert_eq!(key_to_msg(KeyCode::Char('j'), KeyModifiers::NONE, false), Msg::ScrollDown);
        assert_eq!(key_to_msg(KeyCode::Down, KeyModifiers::NONE, false), Msg::ScrollDown);
        assert_eq!(key_to_msg(KeyCode::Char('k'), KeyModifiers::NONE, false), Msg::ScrollUp);
        assert_eq!(
            key_to_msg(KeyCode::Char('d'), KeyModifiers::CONTROL, false),
            Msg::PageDown
        );
        assert_eq!(key_to_msg(KeyCode::Char('u'), KeyModifiers::CONTROL, false), Msg::PageUp);
        assert_eq!(key_to_msg(KeyCode::PageDown, KeyModifiers::NONE, false), Msg::PageDown);
        assert_eq!(key_to_msg(KeyCode::Char('g'), KeyModifiers::NONE, false), Msg::JumpToTop);
        assert_eq!(key_to_msg(KeyCode::Char('G'), KeyModifiers::NONE, false), Msg::JumpToBottom);
    }

    #[test]
    fn test_key_to_msg_sections_and_panel() {
        assert_eq!(key_to_msg(KeyCode::Char(']'), KeyModifiers::NONE, false), Msg::NextSection);
        assert_eq!(key_to_msg(KeyCode::Char('['), KeyModifiers::NONE, false), Msg::PrevSection);
        assert_eq!(key_to_msg(KeyCode::Tab, KeyModifiers::NONE, false), Msg::TogglePanel);
        assert_eq!(key_to_msg(KeyCode::Char('t'), KeyModifiers::NONE, false), Msg::TogglePanel);
        assert_eq!(key_to_msg(KeyCode::Enter, KeyModifiers::NONE, false), Msg::ToggleOptions);
        assert_eq!(key_to_msg(KeyCode::Char(' '), KeyModifiers::NONE, false), Msg::ToggleOptions);
    }

    #[test]
    fn test_key_to_msg_lifecycle() {
        assert_eq!(key_to_msg(KeyCode::Char('q'), KeyModifiers::NONE, false), Msg::Quit);
        assert_eq!(key_to_msg(KeyCode::Char('c'), KeyModifiers::CONTROL, false), Msg::Quit);
        assert_eq!(key_to_msg(KeyCode::Char('r'), KeyModifiers::NONE, false), Msg::Reload);
        assert_eq!(key_to_msg(KeyCode::Char('?'), KeyModifiers::NONE, false), Msg::ToggleHelp);
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        assert_eq!(key_to_msg(KeyCode::Char('j'), KeyModifiers::NONE, true), Msg::Noop);
        assert_eq!(key_to_msg(KeyCode::Char('q'), KeyModifiers::NONE, true), Msg::CloseHelp);
        assert_eq!(key_to_msg(KeyCode::Esc, KeyModifiers::NONE, true), Msg::CloseHelp);
        assert_eq!(key_to_msg(KeyCode::Char('c'), KeyModifiers::CONTROL, true), Msg::Quit);
    }

    #[test]
    fn test_key_to_msg_unhandled() {
        assert_eq!(key_to_msg(KeyCode::Char('z'), KeyModifiers::NONE, false), Msg::Noop);
    }

    #[test]
    fn test_is_scroll() {
        assert!(is_scroll(&Msg::NextSection));
        assert!(is_scroll(&Msg::PageUp));
        assert!(!is_scroll(&Msg::TogglePanel));
        assert!(!is_scroll(&Msg::Quit));
    }
}

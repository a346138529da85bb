//! Event handling for the viewer
//!
//! Translates crossterm events into messages for the app.

use crossterm::event::{Event, KeyEvent, KeyEventKind};

use super::app::App;
use super::msg::{key_to_msg, Msg};

/// Handle a key event, returns true if the viewer should quit
pub fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    let msg = key_to_msg(key.code, key.modifiers, app.model.help_open);
    app.dispatch(msg)
}

/// Handle any terminal event, returns true if the viewer should quit
pub fn handle_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Mouse(mouse) => app.handle_mouse(mouse),
        Event::Resize(width, height) => app.dispatch(Msg::Resize(width, height)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn app(dir: &tempfile::TempDir) -> App {
        let input = dir.path().join("survey.json");
        std::fs::write(
            &input,
            r#"{ "results": { "stats": [{ "question": "Q", "answer": { "a": 1 }, "summary": "" }] } }"#,
        )
        .unwrap();
        App::new(input, Config::default(), 100, 12).unwrap()
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_quit_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        assert!(!handle_event(&mut app, press(KeyCode::Char('j'))));
        assert!(handle_event(&mut app, press(KeyCode::Char('q'))));
    }

    #[test]
    fn test_help_overlay_captures_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        handle_event(&mut app, press(KeyCode::Char('?')));
        assert!(app.model.help_open);
        // 'q' closes the overlay instead of quitting
        assert!(!handle_event(&mut app, press(KeyCode::Char('q'))));
        assert!(!app.model.help_open);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(!handle_event(&mut app, Event::Key(release)));
    }

    #[test]
    fn test_resize_event() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        handle_event(&mut app, Event::Resize(80, 40));
        assert_eq!(app.viewport_height, 40);
    }
}

//! UI rendering for the viewer

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app::{App, TOC_WIDTH};

/// Main draw function - orchestrates all rendering
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, content, footer
    let main_layout = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(3),    // Content
        Constraint::Length(1), // Footer/status
    ])
    .split(area);

    draw_header(frame, app, main_layout[0]);

    if app.spy.state().is_panel_visible {
        let content_layout =
            Layout::horizontal([Constraint::Length(TOC_WIDTH), Constraint::Min(1)])
                .split(main_layout[1]);
        draw_toc(frame, app, content_layout[0]);
        draw_report(frame, app, content_layout[1]);
    } else {
        draw_report(frame, app, main_layout[1]);
    }

    draw_footer(frame, app, main_layout[2]);

    if app.model.help_open {
        draw_help_overlay(frame, area);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let refresh_indicator = if app.refresh_shown_at.is_some() {
        " [Updated]"
    } else {
        ""
    };

    let active = app
        .active_toc_index()
        .and_then(|i| app.report.toc.get(i))
        .map(|e| e.label.as_str())
        .unwrap_or("");

    let header_text = format!(
        " {} │ {}{}",
        app.report.title, active, refresh_indicator
    );

    let header =
        Paragraph::new(header_text).style(Style::default().bg(Color::Blue).fg(Color::White).bold());

    frame.render_widget(header, area);
}

fn draw_toc(frame: &mut Frame, app: &App, area: Rect) {
    let labels = app.report.labels();
    let items: Vec<ListItem> = app
        .report
        .toc
        .iter()
        .map(|entry| {
            let indent = "  ".repeat(usize::from(entry.depth));
            let style = if entry.depth == 0 {
                Style::default().bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(Line::styled(format!("{}{}", indent, entry.label), style))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" {} ", labels.toc_heading))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Green).bold())
        .highlight_symbol("▌");

    let mut state = ListState::default().with_selected(app.active_toc_index());
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_report(frame: &mut Frame, app: &App, area: Rect) {
    let offset = app.model.scroll_offset;
    let scroll_info = format!(
        " {}/{} ",
        (offset + 1).min(app.model.content_lines.max(1)),
        app.model.content_lines
    );

    let report = Paragraph::new(app.layout.lines.clone())
        .block(
            Block::default()
                .title_bottom(Line::from(scroll_info).right_aligned())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));

    frame.render_widget(report, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keybinds = "j/k:scroll  n/p:section  Enter:options  t:contents  r:reload  ?:help  q:quit";

    // Show status message if present, otherwise show keybinds
    let footer_text = if let Some((ref msg, _)) = app.status_message {
        msg.clone()
    } else {
        keybinds.to_string()
    };

    let footer = Paragraph::new(format!(" {}", footer_text))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(footer, area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    // Center the help popup
    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 22.min(area.height.saturating_sub(4));

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    };

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let help_text = r#"
  Reading
  ─────────────────────────────────
  j/k, ↑/↓       Scroll one line
  Ctrl+d/u       Page down/up
  g/G            Jump to top/bottom
  n/p, ]/[       Next/previous section
  Mouse wheel    Scroll

  Report
  ─────────────────────────────────
  t, Tab         Show/hide contents
  Enter, Space   Show/hide answer options
  r              Reload the survey file
  q              Quit

  Press ? or Esc to close
"#;

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(help, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::report::Locale;
    use crate::tui::msg::Msg;
    use ratatui::backend::TestBackend;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(app.viewport_width, app.viewport_height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app(dir: &tempfile::TempDir) -> App {
        let input = dir.path().join("survey.json");
        std::fs::write(
            &input,
            r#"{ "results": { "raw_survey": { "topic": "Tea" },
                 "stats": [{ "question": "Favourite", "answer": { "a": 1 }, "summary": "" }] } }"#,
        )
        .unwrap();
        // English labels keep every glyph one cell wide
        let mut config = Config::default();
        config.report.locale = Locale::En;
        App::new(input, config, 100, 24).unwrap()
    }

    #[test]
    fn test_draw_shows_contents_panel() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let screen = render(&app);
        assert!(screen.contains(" Contents "));
        assert!(screen.contains("Favourite"));
    }

    #[test]
    fn test_draw_without_panel() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.dispatch(Msg::TogglePanel);
        let screen = render(&app);
        assert!(!screen.contains(" Contents "));
    }

    #[test]
    fn test_draw_help_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.dispatch(Msg::ToggleHelp);
        let screen = render(&app);
        assert!(screen.contains("Press ? or Esc to close"));
    }

    #[test]
    fn test_status_replaces_keybinds() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.set_status("Last section".to_string());
        let screen = render(&app);
        assert!(screen.contains("Last section"));
        assert!(!screen.contains("?:help"));
    }
}

//! Terminal viewer for survey reports
//!
//! Renders the assembled report in the terminal with a contents panel that
//! follows the reading position.
//! Features:
//! - vim-style scrolling and section jumps
//! - collapsible answer options per question
//! - auto-reload when the survey file changes

pub mod app;
pub mod events;
pub mod layout; // Wrapped lines and section registry
pub mod markdown;
pub mod msg; // TEA message types (what happened)
pub mod state; // Pure scroll arithmetic (functional core)
pub mod ui;
pub mod update; // TEA update function (state transitions)

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::prelude::*;

use crate::config::Config;
use app::App;
use events::handle_event;

/// Run the viewer on a survey file
pub fn run(input: PathBuf, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app, ensuring cleanup happens even on error
    let result = run_app_inner(&mut terminal, input, config);

    // Restore terminal - this MUST run even if app fails
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    );
    let _ = terminal.show_cursor();

    result
}

fn run_app_inner<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    input: PathBuf,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = crossterm::terminal::size()?;
    let mut app = App::new(input, config, width, height)?;

    // Editors that save by rename replace the inode, so watch the directory
    let (tx, rx) = mpsc::channel();
    let input_for_watcher = app.input_path().to_path_buf();
    let watch_dir = match input_for_watcher.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                if touches_input(&event, &input_for_watcher) {
                    let _ = tx.send(());
                }
            }
        },
        notify::Config::default(),
    )?;

    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("watching {} for {}", watch_dir.display(), app.input_path().display());

    run_event_loop(terminal, &mut app, rx)
}

fn run_event_loop<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    file_change_rx: mpsc::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Handle input with timeout
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if poll(timeout)? && handle_event(app, read()?) {
            return Ok(()); // Quit signal
        }

        // Editors often emit several events per save; reload once
        if file_change_rx.try_recv().is_ok() {
            while file_change_rx.try_recv().is_ok() {}
            app.reload();
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }
}

/// A write to, or re-creation of, the input file
fn touches_input(event: &notify::Event, input: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = input.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}

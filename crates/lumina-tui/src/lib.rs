mod app;
mod clipboard;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lumina_bus::EventBus;
use lumina_core::Studio;
use lumina_schema::StudioEvent;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

pub use app::{App, Focus, TuiOptions};
pub use clipboard::{system_clipboard, SystemClipboard};

/// Runs the interactive studio until the user quits. `studio` should publish
/// to `bus` so the activity panel sees its events.
pub async fn run_tui(studio: Studio, bus: &EventBus, options: TuiOptions) -> Result<()> {
    let events = bus.subscribe_all().await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(studio, options);
    let run_result = run_app(&mut terminal, &mut app, events).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut events: mpsc::Receiver<StudioEvent>,
) -> Result<()> {
    loop {
        app.pump().await;
        while let Ok(event) = events.try_recv() {
            app.handle_studio_event(event);
        }

        terminal.draw(|frame| ui::ui(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code).await;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

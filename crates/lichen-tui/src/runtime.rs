use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use std::time::Duration;

use crate::input::handle_key;
use crate::render::render;
use crate::ui::{App, Tui};

pub(crate) async fn run_app(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut event_stream = EventStream::new();

    // Tick drives worker-reply polling and keeps the status bar fresh.
    let mut tick_interval = tokio::time::interval(Duration::from_millis(50));

    while app.running {
        terminal.draw(|f| render(f, app))?;

        tokio::select! {
            maybe_event = event_stream.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        if app.pending_quit {
                            app.quit();
                        } else {
                            // First Ctrl+C - footer shows the confirmation hint
                            app.pending_quit = true;
                        }
                    } else {
                        app.pending_quit = false;
                        handle_key(app, key)?;
                    }
                }
            }

            _ = tick_interval.tick() => {
                app.tick();
                app.check_for_worker_replies();
            }
        }
    }
    Ok(())
}

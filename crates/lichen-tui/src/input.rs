use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::ui::{App, Focus};

pub(crate) fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Enter => {
            if app.focus == Focus::Tree {
                app.toggle_expand();
            }
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Tree => Focus::Signals,
                Focus::Signals => Focus::Tree,
            };
        }
        KeyCode::Char('r') => {
            if app.focus == Focus::Signals {
                app.toggle_resolved_highlighted();
            }
        }
        KeyCode::Char('a') => {
            if app.focus == Focus::Signals {
                app.add_highlighted_to_manual();
            }
        }
        KeyCode::Char('s') => {
            app.save();
            app.set_status("saved");
        }
        _ => {}
    }
    Ok(())
}

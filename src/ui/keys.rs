//! Key dispatch.
//!
//! An open error overlay swallows the next key: `r` retries, anything else
//! dismisses. Text fields take printable keys; elsewhere single letters are
//! commands.

use super::app::{App, Command, Focus};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn handle_key(app: &mut App, key: KeyEvent) -> Vec<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Vec::new();
    }

    if app.dismiss_error() {
        if key.code == KeyCode::Char('r') {
            return app.retry().into_iter().collect();
        }
        return Vec::new();
    }

    app.status = None;

    if ctrl && key.code == KeyCode::Char('g') {
        return app.submit().into_iter().collect();
    }
    match key.code {
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return Vec::new();
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return Vec::new();
        }
        _ => {}
    }

    if app.focus.is_text_input() {
        handle_text(app, key);
        return Vec::new();
    }

    let command = match (app.focus, key.code) {
        (_, KeyCode::Char('q')) => {
            app.should_quit = true;
            None
        }
        (_, KeyCode::Char('g')) => app.submit(),
        (_, KeyCode::Char('y')) => {
            let copy = app.copy_result();
            if copy.is_none() {
                app.status = Some("Nothing to copy yet".to_string());
            }
            copy
        }

        (Focus::Repos, KeyCode::Up | KeyCode::Char('k')) => {
            app.move_repo_cursor(-1);
            None
        }
        (Focus::Repos, KeyCode::Down | KeyCode::Char('j')) => {
            app.move_repo_cursor(1);
            None
        }
        (Focus::Repos, KeyCode::Enter | KeyCode::Char(' ')) => {
            app.select_highlighted_repo();
            None
        }

        (Focus::Priority, KeyCode::Enter | KeyCode::Char('p')) => app.toggle_picker(),
        (Focus::Priority, KeyCode::Char('m')) if app.picker.open => app.load_more(),
        (Focus::Priority, KeyCode::Up | KeyCode::Char('k')) => {
            app.move_picker_cursor(-1);
            None
        }
        (Focus::Priority, KeyCode::Down | KeyCode::Char('j')) => {
            app.move_picker_cursor(1);
            None
        }
        (Focus::Priority, KeyCode::Char(' ')) if app.picker.open => {
            app.toggle_highlighted_priority();
            None
        }

        (Focus::Result, KeyCode::Up | KeyCode::Char('k')) => {
            app.scroll_result(-1);
            None
        }
        (Focus::Result, KeyCode::Down | KeyCode::Char('j')) => {
            app.scroll_result(1);
            None
        }
        (Focus::Result, KeyCode::PageUp) => {
            app.scroll_result(-10);
            None
        }
        (Focus::Result, KeyCode::PageDown) => {
            app.scroll_result(10);
            None
        }
        _ => None,
    };

    command.into_iter().collect()
}

/// Editing keys for the focused text field
fn handle_text(app: &mut App, key: KeyEvent) {
    let focus = app.focus;
    if key.code == KeyCode::Esc {
        app.focus = Focus::Repos;
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let Some(field) = app.active_text_mut() else {
        return;
    };

    match key.code {
        KeyCode::Char('u') if ctrl => field.clear(),
        KeyCode::Char(c) if !ctrl => {
            // Date fields only take YYYY-MM-DD
            let is_date = matches!(focus, Focus::StartDate | Focus::EndDate);
            if !is_date || ((c.is_ascii_digit() || c == '-') && field.len() < 10) {
                field.push(c);
            }
        }
        KeyCode::Backspace => {
            field.pop();
        }
        KeyCode::Enter if focus == Focus::Prompt => field.push('\n'),
        _ => {}
    }
}

//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Overlays get the key first; otherwise global
//! keys are checked before the current tab's own keys.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use tarotdesk_core::models::ReadingCategory;
use tarotdesk_core::readings::ReadingStep;

use crate::app::{App, AppState, Tab, PAGE_SCROLL_SIZE};
use crate::forms::can_add_field_char;

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::AuthRequired => return handle_auth_input(app, key).await,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete().await,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::EditingForm => {
            handle_form_input(app, key).await;
            return Ok(false);
        }
        AppState::LookingUp => {
            handle_lookup_input(app, key);
            return Ok(false);
        }
        AppState::ViewingLesson => {
            handle_lesson_input(app, key).await;
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char(c @ '0'..='9') => {
            if let Some(tab) = Tab::from_digit(c) {
                app.switch_tab(tab);
            }
        }
        KeyCode::Left => app.switch_tab(app.current_tab.prev()),
        KeyCode::Right => app.switch_tab(app.current_tab.next()),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Char('u') => {
            if !app.refreshing {
                app.refresh_all_background();
            }
        }
        KeyCode::Char('/') => {
            if app.current_tab != Tab::Dashboard {
                app.state = AppState::Searching;
                app.search_query.clear();
            }
        }
        KeyCode::Char('L') => app.open_lookup(),
        KeyCode::Esc => {
            // Error banner first, then search, then focus
            if app.error_banner.is_some() {
                app.error_banner = None;
            } else {
                app.search_query.clear();
                app.status_message = None;
                app.focus = crate::app::Focus::List;
            }
        }
        KeyCode::Char('n') => app.open_new_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        _ => handle_tab_input(app, key).await,
    }

    Ok(false)
}

/// Keys that only mean something on one tab
async fn handle_tab_input(app: &mut App, key: KeyEvent) {
    match (app.current_tab, key.code) {
        (Tab::Members, KeyCode::Char('a')) => app.toggle_active().await,
        (Tab::Members, KeyCode::Char('h')) => app.toggle_member_history().await,
        (Tab::Members, KeyCode::Char('t')) => app.cycle_member_tier(),
        (Tab::Members, KeyCode::Char('s')) => app.cycle_member_status(),
        (Tab::Members, KeyCode::Enter) => app.open_edit_form(),

        (Tab::Bookings, KeyCode::Enter) => app.advance_booking_status().await,
        (Tab::Bookings, KeyCode::Char('x')) => app.cancel_booking().await,
        (Tab::Bookings, KeyCode::Char('f')) => app.cycle_booking_status(),
        (Tab::Bookings, KeyCode::Char('t')) => app.cycle_booking_tier(),

        (Tab::Courses, KeyCode::Char('p')) => app.toggle_published().await,
        (Tab::Courses, KeyCode::Char('g')) => app.open_lesson_viewer(),
        (Tab::Courses, KeyCode::Enter) => app.toggle_focus(),

        (Tab::Meditations | Tab::Resources, KeyCode::Char('p')) => app.toggle_published().await,
        (Tab::Meditations | Tab::Resources, KeyCode::Char('f')) => app.toggle_featured().await,
        (Tab::Resources, KeyCode::Char('c')) => app.cycle_resource_category(),

        (Tab::Announcements, KeyCode::Char('p')) => app.toggle_published().await,
        (Tab::Announcements, KeyCode::Char('s')) => app.mark_announcement_sent().await,

        (Tab::Messages, KeyCode::Char('c')) => app.set_current_message().await,

        (Tab::Products, KeyCode::Char('a')) => app.toggle_active().await,
        (Tab::Products, KeyCode::Char('s')) => app.cycle_product_status(),

        (Tab::Meditations | Tab::Resources | Tab::Announcements | Tab::Readings | Tab::Messages | Tab::Products, KeyCode::Enter) => {
            app.open_edit_form()
        }
        _ => {}
    }
}

async fn handle_auth_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('r') | KeyCode::Enter => {
            app.retry_authentication().await;
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        _ => {}
    }
    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            // Keep search query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

async fn handle_form_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Enter {
        app.submit_form().await;
        return;
    }
    if key.code == KeyCode::Esc {
        app.cancel_form();
        return;
    }

    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return;
    };
    let text_field = form.focused().is_some_and(|f| f.is_editable_text());

    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left if !text_field => form.cycle_focused(false),
        KeyCode::Right if !text_field => form.cycle_focused(true),
        KeyCode::Char(' ') if !text_field => form.cycle_focused(true),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}

fn handle_lookup_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.state = AppState::Normal;
        return;
    }

    let step = app.lookup.step().clone();
    match step {
        ReadingStep::Initial => match key.code {
            KeyCode::Char('l') => app.lookup.select_category(ReadingCategory::LoveRelationships),
            KeyCode::Char('g') => app.lookup.select_category(ReadingCategory::General),
            _ => {}
        },
        ReadingStep::NumberSelection { .. } => match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => app.push_lookup_digit(c),
            KeyCode::Backspace => {
                app.lookup_input.pop();
            }
            KeyCode::Enter => app.submit_lookup(),
            KeyCode::Char('c') => {
                app.lookup.change_category();
                app.lookup_input.clear();
                app.lookup_error = None;
            }
            _ => {}
        },
        ReadingStep::VideoResult { .. } | ReadingStep::ComingSoon { .. } => {
            if matches!(key.code, KeyCode::Char('a') | KeyCode::Enter) {
                app.lookup.choose_again();
            }
        }
    }
}

async fn handle_lesson_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Enter => app.submit_lesson_query().await,
        KeyCode::Left => app.step_lesson(false).await,
        KeyCode::Right => app.step_lesson(true).await,
        KeyCode::Backspace => {
            app.lesson_viewer.query.pop();
        }
        KeyCode::Char(c) => {
            if can_add_field_char(app.lesson_viewer.query.chars().count(), c) {
                app.lesson_viewer.query.push(c);
            }
        }
        _ => {}
    }
}

use std::process::Stdio;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use log::{info, warn};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use crate::app::{App, View};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::PortfolioLoaded(data) => app.portfolio_loaded(data),
        AppEvent::ChatSettled(result) => app.chat_settled(result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any view
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.view {
        View::Home => handle_home_key(app, key),
        View::Chat => handle_chat_key(app, key),
    }
}

fn handle_home_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Section tabs
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_section(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.prev_section(),

        KeyCode::Down | KeyCode::Char('j') => app.home_nav_down(),
        KeyCode::Up | KeyCode::Char('k') => app.home_nav_up(),

        // Ask AI about the highlighted project, experience or skill
        KeyCode::Enter => app.ask_about_selection(),

        // Open the assistant without a question
        KeyCode::Char('a') | KeyCode::Char('i') => app.navigate(View::Chat),

        KeyCode::Char('o') => {
            if let Some(url) = app.selected_report_url() {
                open_url(&url);
            }
        }

        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.navigate(View::Home),

        KeyCode::Char('n') if ctrl => app.start_new_chat(),

        // Ctrl+J is what most terminals send for a bare newline
        KeyCode::Char('j') if ctrl => app.session.insert_newline(),

        KeyCode::Enter => {
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                app.session.insert_newline();
            } else if app.session.draft().trim().is_empty() && app.suggestions_visible() {
                app.send_selected_suggestion();
            } else {
                app.send(None);
            }
        }

        KeyCode::Up if suggestion_mode(app) => app.suggestion_nav_up(),
        KeyCode::Down if suggestion_mode(app) => app.suggestion_nav_down(),

        KeyCode::Up | KeyCode::PageUp => app.scroll_chat_up(3),
        KeyCode::Down | KeyCode::PageDown => app.scroll_chat_down(3),

        KeyCode::Backspace => app.session.backspace(),
        KeyCode::Delete => app.session.delete(),
        KeyCode::Left => app.session.cursor_left(),
        KeyCode::Right => app.session.cursor_right(),
        KeyCode::Home => app.session.cursor_home(),
        KeyCode::End => app.session.cursor_end(),

        KeyCode::Char(c) if !ctrl => app.session.insert_char(c),

        _ => {}
    }
}

/// Arrow keys pick a suggested question while the chat is empty
fn suggestion_mode(app: &App) -> bool {
    app.suggestions_visible() && app.session.draft().is_empty()
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_list = app.list_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match (mouse.kind, app.view) {
        (MouseEventKind::ScrollDown, View::Home) if in_list => app.home_nav_down(),
        (MouseEventKind::ScrollUp, View::Home) if in_list => app.home_nav_up(),
        (MouseEventKind::ScrollDown, View::Chat) if in_chat => app.scroll_chat_down(3),
        (MouseEventKind::ScrollUp, View::Chat) if in_chat => app.scroll_chat_up(3),
        _ => {}
    }
}

/// Hand a URL to the platform opener (reports open in the browser or a PDF viewer)
fn open_url(url: &str) {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = std::process::Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        std::process::Command::new("xdg-open")
    };
    command.arg(url);

    match spawn_reaped(command) {
        Ok(_) => info!("Opened {}", url),
        Err(e) => warn!("Could not open {}: {}", url, e),
    }
}

/// Run `command` in the background and wait on it so the child is reaped
fn spawn_reaped(command: std::process::Command) -> std::io::Result<JoinHandle<()>> {
    let mut command = tokio::process::Command::from(command);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = command.spawn()?;
    Ok(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if !status.success() => warn!("Opener exited with {}", status),
            Ok(_) => {}
            Err(e) => warn!("Could not wait for opener: {}", e),
        }
    }))
}

use std::io::Stdout;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use tracing::debug;

use crate::app::{App, InputMode};
use crate::audio::Mixer;
use crate::errors::AppError;
use crate::ui;

use super::control::ControlCmd;
use super::poller::ProgressPoller;
use super::session::Session;

/// Upper bound on one input wait, so download results are picked up promptly
/// even with a long tick period.
const INPUT_WAIT: Duration = Duration::from_millis(100);

/// Main terminal event loop: draw, wait for input until the next tick is due,
/// dispatch commands, run ticks. Returns when the user quits.
pub fn run<M: Mixer>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    session: &mut Session<M>,
) -> Result<(), AppError> {
    let tick = Duration::from_millis(session.settings().playback.tick_ms);
    let mut poller = ProgressPoller::start(tick, Instant::now());
    debug!(period = ?poller.period(), "progress poller started");
    let result = drive(terminal, session, &mut poller);
    poller.cancel();
    debug!(active = poller.is_active(), "progress poller cancelled");
    session.shutdown();
    result
}

fn drive<M: Mixer>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    session: &mut Session<M>,
    poller: &mut ProgressPoller,
) -> Result<(), AppError> {
    let seek_step = f64::from(session.settings().playback.seek_step_percent) / 100.0;

    loop {
        session.poll_downloads();

        terminal.draw(|f| {
            let settings = session.settings();
            ui::draw(f, session.app(), &settings.ui, settings.playback.seek_step_percent)
        })?;

        let wait = poller
            .time_until_due(Instant::now())
            .map_or(INPUT_WAIT, |d| d.min(INPUT_WAIT));

        if event::poll(wait)? {
            let cmd = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    key_to_cmd(key, session.app(), seek_step)
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    let gauge = ui::layout(Rect::new(0, 0, size.width, size.height)).progress;
                    mouse_to_cmd(mouse, gauge, session.app())
                }
                Event::Paste(text) if session.app().mode == InputMode::Url => {
                    Some(ControlCmd::UrlPaste(text))
                }
                _ => None,
            };
            if let Some(cmd) = cmd {
                debug!(?cmd, "command");
                if session.handle(cmd) {
                    return Ok(());
                }
            }
        }

        if poller.due(Instant::now()) {
            session.tick();
        }
    }
}

/// Decode a key press for the current UI mode.
pub fn key_to_cmd(key: KeyEvent, app: &App, seek_step: f64) -> Option<ControlCmd> {
    if app.notice.is_some() {
        return Some(ControlCmd::DismissNotice);
    }

    if app.mode == InputMode::Url {
        return match key.code {
            KeyCode::Esc => Some(ControlCmd::UrlCancel),
            KeyCode::Enter => Some(ControlCmd::UrlSubmit),
            KeyCode::Backspace => Some(ControlCmd::UrlBackspace),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(ControlCmd::UrlChar(c))
            }
            _ => None,
        };
    }

    let dragging = app.seek_preview.is_some();
    match key.code {
        KeyCode::Char('q') => Some(ControlCmd::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ControlCmd::Quit)
        }
        KeyCode::Char('j') | KeyCode::Down => Some(ControlCmd::CursorDown),
        KeyCode::Char('k') | KeyCode::Up => Some(ControlCmd::CursorUp),
        KeyCode::Enter if dragging => Some(ControlCmd::SeekCommit),
        KeyCode::Esc if dragging => Some(ControlCmd::SeekCancel),
        KeyCode::Enter => Some(ControlCmd::PlayCursor),
        KeyCode::Char(' ') | KeyCode::Char('p') => Some(ControlCmd::PlayPause),
        KeyCode::Char('s') => Some(ControlCmd::Stop),
        KeyCode::Char('l') => Some(ControlCmd::Next),
        KeyCode::Char('h') => Some(ControlCmd::Prev),
        KeyCode::Char(']') | KeyCode::Right => Some(ControlCmd::SeekNudge(seek_step)),
        KeyCode::Char('[') | KeyCode::Left => Some(ControlCmd::SeekNudge(-seek_step)),
        KeyCode::Char(c @ '0'..='9') => c
            .to_digit(10)
            .map(|d| ControlCmd::SeekTo(f64::from(d) / 10.0)),
        KeyCode::Char('d') => Some(ControlCmd::OpenUrlInput),
        KeyCode::Char('r') => Some(ControlCmd::Rescan),
        _ => None,
    }
}

/// Left button on the gauge grabs the seek control, dragging previews and
/// releasing commits.
pub fn mouse_to_cmd(mouse: MouseEvent, gauge: Rect, app: &App) -> Option<ControlCmd> {
    if app.notice.is_some() || app.mode == InputMode::Url {
        return None;
    }
    let dragging = app.seek_preview.is_some();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if ui::hits(gauge, mouse.column, mouse.row) => {
            ui::gauge_fraction_at(gauge, mouse.column).map(ControlCmd::SeekPreview)
        }
        MouseEventKind::Drag(MouseButton::Left) if dragging => {
            ui::gauge_fraction_at(gauge, mouse.column).map(ControlCmd::SeekPreview)
        }
        MouseEventKind::Up(MouseButton::Left) if dragging => Some(ControlCmd::SeekCommit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Notice;
    use std::path::PathBuf;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn app() -> App {
        App::new(Vec::new(), PathBuf::from("/m"))
    }

    #[test]
    fn browse_keys_map_to_transport_commands() {
        let app = app();
        assert_eq!(key_to_cmd(key(KeyCode::Char('q')), &app, 0.05), Some(ControlCmd::Quit));
        assert_eq!(key_to_cmd(key(KeyCode::Enter), &app, 0.05), Some(ControlCmd::PlayCursor));
        assert_eq!(key_to_cmd(key(KeyCode::Char(' ')), &app, 0.05), Some(ControlCmd::PlayPause));
        assert_eq!(key_to_cmd(key(KeyCode::Char('l')), &app, 0.05), Some(ControlCmd::Next));
        assert_eq!(key_to_cmd(key(KeyCode::Char('h')), &app, 0.05), Some(ControlCmd::Prev));
        assert_eq!(key_to_cmd(key(KeyCode::Char('s')), &app, 0.05), Some(ControlCmd::Stop));
        assert_eq!(
            key_to_cmd(key(KeyCode::Char('[')), &app, 0.05),
            Some(ControlCmd::SeekNudge(-0.05))
        );
        assert_eq!(
            key_to_cmd(key(KeyCode::Char('7')), &app, 0.05),
            Some(ControlCmd::SeekTo(0.7))
        );
        assert_eq!(key_to_cmd(key(KeyCode::Char('x')), &app, 0.05), None);
    }

    #[test]
    fn enter_and_esc_finish_a_keyboard_seek() {
        let mut app = app();
        app.seek_preview = Some(0.3);
        assert_eq!(key_to_cmd(key(KeyCode::Enter), &app, 0.05), Some(ControlCmd::SeekCommit));
        assert_eq!(key_to_cmd(key(KeyCode::Esc), &app, 0.05), Some(ControlCmd::SeekCancel));
    }

    #[test]
    fn url_mode_captures_typing() {
        let mut app = app();
        app.enter_url_mode();
        assert_eq!(
            key_to_cmd(key(KeyCode::Char('q')), &app, 0.05),
            Some(ControlCmd::UrlChar('q'))
        );
        assert_eq!(key_to_cmd(key(KeyCode::Enter), &app, 0.05), Some(ControlCmd::UrlSubmit));
        assert_eq!(key_to_cmd(key(KeyCode::Esc), &app, 0.05), Some(ControlCmd::UrlCancel));
        assert_eq!(
            key_to_cmd(key(KeyCode::Backspace), &app, 0.05),
            Some(ControlCmd::UrlBackspace)
        );
    }

    #[test]
    fn any_key_dismisses_a_notice() {
        let mut app = app();
        app.show_notice(Notice::info("Download complete", "x"));
        assert_eq!(
            key_to_cmd(key(KeyCode::Char('q')), &app, 0.05),
            Some(ControlCmd::DismissNotice)
        );
    }

    #[test]
    fn mouse_drag_on_the_gauge_previews_then_commits() {
        let gauge = Rect::new(0, 30, 12, 3);
        let mut app = app();

        let down = mouse_to_cmd(mouse(MouseEventKind::Down(MouseButton::Left), 10, 31), gauge, &app);
        assert_eq!(down, Some(ControlCmd::SeekPreview(1.0)));
        // Presses outside the gauge are ignored.
        assert_eq!(
            mouse_to_cmd(mouse(MouseEventKind::Down(MouseButton::Left), 5, 2), gauge, &app),
            None
        );
        // Dragging needs a grab first.
        assert_eq!(
            mouse_to_cmd(mouse(MouseEventKind::Drag(MouseButton::Left), 1, 0), gauge, &app),
            None
        );

        app.seek_preview = Some(1.0);
        assert_eq!(
            mouse_to_cmd(mouse(MouseEventKind::Drag(MouseButton::Left), 1, 0), gauge, &app),
            Some(ControlCmd::SeekPreview(0.0))
        );
        assert_eq!(
            mouse_to_cmd(mouse(MouseEventKind::Up(MouseButton::Left), 1, 0), gauge, &app),
            Some(ControlCmd::SeekCommit)
        );
    }
}

use std::env;
use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::audio::RodioMixer;
use crate::errors::AppError;
use crate::logging;

mod control;
mod event_loop;
mod poller;
mod session;
mod settings;

use session::Session;


pub fn run() -> Result<(), AppError> {
    let (mut settings, config_warning) = settings::load_settings();
    if let Some(dir) = env::args_os().nth(1) {
        settings.library.dir = PathBuf::from(dir);
    }

    let _log_guard = logging::init(&settings.logging)?;
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }
    info!(dir = %settings.library.dir.display(), "starting siffy");

    fs::create_dir_all(&settings.library.dir)?;
    let mixer = RodioMixer::open_default()?;
    let mut session = Session::new(settings, mixer);

    let mut terminal = setup_terminal()?;
    let run_result = event_loop::run(&mut terminal, &mut session);
    restore_terminal()?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        warn!(error = %e, "event loop ended with an error");
    }
    info!("bye");
    run_result
}

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Raw mode, alternate screen, mouse and paste. Anything already switched on
/// is undone when a later step fails.
fn setup_terminal() -> Result<Term, AppError> {
    enable_raw_mode()?;
    let result = execute!(
        io::stdout(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )
    .map_err(AppError::from)
    .and_then(|()| Terminal::new(CrosstermBackend::new(io::stdout())).map_err(AppError::from));
    or_restore(result, restore_terminal)
}

/// Pass `result` through, running `restore` first when it is an error.
fn or_restore<T>(
    result: Result<T, AppError>,
    restore: impl FnOnce() -> io::Result<()>,
) -> Result<T, AppError> {
    if result.is_err() {
        if let Err(e) = restore() {
            warn!(error = %e, "could not restore the terminal");
        }
    }
    result
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        io::stdout(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
}

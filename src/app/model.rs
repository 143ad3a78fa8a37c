//! UI model: what the terminal draws and what key handling edits.
//!
//! Playback truth lives in the transport; `App` keeps the last status copied
//! from it plus purely presentational state (list cursor, seek preview, URL
//! field, notices).

use std::path::PathBuf;

use crate::library::Track;
use crate::transport::PlaybackStatus;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Browse,
    /// Keystrokes go to the URL field.
    Url,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Modal message; any key dismisses it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

pub struct App {
    pub tracks: Vec<Track>,
    /// List cursor; separate from the track the transport has selected.
    pub cursor: usize,
    pub status: PlaybackStatus,
    /// Slider fraction last reported by the transport.
    pub slider: f64,
    /// Fraction under the user's drag, shown instead of `slider`.
    pub seek_preview: Option<f64>,
    pub mode: InputMode,
    pub url_input: String,
    /// URL of the running download, if any.
    pub downloading: Option<String>,
    pub notice: Option<Notice>,
    pub current_dir: PathBuf,
}

impl App {
    pub fn new(tracks: Vec<Track>, current_dir: PathBuf) -> Self {
        Self {
            tracks,
            cursor: 0,
            status: PlaybackStatus::default(),
            slider: 0.0,
            seek_preview: None,
            mode: InputMode::Browse,
            url_input: String::new(),
            downloading: None,
            notice: None,
            current_dir,
        }
    }

    /// Swap in a freshly scanned list. The cursor goes back to the top.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.cursor = 0;
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Move the cursor down, wrapping to the first track.
    pub fn next(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.tracks.len();
    }

    /// Move the cursor up, wrapping to the last track.
    pub fn prev(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.cursor = match self.cursor {
            0 => self.tracks.len() - 1,
            c => c.min(self.tracks.len()) - 1,
        };
    }

    pub fn cursor_track(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    /// The track the transport has selected.
    pub fn current_track(&self) -> Option<&Track> {
        self.status.index.and_then(|i| self.tracks.get(i))
    }

    /// Transport keys only act once a track is selected.
    pub fn transport_enabled(&self) -> bool {
        self.current_track().is_some()
    }

    /// Copy a transport snapshot in. A slider value means the transport no
    /// longer holds the seek control (track change, stop, rescan), so any
    /// half-finished drag is dropped with it.
    pub fn apply_status(&mut self, status: PlaybackStatus) {
        if let Some(fraction) = status.slider {
            self.slider = fraction;
            self.seek_preview = None;
        }
        self.status = status;
    }

    /// Fraction the seek gauge shows.
    pub fn gauge_fraction(&self) -> f64 {
        self.seek_preview.unwrap_or(self.slider)
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading.is_some()
    }

    pub fn enter_url_mode(&mut self) {
        self.mode = InputMode::Url;
    }

    pub fn exit_url_mode(&mut self) {
        self.mode = InputMode::Browse;
    }

    pub fn push_url_char(&mut self, c: char) {
        self.url_input.push(c);
    }

    pub fn pop_url_char(&mut self) {
        self.url_input.pop();
    }

    /// Paste from the terminal; line breaks are dropped.
    pub fn paste_url(&mut self, text: &str) {
        self.url_input
            .extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
    }

    /// Hand over the trimmed URL and clear the field.
    pub fn take_url(&mut self) -> String {
        let url = self.url_input.trim().to_string();
        self.url_input.clear();
        url
    }

    pub fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

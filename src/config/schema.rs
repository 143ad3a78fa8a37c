use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/siffy/config.toml` or `~/.config/siffy/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SIFFY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub download: DownloadSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory holding the audio files. Not scanned recursively.
    pub dir: PathBuf,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to include hidden files (dotfiles).
    pub include_hidden: bool,

    /// Which fields to use to build `Track.display` and its ordering.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,

    /// Edge length (in pixels) covers are downscaled to after decoding.
    pub cover_size: u32,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("downloads"),
            extensions: vec!["mp3".into()],
            include_hidden: false,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
            cover_size: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Progress poll period in milliseconds.
    pub tick_ms: u64,
    /// Auto-advance once the position is this close to the end of the track.
    pub end_of_track_epsilon_ms: u64,
    /// How far `[` / `]` move the seek slider, in percent of the track.
    pub seek_step_percent: u8,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            end_of_track_epsilon_ms: 1000,
            seek_step_percent: 5,
        }
    }
}

/// Options handed to the external extraction tool (`yt-dlp`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Program to run.
    pub program: String,
    /// Arguments placed before the tool's own flags, e.g. `["-m", "yt_dlp"]`
    /// when `program` is a Python interpreter.
    pub program_args: Vec<String>,
    /// Target audio codec.
    pub audio_format: String,
    /// Target quality (bitrate such as `192K`, or a VBR level `0`-`10`).
    pub audio_quality: String,
    /// Retries for the whole download on transient network failures.
    pub retries: u32,
    /// Retries for each fragment of segmented downloads.
    pub fragment_retries: u32,
    /// Connection timeout in seconds.
    pub socket_timeout_secs: u64,
    /// Validate TLS certificates. The original tool was run with this off.
    pub check_certificate: bool,
    /// Download rate cap (e.g. `500K`, `2M`). Empty disables the cap.
    pub rate_limit: String,
    /// Filename template, relative to `library.dir`.
    pub output_template: String,
    /// Timeout for the separate thumbnail fetch, in seconds.
    pub thumbnail_timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            program_args: Vec::new(),
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
            retries: 10,
            fragment_retries: 10,
            socket_timeout_secs: 30,
            check_certificate: false,
            rate_limit: "500K".to_string(),
            output_template: "%(title)s.%(ext)s".to_string(),
            thumbnail_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Separator between the elapsed and total time labels.
    pub time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ siffy ~ ".to_string(),
            time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for the rolling log files. Defaults to the XDG state dir.
    pub directory: Option<PathBuf>,
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            filter: "info,siffy=debug".to_string(),
        }
    }
}

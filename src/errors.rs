//! Error types shared across the player, the transport and the downloader.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while handing a file to the audio output.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("no audio output device: {0}")]
    Output(#[from] rodio::StreamError),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no track selected")]
    NoTrackSelected,

    #[error("the track list is empty")]
    EmptyPlaylist,

    #[error("no track at index {0}")]
    NoSuchTrack(usize),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Failures of a single acquisition job.
///
/// `ToolFailed` displays the tool's own message untouched so it can be shown
/// to the user as-is.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("enter a video URL first")]
    EmptyUrl,

    #[error("a download is already running")]
    Busy,

    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{reason}")]
    ToolFailed { reason: String },

    #[error("the downloader did not report an output file")]
    MissingOutput,

    #[error("the download stopped without reporting a result")]
    WorkerLost,

    #[error("unreadable downloader output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("output file has no name: {}", .0.display())]
    NoFileStem(PathBuf),
}

/// Top-level errors that end the terminal session.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

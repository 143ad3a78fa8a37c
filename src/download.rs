//! Acquisition pipeline: turn a video URL into an MP3 in the library
//! directory by running `yt-dlp`, then save its thumbnail next to it.
//!
//! Extraction, transcoding and tagging are entirely the external tool's job;
//! this module only configures it, runs it off the UI thread and interprets
//! the result.

mod command;
mod job;
mod thumbnail;
mod worker;

pub use job::{DownloadJob, DownloadOutcome};
pub use worker::{DownloadEvent, spawn_download};

#[cfg(all(test, unix))]
mod tests;

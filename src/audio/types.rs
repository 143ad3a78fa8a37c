//! The contract between the playback transport and an audio backend.

use std::path::Path;
use std::time::Duration;

use crate::errors::AudioError;

/// A single-voice audio output.
///
/// Every resume or seek is a fresh `load` at the wanted offset; backends are
/// not expected to seek inside a playing stream.
pub trait Mixer {
    /// Replace whatever is playing with `path`, starting `start_at` into the file.
    fn load(&mut self, path: &Path, start_at: Duration) -> Result<(), AudioError>;

    /// Halt output and drop the current source.
    fn stop(&mut self);

    /// Playback position measured from the last `load`. Must not block.
    fn position(&self) -> Duration;

    /// Whether the loaded source still has samples to play.
    fn is_busy(&self) -> bool;
}

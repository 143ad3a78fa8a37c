use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::Mixer;
use crate::errors::TransportError;
use crate::library::Track;

use super::status::{PlaybackState, PlaybackStatus, fraction_of};

/// What the transport needs to know about a playlist item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    /// Zero when the file header did not reveal a duration.
    pub duration: Duration,
}

impl From<&Track> for Entry {
    fn from(track: &Track) -> Self {
        Self {
            path: track.path.clone(),
            duration: track.duration.unwrap_or_default(),
        }
    }
}

/// Playback session over a playlist.
///
/// `elapsed` is the offset the mixer was last loaded at (or the position
/// captured by a pause or seek). While playing, the live position is that
/// baseline plus what the mixer reports since the load.
pub struct Transport<M: Mixer> {
    mixer: M,
    entries: Vec<Entry>,
    current: Option<usize>,
    state: PlaybackState,
    elapsed: Duration,
    seeking: bool,
    end_epsilon: Duration,
    pending_error: Option<TransportError>,
}

impl<M: Mixer> Transport<M> {
    pub fn new(mixer: M, end_epsilon: Duration) -> Self {
        Self {
            mixer,
            entries: Vec::new(),
            current: None,
            state: PlaybackState::Stopped,
            elapsed: Duration::ZERO,
            seeking: false,
            end_epsilon,
            pending_error: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    #[cfg(test)]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[cfg(test)]
    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    #[cfg(test)]
    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    fn current_entry(&self) -> Option<&Entry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    fn duration(&self) -> Duration {
        self.current_entry().map(|e| e.duration).unwrap_or_default()
    }

    fn clamp_to_track(&self, d: Duration) -> Duration {
        let total = self.duration();
        if total.is_zero() { d } else { d.min(total) }
    }

    fn live_position(&self) -> Duration {
        self.clamp_to_track(self.elapsed + self.mixer.position())
    }

    /// Current position: live while playing, the stored offset otherwise.
    pub fn position(&self) -> Duration {
        match self.state {
            PlaybackState::Playing => self.live_position(),
            _ => self.elapsed,
        }
    }

    /// Replace the playlist after a rescan.
    ///
    /// The current track survives when its path is still listed; otherwise
    /// playback stops and nothing is current.
    pub fn set_playlist(&mut self, entries: Vec<Entry>) {
        let keep = self
            .current_entry()
            .and_then(|cur| entries.iter().position(|e| e.path == cur.path));
        self.entries = entries;

        match keep {
            Some(i) => {
                self.current = Some(i);
                self.elapsed = self.clamp_to_track(self.elapsed);
            }
            None => {
                self.halt();
                self.current = None;
                self.elapsed = Duration::ZERO;
                self.seeking = false;
            }
        }
    }

    fn halt(&mut self) {
        if self.state != PlaybackState::Stopped {
            self.mixer.stop();
        }
        self.state = PlaybackState::Stopped;
    }

    /// Make `index` the current track, stopped at its beginning.
    pub fn select(&mut self, index: usize) -> Result<(), TransportError> {
        if index >= self.entries.len() {
            return Err(TransportError::NoSuchTrack(index));
        }
        self.halt();
        self.current = Some(index);
        self.elapsed = Duration::ZERO;
        self.seeking = false;
        debug!(index, "track selected");
        Ok(())
    }

    /// Load the current track into the mixer at the stored offset.
    fn start(&mut self) -> Result<PlaybackState, TransportError> {
        let path = self
            .current_entry()
            .map(|e| e.path.clone())
            .ok_or(TransportError::NoTrackSelected)?;

        match self.mixer.load(&path, self.elapsed) {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                Ok(self.state)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "playback failed");
                self.mixer.stop();
                self.state = PlaybackState::Stopped;
                Err(e.into())
            }
        }
    }

    /// Stopped/Paused -> Playing from the stored offset.
    pub fn play(&mut self) -> Result<PlaybackState, TransportError> {
        if self.current_entry().is_none() {
            return Err(TransportError::NoTrackSelected);
        }
        if self.state == PlaybackState::Playing {
            return Ok(self.state);
        }
        self.start()
    }

    /// Playing -> Paused, remembering where playback got to.
    pub fn pause(&mut self) -> Result<PlaybackState, TransportError> {
        if self.current_entry().is_none() {
            return Err(TransportError::NoTrackSelected);
        }
        if self.state != PlaybackState::Playing {
            return Ok(self.state);
        }
        self.elapsed = self.live_position();
        self.mixer.stop();
        self.state = PlaybackState::Paused;
        debug!(elapsed = ?self.elapsed, "paused");
        Ok(self.state)
    }

    pub fn play_pause(&mut self) -> Result<PlaybackState, TransportError> {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Halt playback and rewind to the start of the current track.
    pub fn stop(&mut self) {
        self.halt();
        self.elapsed = Duration::ZERO;
        self.seeking = false;
    }

    fn switch_to(&mut self, index: usize) -> Result<PlaybackState, TransportError> {
        self.select(index)?;
        self.start()
    }

    /// Play the following track, wrapping past the end to the first one.
    pub fn next(&mut self) -> Result<PlaybackState, TransportError> {
        let len = self.entries.len();
        if len == 0 {
            return Err(TransportError::EmptyPlaylist);
        }
        let index = match self.current {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.switch_to(index)
    }

    /// Play the preceding track, wrapping before the start to the last one.
    pub fn prev(&mut self) -> Result<PlaybackState, TransportError> {
        let len = self.entries.len();
        if len == 0 {
            return Err(TransportError::EmptyPlaylist);
        }
        let index = match self.current {
            Some(i) if i > 0 && i < len => i - 1,
            _ => len - 1,
        };
        self.switch_to(index)
    }

    /// The user grabbed the seek control; ticks stop reporting a slider value.
    pub fn begin_seek(&mut self) -> bool {
        if self.current_entry().is_none() {
            return false;
        }
        self.seeking = true;
        true
    }

    pub fn cancel_seek(&mut self) {
        self.seeking = false;
    }

    /// Jump to `fraction` (0..=1) of the current track.
    ///
    /// While playing the mixer is reloaded at the new offset; otherwise only
    /// the stored offset moves and the next play starts there.
    pub fn seek(&mut self, fraction: f64) -> Result<PlaybackState, TransportError> {
        self.seeking = false;
        let duration = self
            .current_entry()
            .map(|e| e.duration)
            .ok_or(TransportError::NoTrackSelected)?;

        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.elapsed = duration.mul_f64(fraction);
        debug!(fraction, elapsed = ?self.elapsed, "seek");

        match self.state {
            PlaybackState::Playing => self.start(),
            _ => Ok(self.state),
        }
    }

    /// Progress poll: report where playback is and auto-advance at the end of
    /// the track. A failure while advancing is kept for `take_error`.
    pub fn on_tick(&mut self) -> PlaybackStatus {
        let mut advanced_to = None;

        if self.state == PlaybackState::Playing {
            let position = self.live_position();
            let duration = self.duration();
            let near_end = !duration.is_zero() && position + self.end_epsilon >= duration;

            if near_end || !self.mixer.is_busy() {
                debug!(position = ?position, duration = ?duration, "end of track");
                match self.next() {
                    Ok(_) => advanced_to = self.current,
                    Err(e) => self.pending_error = Some(e),
                }
            }
        }

        PlaybackStatus {
            advanced_to,
            ..self.status()
        }
    }

    /// Snapshot of the session without polling for the end of the track.
    pub fn status(&self) -> PlaybackStatus {
        let position = self.position();
        let duration = self.duration();
        PlaybackStatus {
            state: self.state,
            index: self.current,
            position,
            duration,
            slider: if self.seeking {
                None
            } else {
                Some(fraction_of(position, duration))
            },
            advanced_to: None,
        }
    }

    /// Error raised by the last auto-advance, if any.
    pub fn take_error(&mut self) -> Option<TransportError> {
        self.pending_error.take()
    }
}

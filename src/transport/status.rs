use std::time::Duration;

/// The playback state of the transport.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Snapshot produced by every progress tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    /// Index of the current track in the playlist.
    pub index: Option<usize>,
    pub position: Duration,
    pub duration: Duration,
    /// Slider fraction to display, or `None` while the user drags the seek
    /// control and the slider must be left alone.
    pub slider: Option<f64>,
    /// Set when this tick moved playback to another track.
    pub advanced_to: Option<usize>,
}

/// Position as a fraction of the duration, 0 when the duration is unknown.
pub(super) fn fraction_of(position: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    (position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

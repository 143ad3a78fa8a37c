//! Playback transport: the Stopped/Playing/Paused state machine that drives a
//! `Mixer`, tracks the elapsed offset and decides when to auto-advance.
//!
//! It knows nothing about the terminal UI; the runtime feeds it commands and
//! renders the `PlaybackStatus` returned by `on_tick`.

mod machine;
mod status;

pub use machine::{Entry, Transport};
pub use status::{PlaybackState, PlaybackStatus};

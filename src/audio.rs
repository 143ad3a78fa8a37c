//! Audio output: the `Mixer` seam used by the transport and its `rodio`
//! implementation.

mod player;
mod sink;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use player::RodioMixer;
pub use types::Mixer;

use std::path::Path;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::debug;

use crate::errors::AudioError;

use super::sink::create_sink_at;
use super::types::Mixer;

/// `Mixer` backed by the default output device.
///
/// Owned by the UI thread; every call returns immediately because decoding
/// and output happen on rodio's own mixer thread.
pub struct RodioMixer {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioMixer {
    pub fn open_default() -> Result<Self, AudioError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        Ok(Self { stream, sink: None })
    }
}

impl Mixer for RodioMixer {
    fn load(&mut self, path: &Path, start_at: Duration) -> Result<(), AudioError> {
        self.stop();
        let sink = create_sink_at(&self.stream, path, start_at)?;
        sink.play();
        debug!(path = %path.display(), start_at = ?start_at, "mixer loaded");
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, |s| s.get_pos())
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.empty())
    }
}

impl Drop for RodioMixer {
    fn drop(&mut self) {
        self.stop();
    }
}

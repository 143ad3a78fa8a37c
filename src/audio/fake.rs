//! Scriptable `Mixer` for tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::errors::AudioError;

use super::types::Mixer;

#[derive(Debug, Default)]
pub struct FakeState {
    /// Every successful `load`, in order.
    pub loads: Vec<(PathBuf, Duration)>,
    pub stops: usize,
    /// Position reported since the last load.
    pub position: Duration,
    pub busy: bool,
    /// Paths whose `load` fails with a decode error.
    pub broken: HashSet<PathBuf>,
}

/// Clones share state, so a test can keep one handle and give the other away.
#[derive(Clone, Debug, Default)]
pub struct FakeMixer {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeMixer {
    pub fn set_position(&self, secs: f64) {
        self.state.borrow_mut().position = Duration::from_secs_f64(secs);
    }

    pub fn last_load(&self) -> Option<(PathBuf, Duration)> {
        self.state.borrow().loads.last().cloned()
    }

    pub fn load_count(&self) -> usize {
        self.state.borrow().loads.len()
    }

    pub fn break_path(&self, path: &Path) {
        self.state.borrow_mut().broken.insert(path.to_path_buf());
    }
}

impl Mixer for FakeMixer {
    fn load(&mut self, path: &Path, start_at: Duration) -> Result<(), AudioError> {
        let mut s = self.state.borrow_mut();
        if s.broken.contains(path) {
            s.busy = false;
            return Err(AudioError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "broken test file"),
            });
        }
        s.loads.push((path.to_path_buf(), start_at));
        s.position = Duration::ZERO;
        s.busy = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.stops += 1;
        s.busy = false;
    }

    fn position(&self) -> Duration {
        self.state.borrow().position
    }

    fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }
}

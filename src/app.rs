//! Application module: exposes the UI model used by the TUI and runtime.
//!
//! `App` lives in `app::model` and holds the scanned library, the list
//! cursor, the last playback status and the download/notice state.

mod model;

pub use model::*;

//! Local audio library: the `Track` model and the directory scanner.

mod cover;
mod display;
mod model;
mod scan;

pub use cover::CoverArt;
pub use model::Track;
pub use scan::scan;

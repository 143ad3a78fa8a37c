use std::path::PathBuf;
use std::time::Duration;

use super::cover::CoverArt;

#[derive(Clone, Debug)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub duration: Option<Duration>,
    pub cover: Option<CoverArt>,
    pub display: String,
}

impl Track {
    /// Text for the now-playing line: "Artist - Title" when both are known,
    /// otherwise the title, otherwise the file name.
    pub fn now_playing(&self) -> String {
        let title = self.title.trim();
        match self.artist.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(artist) if !title.is_empty() => format!("{artist} - {title}"),
            _ if !title.is_empty() => title.to_string(),
            _ => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

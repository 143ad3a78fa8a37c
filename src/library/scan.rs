use std::path::Path;
use std::time::Duration;

use lofty::picture::{Picture, PictureType};
use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::cover::CoverArt;
use super::display::display_from_fields;
use super::model::Track;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Front cover first, then whatever picture comes first.
fn pick_picture(pictures: &[Picture]) -> Option<&Picture> {
    pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
}

/// `<dir>/<stem>.jpg` next to the audio file, written by the downloader.
fn sibling_cover(path: &Path, size: u32) -> Option<CoverArt> {
    let jpg = path.with_extension("jpg");
    if !jpg.is_file() {
        return None;
    }
    match CoverArt::open(&jpg, size) {
        Ok(art) => Some(art),
        Err(e) => {
            debug!(path = %jpg.display(), error = %e, "ignoring unreadable cover file");
            None
        }
    }
}

/// Enumerate the audio files directly inside `dir` and read their tags.
///
/// Tag problems never fail the scan: the track keeps its file stem as title and
/// gets no cover. The result is sorted by display text (case-insensitive), then
/// by path, so two scans of an unchanged directory are identical.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable library entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !is_audio_file(path, settings)
        {
            continue;
        }

        let default_title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        let mut title = default_title;
        let mut artist: Option<String> = None;
        let mut duration: Option<Duration> = None;
        let mut cover: Option<CoverArt> = None;

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                duration = Some(tagged.properties().duration());

                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(v) = tag.title() {
                        if !v.trim().is_empty() {
                            title = v.trim().to_string();
                        }
                    }
                    if let Some(v) = tag.artist() {
                        let v = v.trim();
                        if !v.is_empty() {
                            artist = Some(v.to_string());
                        }
                    }
                    if let Some(pic) = pick_picture(tag.pictures()) {
                        match CoverArt::decode(pic.data(), settings.cover_size) {
                            Ok(art) => cover = Some(art),
                            Err(e) => debug!(path = %path.display(), error = %e, "embedded cover is not decodable"),
                        }
                    }
                }

                if cover.is_none() {
                    cover = sibling_cover(path, settings.cover_size);
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no readable tags, using file name");
            }
        }

        let display = display_from_fields(
            path,
            &title,
            artist.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        );

        tracks.push(Track {
            path: path.to_path_buf(),
            title,
            artist,
            duration,
            cover,
            display,
        });
    }

    tracks.sort_by(|a, b| {
        a.display
            .to_lowercase()
            .cmp(&b.display.to_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });
    debug!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}

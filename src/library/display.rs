use std::path::Path;

use crate::config::TrackDisplayField;

fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// List label for a track: the configured `fields` that have a value, joined
/// by `sep`. Falls back to the title, then to the file stem.
pub fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).and_then(non_blank);

    let parts: Vec<String> = fields
        .iter()
        .filter_map(|field| match field {
            TrackDisplayField::Title => non_blank(title).map(str::to_string),
            TrackDisplayField::Artist => artist.and_then(non_blank).map(str::to_string),
            TrackDisplayField::Filename => stem.map(str::to_string),
            TrackDisplayField::Path => Some(path.display().to_string()),
        })
        .collect();

    if !parts.is_empty() {
        return parts.join(sep);
    }
    non_blank(title).or(stem).unwrap_or_default().to_string()
}

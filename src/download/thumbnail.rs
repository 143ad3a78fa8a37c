use std::path::{Path, PathBuf};
use std::time::Duration;

use image::ImageFormat;
use tracing::debug;

use crate::errors::ThumbnailError;

/// Fetch `url` and store it as `<audio stem>.jpg` beside `audio_path`.
///
/// Thumbnails are often WebP; they are re-encoded so the library's cover
/// lookup only ever has to deal with JPEG.
pub fn save_thumbnail(
    url: &str,
    audio_path: &Path,
    timeout: Duration,
    check_certificate: bool,
) -> Result<PathBuf, ThumbnailError> {
    if audio_path.file_stem().is_none() {
        return Err(ThumbnailError::NoFileStem(audio_path.to_path_buf()));
    }
    let target = audio_path.with_extension("jpg");

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(!check_certificate)
        .build()?;
    let bytes = client.get(url).send()?.error_for_status()?.bytes()?;

    let img = image::load_from_memory(&bytes)?;
    img.to_rgb8().save_with_format(&target, ImageFormat::Jpeg)?;
    debug!(path = %target.display(), "thumbnail saved");
    Ok(target)
}

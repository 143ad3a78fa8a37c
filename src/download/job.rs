use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::DownloadSettings;
use crate::errors::DownloadError;

use super::command::YtDlpCommand;
use super::thumbnail::save_thumbnail;

/// Extensions of files a failed run may leave behind, besides the target
/// audio format.
const LEFTOVER_EXTENSIONS: &[&str] = &["part", "ytdl", "temp", "webm", "m4a", "opus", "jpg", "webp"];

/// One URL to fetch into `output_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub output_dir: PathBuf,
}

impl DownloadJob {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub title: String,
    /// The separately saved `<stem>.jpg`, when that worked.
    pub thumbnail: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RequestedDownload {
    filepath: Option<PathBuf>,
}

/// The parts of yt-dlp's info dict this program reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct InfoDict {
    pub title: Option<String>,
    pub filepath: Option<PathBuf>,
    pub thumbnail: Option<String>,
    requested_downloads: Vec<RequestedDownload>,
}

impl InfoDict {
    pub fn output_path(&self) -> Option<&Path> {
        self.filepath.as_deref().or_else(|| {
            self.requested_downloads
                .iter()
                .rev()
                .find_map(|d| d.filepath.as_deref())
        })
    }
}

/// Pick the last JSON object printed on stdout; the tool may print other
/// lines before it.
pub(super) fn parse_info(stdout: &str) -> Result<Option<InfoDict>, serde_json::Error> {
    match stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| l.starts_with('{'))
    {
        Some(line) => serde_json::from_str(line).map(Some),
        None => Ok(None),
    }
}

fn snapshot(dir: &Path) -> std::io::Result<HashSet<PathBuf>> {
    let mut seen = HashSet::new();
    for entry in fs::read_dir(dir)? {
        seen.insert(entry?.path());
    }
    Ok(seen)
}

/// Delete files created during a failed run so nothing half-done reaches
/// the library.
fn remove_leftovers(dir: &Path, before: &HashSet<PathBuf>, audio_format: &str) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.filter_map(Result::ok).map(|e| e.path()) {
        if before.contains(&path) || !path.is_file() {
            continue;
        }
        let leftover = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                e == audio_format.to_ascii_lowercase() || LEFTOVER_EXTENSIONS.contains(&e.as_str())
            })
            .unwrap_or(false);
        if leftover {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed leftover from failed download"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove leftover"),
            }
        }
    }
}

fn run_tool(
    job: &DownloadJob,
    settings: &DownloadSettings,
    url: &str,
) -> Result<(PathBuf, InfoDict), DownloadError> {
    let command = YtDlpCommand::from_settings(settings);
    let output = command
        .build(url, &job.output_dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| DownloadError::Spawn {
            program: command.program().to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr.trim();
        let reason = if reason.is_empty() {
            format!("{} exited with {}", command.program(), output.status)
        } else {
            reason.to_string()
        };
        return Err(DownloadError::ToolFailed { reason });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let info = parse_info(&stdout)?.ok_or(DownloadError::MissingOutput)?;
    let path = info
        .output_path()
        .filter(|p| p.is_file())
        .map(Path::to_path_buf)
        .ok_or(DownloadError::MissingOutput)?;
    Ok((path, info))
}

/// Run one acquisition job to completion. Blocking; call it off the UI thread.
pub fn run_job(job: &DownloadJob, settings: &DownloadSettings) -> Result<DownloadOutcome, DownloadError> {
    let url = job.url.trim();
    if url.is_empty() {
        return Err(DownloadError::EmptyUrl);
    }

    fs::create_dir_all(&job.output_dir)?;
    let before = snapshot(&job.output_dir)?;
    let started = Instant::now();
    info!(url, dir = %job.output_dir.display(), "download started");

    let (path, info) = match run_tool(job, settings, url) {
        Ok(done) => done,
        Err(e) => {
            remove_leftovers(&job.output_dir, &before, &settings.audio_format);
            warn!(url, error = %e, "download failed");
            return Err(e);
        }
    };

    let thumbnail = info.thumbnail.as_deref().and_then(|thumb_url| {
        let timeout = Duration::from_secs(settings.thumbnail_timeout_secs);
        match save_thumbnail(thumb_url, &path, timeout, settings.check_certificate) {
            Ok(saved) => Some(saved),
            Err(e) => {
                warn!(url = thumb_url, error = %e, "could not save separate cover");
                None
            }
        }
    });

    let title = info.title.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    info!(
        path = %path.display(),
        took_secs = started.elapsed().as_secs_f64(),
        "download finished"
    );
    Ok(DownloadOutcome {
        path,
        title,
        thumbnail,
    })
}

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::config::DownloadSettings;
use crate::errors::DownloadError;

use super::job::{DownloadJob, DownloadOutcome, run_job};

/// Message from the download thread back to the UI thread.
#[derive(Debug)]
pub enum DownloadEvent {
    Finished {
        url: String,
        result: Result<DownloadOutcome, DownloadError>,
    },
}

/// Run `job` on its own thread and report exactly one `Finished` event.
///
/// The worker never touches UI state; if the receiver is gone the result is
/// dropped.
pub fn spawn_download(
    job: DownloadJob,
    settings: DownloadSettings,
    tx: Sender<DownloadEvent>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("siffy-download".to_string())
        .spawn(move || {
            let result = run_job(&job, &settings);
            let _ = tx.send(DownloadEvent::Finished {
                url: job.url,
                result,
            });
        })
}

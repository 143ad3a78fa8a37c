use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::{App, InputMode, Notice};
use crate::audio::Mixer;
use crate::config::Settings;
use crate::download::{DownloadEvent, DownloadJob, DownloadOutcome, spawn_download};
use crate::errors::{DownloadError, TransportError};
use crate::library::scan;
use crate::transport::{Entry, PlaybackState, Transport};

use super::control::ControlCmd;

/// Everything the UI thread owns: settings, the transport (and through it
/// the mixer), the UI model and the download channel.
pub struct Session<M: Mixer> {
    settings: Settings,
    app: App,
    transport: Transport<M>,
    download_tx: Sender<DownloadEvent>,
    download_rx: Receiver<DownloadEvent>,
    download_worker: Option<JoinHandle<()>>,
}

impl<M: Mixer> Session<M> {
    /// Build a session and run the first library scan.
    pub fn new(settings: Settings, mixer: M) -> Self {
        let epsilon = Duration::from_millis(settings.playback.end_of_track_epsilon_ms);
        let (download_tx, download_rx) = mpsc::channel();
        let mut session = Self {
            app: App::new(Vec::new(), settings.library.dir.clone()),
            transport: Transport::new(mixer, epsilon),
            settings,
            download_tx,
            download_rx,
            download_worker: None,
        };
        session.rescan();
        session
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[cfg(test)]
    pub fn transport(&self) -> &Transport<M> {
        &self.transport
    }

    /// Re-read the library directory and hand the new list to the transport
    /// and the UI. The current track survives when its file is still there.
    pub fn rescan(&mut self) {
        let tracks = scan(&self.settings.library.dir, &self.settings.library);
        info!(count = tracks.len(), dir = %self.settings.library.dir.display(), "library scanned");
        self.transport
            .set_playlist(tracks.iter().map(Entry::from).collect());
        self.app.set_tracks(tracks);
        self.sync_status();
    }

    fn sync_status(&mut self) {
        self.app.apply_status(self.transport.status());
    }

    /// Progress poll: advance the transport clock and copy its status into the
    /// UI model.
    pub fn tick(&mut self) {
        let status = self.transport.on_tick();
        if let Some(index) = status.advanced_to {
            debug!(index, "auto-advanced");
        }
        if let Some(e) = self.transport.take_error() {
            self.report_transport_error(e);
        }
        self.app.apply_status(status);
    }

    fn report_transport_error(&mut self, e: TransportError) {
        match e {
            TransportError::NoTrackSelected | TransportError::EmptyPlaylist => {
                debug!(error = %e, "transport command ignored");
            }
            e => {
                warn!(error = %e, "transport error");
                self.app.show_notice(Notice::error("Playback error", e.to_string()));
            }
        }
    }

    fn apply(&mut self, result: Result<PlaybackState, TransportError>) {
        if let Err(e) = result {
            self.report_transport_error(e);
        }
    }

    /// Apply one command. Returns `true` when the user asked to quit.
    pub fn handle(&mut self, cmd: ControlCmd) -> bool {
        if cmd.is_transport() && self.transport.current().is_none() {
            debug!(?cmd, "no track selected");
            return false;
        }

        match cmd {
            ControlCmd::Quit => return true,
            ControlCmd::CursorDown => self.app.next(),
            ControlCmd::CursorUp => self.app.prev(),
            ControlCmd::PlayCursor => self.play_cursor(),
            ControlCmd::PlayPause => {
                let r = self.transport.play_pause();
                self.apply(r);
            }
            ControlCmd::Stop => {
                self.transport.stop();
                self.app.seek_preview = None;
            }
            ControlCmd::Next => {
                self.app.seek_preview = None;
                let r = self.transport.next();
                self.apply(r);
            }
            ControlCmd::Prev => {
                self.app.seek_preview = None;
                let r = self.transport.prev();
                self.apply(r);
            }
            ControlCmd::SeekPreview(fraction) => {
                if self.grab_seek() {
                    self.app.seek_preview = Some(fraction.clamp(0.0, 1.0));
                }
            }
            ControlCmd::SeekNudge(delta) => {
                if self.grab_seek() {
                    let from = self.app.gauge_fraction();
                    self.app.seek_preview = Some((from + delta).clamp(0.0, 1.0));
                }
            }
            ControlCmd::SeekCommit => self.commit_seek(),
            ControlCmd::SeekCancel => {
                self.app.seek_preview = None;
                self.transport.cancel_seek();
            }
            ControlCmd::SeekTo(fraction) => {
                if self.grab_seek() {
                    self.app.seek_preview = Some(fraction.clamp(0.0, 1.0));
                    self.commit_seek();
                }
            }
            ControlCmd::Rescan => self.rescan(),
            ControlCmd::OpenUrlInput => {
                if self.app.is_downloading() {
                    self.app
                        .show_notice(Notice::warning("Download", DownloadError::Busy.to_string()));
                } else {
                    self.app.enter_url_mode();
                }
            }
            ControlCmd::UrlChar(c) => self.app.push_url_char(c),
            ControlCmd::UrlBackspace => self.app.pop_url_char(),
            ControlCmd::UrlPaste(text) => {
                if self.app.mode == InputMode::Url {
                    self.app.paste_url(&text);
                }
            }
            ControlCmd::UrlSubmit => {
                self.app.exit_url_mode();
                let url = self.app.take_url();
                self.start_download(url);
            }
            ControlCmd::UrlCancel => {
                self.app.exit_url_mode();
                self.app.url_input.clear();
            }
            ControlCmd::DismissNotice => self.app.dismiss_notice(),
        }

        self.sync_status();
        false
    }

    fn play_cursor(&mut self) {
        let cursor = self.app.cursor;
        if !self.app.has_tracks() || cursor >= self.app.tracks.len() {
            return;
        }
        if self.transport.current() == Some(cursor) {
            // Already selected: keep playing, or resume from the stored offset.
            if self.transport.state() != PlaybackState::Playing {
                let r = self.transport.play();
                self.apply(r);
            }
            return;
        }
        self.app.seek_preview = None;
        if let Err(e) = self.transport.select(cursor) {
            self.report_transport_error(e);
            return;
        }
        let r = self.transport.play();
        self.apply(r);
    }

    /// Grab the seek control unless already held. Returns whether it is held.
    fn grab_seek(&mut self) -> bool {
        if self.app.seek_preview.is_some() {
            return true;
        }
        if !self.transport.begin_seek() {
            return false;
        }
        self.app.seek_preview = Some(self.app.slider);
        true
    }

    fn commit_seek(&mut self) {
        let Some(fraction) = self.app.seek_preview.take() else {
            return;
        };
        self.app.slider = fraction;
        let r = self.transport.seek(fraction);
        self.apply(r);
    }

    /// Start acquiring `url` into the library directory on a worker thread.
    pub fn start_download(&mut self, url: String) {
        if self.app.is_downloading() {
            self.app
                .show_notice(Notice::warning("Download", DownloadError::Busy.to_string()));
            return;
        }
        if url.trim().is_empty() {
            self.app.show_notice(Notice::warning(
                "Download",
                DownloadError::EmptyUrl.to_string(),
            ));
            return;
        }

        let job = DownloadJob::new(url.clone(), self.settings.library.dir.clone());
        match spawn_download(job, self.settings.download.clone(), self.download_tx.clone()) {
            Ok(handle) => {
                info!(url = %url, "download queued");
                self.download_worker = Some(handle);
                self.app.downloading = Some(url);
            }
            Err(e) => {
                warn!(error = %e, "could not start download thread");
                self.app
                    .show_notice(Notice::error("Download failed", e.to_string()));
            }
        }
    }

    /// Pick up finished downloads. Called once per loop iteration.
    ///
    /// A worker that ended without sending its result (it panicked) is
    /// reported as failed so the busy state does not stick.
    pub fn poll_downloads(&mut self) {
        self.drain_downloads();

        let ended = self
            .download_worker
            .as_ref()
            .is_some_and(JoinHandle::is_finished);
        if !ended {
            return;
        }
        // The result may have been sent between the drain and the check.
        self.drain_downloads();
        if let Some(handle) = self.download_worker.take() {
            let _ = handle.join();
            let url = self.app.downloading.take().unwrap_or_default();
            warn!(url = %url, "download worker ended without a result");
            self.finish_download(url, Err(DownloadError::WorkerLost));
        }
    }

    fn drain_downloads(&mut self) {
        loop {
            match self.download_rx.try_recv() {
                Ok(DownloadEvent::Finished { url, result }) => {
                    if let Some(handle) = self.download_worker.take() {
                        let _ = handle.join();
                    }
                    self.finish_download(url, result);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn finish_download(&mut self, url: String, result: Result<DownloadOutcome, DownloadError>) {
        self.app.downloading = None;
        match result {
            Ok(outcome) => {
                info!(
                    url = %url,
                    path = %outcome.path.display(),
                    cover_saved = outcome.thumbnail.is_some(),
                    "download added to library"
                );
                self.rescan();
                self.app.show_notice(Notice::info(
                    "Download complete",
                    format!("Downloaded: {}", outcome.title),
                ));
            }
            Err(e) => {
                self.app
                    .show_notice(Notice::error("Download failed", e.to_string()));
            }
        }
    }

    /// Treat `handle` as the running download for `url`.
    #[cfg(test)]
    pub fn adopt_download(&mut self, url: &str, handle: JoinHandle<()>) {
        self.app.downloading = Some(url.to_string());
        self.download_worker = Some(handle);
    }

    /// Halt playback before the terminal is torn down. A running download is
    /// left to finish on its own.
    pub fn shutdown(&mut self) {
        self.transport.stop();
        if self.download_worker.is_some() {
            info!("exiting with a download still running");
        }
    }
}

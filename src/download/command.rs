use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::config::DownloadSettings;

/// A configured `yt-dlp` invocation.
///
/// The tool is asked to print the final info dict as one JSON line once the
/// file has been moved into place, which is how the produced path and the
/// thumbnail URL come back.
#[derive(Debug, Clone)]
pub struct YtDlpCommand {
    program: String,
    program_args: Vec<String>,
    audio_format: String,
    audio_quality: String,
    retries: u32,
    fragment_retries: u32,
    socket_timeout_secs: u64,
    check_certificate: bool,
    rate_limit: String,
    output_template: String,
}

impl YtDlpCommand {
    pub fn from_settings(settings: &DownloadSettings) -> Self {
        Self {
            program: settings.program.clone(),
            program_args: settings.program_args.clone(),
            audio_format: settings.audio_format.clone(),
            audio_quality: settings.audio_quality.clone(),
            retries: settings.retries,
            fragment_retries: settings.fragment_retries,
            socket_timeout_secs: settings.socket_timeout_secs,
            check_certificate: settings.check_certificate,
            rate_limit: settings.rate_limit.trim().to_string(),
            output_template: settings.output_template.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list, not including the program itself.
    pub fn args(&self, url: &str, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.program_args.iter().map(OsString::from).collect();

        let mut push = |a: &str| args.push(OsString::from(a));
        push("--format");
        push("bestaudio/best");
        push("--extract-audio");
        push("--audio-format");
        push(&self.audio_format);
        push("--audio-quality");
        push(&self.audio_quality);
        push("--embed-thumbnail");
        push("--convert-thumbnails");
        push("jpg");
        push("--embed-metadata");
        push("--no-playlist");
        push("--retries");
        push(&self.retries.to_string());
        push("--fragment-retries");
        push(&self.fragment_retries.to_string());
        push("--socket-timeout");
        push(&self.socket_timeout_secs.to_string());
        if !self.check_certificate {
            push("--no-check-certificate");
        }
        if !self.rate_limit.is_empty() {
            push("--limit-rate");
            push(&self.rate_limit);
        }
        push("--print");
        push("after_move:%()j");

        args.push(OsString::from("--output"));
        args.push(output_dir.join(&self.output_template).into_os_string());

        // Everything after `--` is a URL, even if it starts with a dash.
        args.push(OsString::from("--"));
        args.push(OsString::from(url));
        args
    }

    pub fn build(&self, url: &str, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(url, output_dir));
        cmd
    }
}

use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use image::{ImageBuffer, ImageFormat, Rgb};

use super::command::YtDlpCommand;
use super::job::{parse_info, run_job};
use super::thumbnail::save_thumbnail;
use super::*;
use crate::config::{DownloadSettings, LibrarySettings};
use crate::errors::DownloadError;
use crate::library::scan;

/// Settings that run `script` through `sh` in place of yt-dlp.
fn scripted(dir: &Path, script: &str) -> DownloadSettings {
    let path = dir.join("fake-yt-dlp.sh");
    fs::write(&path, script).unwrap();
    DownloadSettings {
        program: "sh".to_string(),
        program_args: vec![path.to_string_lossy().into_owned()],
        ..DownloadSettings::default()
    }
}

/// Finds the `--output` template and writes "<dir>/Fake Song.mp3".
const SUCCESS_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --output) tmpl="$2"; shift ;;
  esac
  shift
done
dir=$(dirname "$tmpl")
printf 'ID3 not really audio' > "$dir/Fake Song.mp3"
echo "[download] Destination: $dir/Fake Song.webm"
printf '{"title": "Fake Song", "filepath": "%s/Fake Song.mp3", "thumbnail": "http://127.0.0.1:9/thumb.jpg"}\n' "$dir"
"#;

const FAILURE_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --output) tmpl="$2"; shift ;;
  esac
  shift
done
dir=$(dirname "$tmpl")
printf 'half' > "$dir/Broken.mp3"
printf 'half' > "$dir/Broken.webm.part"
echo "ERROR: [youtube] abc123: Video unavailable" >&2
exit 1
"#;

fn library_paths(dir: &Path) -> Vec<PathBuf> {
    scan(dir, &LibrarySettings::default())
        .into_iter()
        .map(|t| t.path)
        .collect()
}

#[test]
fn command_carries_the_configured_options() {
    let settings = DownloadSettings::default();
    let args = YtDlpCommand::from_settings(&settings).args("https://youtu.be/x", Path::new("/m"));
    let args: Vec<String> = args
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let has_pair = |flag: &str, value: &str| args.windows(2).any(|w| w[0] == flag && w[1] == value);
    assert!(has_pair("--format", "bestaudio/best"));
    assert!(has_pair("--audio-format", "mp3"));
    assert!(has_pair("--audio-quality", "192K"));
    assert!(has_pair("--retries", "10"));
    assert!(has_pair("--fragment-retries", "10"));
    assert!(has_pair("--socket-timeout", "30"));
    assert!(has_pair("--limit-rate", "500K"));
    assert!(has_pair("--output", "/m/%(title)s.%(ext)s"));
    assert!(args.contains(&"--extract-audio".to_string()));
    assert!(args.contains(&"--embed-thumbnail".to_string()));
    assert!(args.contains(&"--embed-metadata".to_string()));
    assert!(args.contains(&"--no-check-certificate".to_string()));
    assert_eq!(
        args[args.len() - 2..].to_vec(),
        vec!["--".to_string(), "https://youtu.be/x".to_string()]
    );
}

#[test]
fn command_drops_optional_flags_and_prepends_program_args() {
    let settings = DownloadSettings {
        program: "python3".into(),
        program_args: vec!["-m".into(), "yt_dlp".into()],
        check_certificate: true,
        rate_limit: "  ".into(),
        ..DownloadSettings::default()
    };
    let cmd = YtDlpCommand::from_settings(&settings);
    let args = cmd.args("u", Path::new("/m"));

    assert_eq!(cmd.program(), "python3");
    assert_eq!(args[0], OsString::from("-m"));
    assert_eq!(args[1], OsString::from("yt_dlp"));
    assert!(!args.contains(&OsString::from("--no-check-certificate")));
    assert!(!args.contains(&OsString::from("--limit-rate")));
}

#[test]
fn parse_info_takes_the_last_json_line() {
    let out = "[info] something\n{\"title\":\"old\"}\nnoise\n{\"title\":\"T\",\"requested_downloads\":[{\"filepath\":\"/m/T.mp3\"}]}\n";
    let info = parse_info(out).unwrap().unwrap();
    assert_eq!(info.title.as_deref(), Some("T"));
    assert_eq!(info.output_path(), Some(Path::new("/m/T.mp3")));

    assert!(parse_info("no json here").unwrap().is_none());
    assert!(parse_info("{broken").is_err());
}

#[test]
fn successful_job_adds_exactly_one_track_matching_the_template() {
    let scripts = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    fs::write(library.path().join("Existing.mp3"), b"garbage").unwrap();
    let settings = scripted(scripts.path(), SUCCESS_SCRIPT);

    let before = library_paths(library.path());
    let outcome = run_job(
        &DownloadJob::new("https://youtu.be/abc123", library.path()),
        &settings,
    )
    .unwrap();

    let expected = library.path().join("Fake Song.mp3");
    assert_eq!(outcome.path, expected);
    assert_eq!(outcome.title, "Fake Song");
    // The thumbnail host is unreachable; the job still succeeds.
    assert_eq!(outcome.thumbnail, None);

    let after = library_paths(library.path());
    let new: Vec<&PathBuf> = after.iter().filter(|p| !before.contains(p)).collect();
    assert_eq!(new, vec![&expected]);
}

#[test]
fn failed_job_reports_the_reason_verbatim_and_leaves_the_library_alone() {
    let scripts = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    fs::write(library.path().join("Keep.mp3"), b"garbage").unwrap();
    let settings = scripted(scripts.path(), FAILURE_SCRIPT);

    let before = library_paths(library.path());
    let err = run_job(
        &DownloadJob::new("https://youtu.be/abc123", library.path()),
        &settings,
    )
    .unwrap_err();

    assert!(matches!(err, DownloadError::ToolFailed { .. }));
    assert_eq!(err.to_string(), "ERROR: [youtube] abc123: Video unavailable");
    assert_eq!(library_paths(library.path()), before);
    assert!(!library.path().join("Broken.webm.part").exists());
    assert!(library.path().join("Keep.mp3").exists());
}

#[test]
fn job_without_reported_output_is_an_error() {
    let scripts = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    let settings = scripted(scripts.path(), "echo '[info] nothing to see'\n");

    let err = run_job(&DownloadJob::new("u", library.path()), &settings).unwrap_err();
    assert!(matches!(err, DownloadError::MissingOutput));
}

#[test]
fn empty_url_is_rejected_before_running_anything() {
    let library = tempfile::tempdir().unwrap();
    let settings = DownloadSettings {
        program: "/nonexistent/yt-dlp".into(),
        ..DownloadSettings::default()
    };
    let err = run_job(&DownloadJob::new("   ", library.path()), &settings).unwrap_err();
    assert!(matches!(err, DownloadError::EmptyUrl));
}

#[test]
fn missing_program_is_a_spawn_error() {
    let library = tempfile::tempdir().unwrap();
    let settings = DownloadSettings {
        program: "/nonexistent/yt-dlp".into(),
        ..DownloadSettings::default()
    };
    let err = run_job(&DownloadJob::new("u", library.path()), &settings).unwrap_err();
    assert!(matches!(err, DownloadError::Spawn { .. }));
}

#[test]
fn worker_reports_back_over_the_channel() {
    let scripts = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    let settings = scripted(scripts.path(), FAILURE_SCRIPT);
    let (tx, rx) = mpsc::channel();

    let handle = spawn_download(
        DownloadJob::new("https://youtu.be/abc123", library.path()),
        settings,
        tx,
    )
    .unwrap();

    let DownloadEvent::Finished { url, result } = rx.recv_timeout(Duration::from_secs(30)).unwrap();
    handle.join().unwrap();
    assert_eq!(url, "https://youtu.be/abc123");
    assert!(result.is_err());
}

/// Answer one HTTP request on 127.0.0.1 with `body` as a PNG. Returns the URL.
fn serve_once(body: Vec<u8>) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/thumb.png", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 {
            if line == "\r\n" {
                break;
            }
            line.clear();
        }
        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();
    });
    (url, handle)
}

/// One second of silent 8 kHz mono PCM, enough for the tag reader.
fn write_wav(path: &Path) {
    let data_len: u32 = 8000;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&8000u32.to_le_bytes());
    bytes.extend_from_slice(&8000u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&8u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 128);
    fs::write(path, bytes).unwrap();
}

#[test]
fn thumbnail_is_saved_as_a_sibling_jpeg_and_used_as_cover() {
    let library = tempfile::tempdir().unwrap();
    let audio = library.path().join("Some Song.wav");
    write_wav(&audio);

    let png = ImageBuffer::from_pixel(8, 6, Rgb([200u8, 30, 30]));
    let mut body = Cursor::new(Vec::new());
    png.write_to(&mut body, ImageFormat::Png).unwrap();
    let (url, server) = serve_once(body.into_inner());

    let saved = save_thumbnail(&url, &audio, Duration::from_secs(10), true).unwrap();
    server.join().unwrap();

    assert_eq!(saved, library.path().join("Some Song.jpg"));
    let decoded = image::open(&saved).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 6));

    let settings = LibrarySettings {
        extensions: vec!["wav".into()],
        ..LibrarySettings::default()
    };
    let tracks = scan(library.path(), &settings);
    assert_eq!(tracks.len(), 1);
    let cover = tracks[0].cover.as_ref().expect("sibling jpg picked up as cover");
    let [r, g, b] = cover.pixel(0, 0).unwrap();
    assert!(r > 150 && g < 90 && b < 90, "unexpected colour {r},{g},{b}");
}

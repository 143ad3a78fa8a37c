mod app;
mod audio;
mod config;
mod download;
mod errors;
mod library;
mod logging;
mod runtime;
mod transport;
mod ui;

fn main() {
    if let Err(e) = runtime::run() {
        eprintln!("siffy: {e}");
        std::process::exit(1);
    }
}

//! Standalone RTSP server for pre-packaged MJPEG clips.
//!
//! Thin wrapper over [`rtsp::Server`]: parses arguments, builds a
//! [`rtsp::ServerConfig`], starts the server, and blocks until the
//! operator presses Enter. Argument parsing and process lifecycle are
//! ambient CLI plumbing, not part of the core library surface.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rtsp::{Server, ServerConfig};

#[derive(Parser)]
#[command(
    name = "rtsp-server",
    about = "RTSP/RTP server for pre-packaged MJPEG clips"
)]
struct Args {
    /// Bind address (host:port) for the RTSP TCP listener.
    #[arg(long, short, default_value = "0.0.0.0:8554")]
    bind: String,

    /// Directory containing served .mjpeg files.
    #[arg(long, short = 'd')]
    dir: PathBuf,

    /// Comma-separated playlist order, enabling NEXT/PREVIOUS. When
    /// omitted, every `.mjpeg` file under `--dir` is enumerated in
    /// alphabetical order.
    #[arg(long, value_delimiter = ',')]
    playlist: Option<Vec<String>>,

    /// Upper bound on concurrently accepted TCP connections.
    #[arg(long)]
    max_connections: Option<usize>,

    /// Session name advertised in SDP `s=` lines.
    #[arg(long, default_value = "mjpeg-rtsp")]
    session_name: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let entries = match std::fs::read_dir(&args.dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("cannot read video directory {}: {e}", args.dir.display());
            return ExitCode::FAILURE;
        }
    };

    let playlist = match args.playlist {
        Some(playlist) => playlist,
        None => enumerate_mjpeg_files(entries),
    };

    let mut config = ServerConfig::new(args.bind.clone(), &args.dir).with_playlist(playlist);
    config.session_name = args.session_name;
    if let Some(max) = args.max_connections {
        config = config.with_max_connections(max);
    }

    let mut server = Server::new(config);
    if let Err(e) = server.start() {
        eprintln!("failed to start server: {e}");
        return ExitCode::FAILURE;
    }

    println!("RTSP server on {} — press Enter to stop", args.bind);
    let mut input = String::new();
    let _ = io::stdin().read_line(&mut input);

    server.stop();
    ExitCode::SUCCESS
}

/// Enumerate `.mjpeg` files directly under the video directory,
/// alphabetically, for use as the default playlist order.
fn enumerate_mjpeg_files(entries: std::fs::ReadDir) -> Vec<String> {
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "mjpeg"))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

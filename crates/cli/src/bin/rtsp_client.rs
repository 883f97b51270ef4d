//! Interactive line-driven RTSP client shell.
//!
//! Stands in for the GUI sink the core library treats as an external
//! collaborator (spec.md §1): a background thread pulls decoded frame
//! bytes off the RTP receiver and reports progress, while the main
//! thread reads one command per line from stdin and drives the
//! [`RtspClient`] state machine.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use clap::Parser;
use rtsp::media::{RtpReceiver, StatsRecorder};
use rtsp::{RtspClient, RtspError};

#[derive(Parser)]
#[command(name = "rtsp-client", about = "RTSP/RTP client shell for MJPEG clips")]
struct Args {
    /// RTSP server address.
    server_addr: String,
    /// RTSP server port.
    server_port: u16,
    /// Local UDP port to receive RTP frames on.
    rtp_port: u16,
    /// Filename to request from the server.
    filename: String,

    /// Write a CSV of (elapsed_seconds, payload_len) per received frame.
    #[arg(long)]
    stats: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let receiver = match RtpReceiver::bind(args.rtp_port) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("failed to bind RTP receiver on port {}: {e}", args.rtp_port);
            return;
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let receive_running = running.clone();
    let stats_path = args.stats.clone();
    let receive_thread = thread::spawn(move || {
        let mut stats = StatsRecorder::new();
        while receive_running.load(Ordering::SeqCst) {
            match receiver.read() {
                Ok(Some(payload)) => {
                    stats.record(payload.len());
                    println!("frame: {} bytes", payload.len());
                }
                Ok(None) => continue, // read timeout, no data this tick
                Err(e) => {
                    eprintln!("RTP receive error: {e}");
                    break;
                }
            }
        }
        if let Some(path) = stats_path
            && let Err(e) = stats.write_csv(&path)
        {
            eprintln!("failed to write stats to {}: {e}", path.display());
        }
    });

    let mut client = match RtspClient::connect((args.server_addr.as_str(), args.server_port)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to connect to {}:{}: {e}", args.server_addr, args.server_port);
            running.store(false, Ordering::SeqCst);
            let _ = receive_thread.join();
            return;
        }
    };

    if let Err(e) = client.setup(&args.filename, args.rtp_port) {
        eprintln!("SETUP failed: {e}");
        running.store(false, Ordering::SeqCst);
        let _ = receive_thread.join();
        return;
    }
    println!(
        "connected: session {}, state {}",
        client.session_id().unwrap_or("?"),
        client.state()
    );

    println!("commands: play [seconds], pause, next, prev, teardown, quit");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut parts = line.trim().split_whitespace();
        let result = match parts.next() {
            Some("play") => {
                let seek_to = parts.next().and_then(|s| s.parse::<f64>().ok());
                run(client.play(seek_to))
            }
            Some("pause") => run(client.pause()),
            Some("next") => run(client.next().map(|name| println!("now playing: {name}"))),
            Some("prev") => run(client.previous().map(|name| println!("now playing: {name}"))),
            Some("teardown") => {
                client.teardown();
                true
            }
            Some("quit") | None => break,
            Some(other) => {
                eprintln!("unknown command: {other}");
                true
            }
        };
        println!("state: {}", client.state());
        io::stdout().flush().ok();
        if !result {
            break;
        }
    }

    client.teardown();
    running.store(false, Ordering::SeqCst);
    let _ = receive_thread.join();
}

/// Print and absorb a command's [`RtspError`], keeping the shell alive
/// for anything short of a dead connection.
fn run(result: Result<(), RtspError>) -> bool {
    match result {
        Ok(()) => true,
        Err(RtspError::Io(_)) => {
            eprintln!("connection lost");
            false
        }
        Err(e) => {
            eprintln!("command failed: {e}");
            true
        }
    }
}

//! RTP sender: a long-running thread that pulls frames from an
//! [`MjpegReader`] at the container's frame rate and ships them to a
//! fixed UDP peer, pausable and closable from other threads.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::Result;
use crate::media::mjpeg::MjpegReader;
use crate::media::rtp;

/// Cleared on `pause`, set on `play`, and permanently "open but dead"
/// once `stopped` is set so the worker thread can exit promptly
/// instead of blocking forever on a cleared gate.
struct Gate {
    playing: Mutex<bool>,
    condvar: Condvar,
    stopped: AtomicBool,
}

impl Gate {
    fn new() -> Self {
        Self {
            playing: Mutex::new(false),
            condvar: Condvar::new(),
            stopped: AtomicBool::new(false),
        }
    }

    fn play(&self) {
        *self.playing.lock() = true;
        self.condvar.notify_all();
    }

    fn pause(&self) {
        *self.playing.lock() = false;
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    /// Block until playing (or stopped), then report whether the caller
    /// should keep running.
    fn wait_until_playing(&self) -> bool {
        let mut playing = self.playing.lock();
        while !*playing && !self.stopped.load(Ordering::SeqCst) {
            self.condvar.wait(&mut playing);
        }
        !self.stopped.load(Ordering::SeqCst)
    }
}

/// A long-running RTP frame pump bound to one UDP peer.
///
/// Starts suspended. `play()`/`pause()` toggle delivery without
/// terminating the thread; `close()` stops it for good. `swap_stream`
/// atomically replaces the underlying reader; callers must only do
/// this while suspended.
pub struct RtpSender {
    gate: Arc<Gate>,
    reader: Arc<Mutex<MjpegReader>>,
    handle: Option<JoinHandle<()>>,
}

impl RtpSender {
    /// Bind an ephemeral UDP socket and spawn the pump thread, suspended,
    /// targeting `peer` and reading from `reader`.
    pub fn spawn(peer: SocketAddr, reader: MjpegReader) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let gate = Arc::new(Gate::new());
        let reader = Arc::new(Mutex::new(reader));

        let thread_gate = gate.clone();
        let thread_reader = reader.clone();
        let handle = thread::Builder::new()
            .name("rtp-sender".into())
            .spawn(move || run(socket, peer, thread_reader, thread_gate))?;

        Ok(Self {
            gate,
            reader,
            handle: Some(handle),
        })
    }

    /// Resume delivery.
    pub fn play(&self) {
        self.gate.play();
    }

    /// Suspend delivery; no datagrams leave the socket until `play()`.
    pub fn pause(&self) {
        self.gate.pause();
    }

    /// Seek the underlying reader (used by PLAY with a `Range` header).
    pub fn seek_time(&self, t: f64) -> Result<()> {
        self.reader.lock().seek_time(t)
    }

    /// Atomically replace the reader driving this sender (playlist
    /// navigation). Sequence numbers restart at the new reader's own
    /// index by design.
    pub fn swap_stream(&self, new_reader: MjpegReader) {
        *self.reader.lock() = new_reader;
    }

    /// Stop the pump thread and join it.
    pub fn close(&mut self) {
        self.gate.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RtpSender {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(socket: UdpSocket, peer: SocketAddr, reader: Arc<Mutex<MjpegReader>>, gate: Arc<Gate>) {
    while gate.wait_until_playing() {
        let frame_rate = reader.lock().frame_rate();
        let period = Duration::from_secs_f64(1.0 / frame_rate);

        let next = {
            let mut reader = reader.lock();
            let seqnum = reader.frame_index();
            match reader.read_next() {
                Ok(Some(payload)) => Some((seqnum as u16, payload)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "MJPEG read error, sender idling");
                    None
                }
            }
        };

        if let Some((seqnum, payload)) = next {
            let packet = rtp::packetize(&payload, seqnum);
            if let Err(e) = socket.send_to(&packet, peer) {
                // Connectionless UDP: log and keep going.
                tracing::warn!(error = %e, %peer, "RTP send failed");
            }
        }
        // Even at end-of-stream we still sleep one period and loop;
        // there is no implicit pause.
        thread::sleep(period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::UdpSocket as StdUdpSocket;

    fn write_fixture(frames: &[&[u8]]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for frame in frames {
            let len = frame.len() as u64;
            f.write_all(&len.to_be_bytes()[3..]).unwrap();
            f.write_all(frame).unwrap();
        }
        f.flush().unwrap();
        f
    }

    #[test]
    fn suspended_sender_emits_nothing() {
        let listener = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let peer = listener.local_addr().unwrap();

        let fixture = write_fixture(&[b"frame-a", b"frame-b"]);
        let reader = MjpegReader::open_with_frame_rate(fixture.path(), 50.0).unwrap();
        let mut sender = RtpSender::spawn(peer, reader).unwrap();

        let mut buf = [0u8; 1024];
        let result = listener.recv(&mut buf);
        assert!(result.is_err(), "suspended sender must not send datagrams");

        sender.close();
    }

    #[test]
    fn playing_sender_emits_frames_with_increasing_seqnum() {
        let listener = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let peer = listener.local_addr().unwrap();

        let fixture = write_fixture(&[b"frame-a", b"frame-b", b"frame-c"]);
        let reader = MjpegReader::open_with_frame_rate(fixture.path(), 100.0).unwrap();
        let mut sender = RtpSender::spawn(peer, reader).unwrap();
        sender.play();

        let mut buf = [0u8; 1024];
        let n1 = listener.recv(&mut buf).unwrap();
        let (seq1, payload1) = rtp::parse(&buf[..n1]).unwrap();
        assert_eq!(seq1, 0);
        assert_eq!(payload1, b"frame-a");

        let n2 = listener.recv(&mut buf).unwrap();
        let (seq2, _) = rtp::parse(&buf[..n2]).unwrap();
        assert_eq!(seq2, 1);

        sender.close();
    }
}

//! RTP receiver: a bound UDP socket with a read timeout, used on the
//! client side to pull payload bytes off the wire.

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::media::rtp;

/// Any MTU-bounded UDP datagram fits in this buffer.
const RECV_BUFFER_LEN: usize = 65_536;

/// Default per-read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Bound UDP socket yielding RTP payload bytes with a read timeout.
pub struct RtpReceiver {
    socket: UdpSocket,
}

impl RtpReceiver {
    /// Bind to `listen_port` on all interfaces with the default read timeout.
    pub fn bind(listen_port: u16) -> Result<Self> {
        Self::bind_with_timeout(listen_port, DEFAULT_READ_TIMEOUT)
    }

    /// Bind with an explicit read timeout.
    pub fn bind_with_timeout(listen_port: u16, timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", listen_port))?;
        socket.set_read_timeout(Some(timeout))?;
        tracing::debug!(listen_port, ?timeout, "RTP receiver bound");
        Ok(Self { socket })
    }

    /// Block up to the read timeout for one datagram. Returns `Ok(None)`
    /// on timeout (no data this tick, not an error condition).
    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        match self.socket.recv(&mut buf) {
            Ok(n) => {
                let (_, payload) = rtp::parse(&buf[..n])?;
                Ok(Some(payload.to_vec()))
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release the socket by dropping this receiver.
    pub fn close(self) {}
}

/// Optional `(elapsed_seconds, payload_len)` CSV recorder for offline
/// throughput inspection of a received stream.
pub struct StatsRecorder {
    start: Instant,
    rows: Vec<(f64, usize)>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            rows: Vec::new(),
        }
    }

    /// Record one received frame's payload length at the current time.
    pub fn record(&mut self, payload_len: usize) {
        self.rows.push((self.start.elapsed().as_secs_f64(), payload_len));
    }

    /// Write the accumulated rows as `time,size` CSV to `path`.
    pub fn write_csv(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "time,size")?;
        for (t, size) in &self.rows {
            writeln!(file, "{t},{size}")?;
        }
        Ok(())
    }
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket as StdUdpSocket;
    use std::time::Duration;

    #[test]
    fn read_times_out_with_no_data() {
        let receiver =
            RtpReceiver::bind_with_timeout(0, Duration::from_millis(50)).unwrap();
        assert!(receiver.read().unwrap().is_none());
    }

    #[test]
    fn read_strips_header_and_returns_payload() {
        let receiver = RtpReceiver::bind_with_timeout(0, Duration::from_secs(2)).unwrap();
        let port = receiver.socket.local_addr().unwrap().port();

        let sender = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        let packet = rtp::packetize(b"payload-bytes", 42);
        sender.send_to(&packet, ("127.0.0.1", port)).unwrap();

        let payload = receiver.read().unwrap().unwrap();
        assert_eq!(payload, b"payload-bytes");
    }

    #[test]
    fn stats_recorder_writes_csv() {
        let mut stats = StatsRecorder::new();
        stats.record(100);
        stats.record(200);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        stats.write_csv(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("time,size\n"));
        assert_eq!(contents.lines().count(), 3);
    }
}

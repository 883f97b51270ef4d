//! MJPEG container reader.
//!
//! On-disk format: a concatenation of records `{ size: 5-byte
//! big-endian unsigned integer, payload: size bytes }`. Each payload is
//! a self-contained JPEG frame. There are no per-frame timestamps in
//! the container; playback rate is a fixed external constant
//! ([`DEFAULT_FRAME_RATE`]).
//!
//! Construction scans the file once to count frames (and, in doing so,
//! validates that every record's length prefix is followed by enough
//! bytes; a truncated trailing record is simply not counted). Random
//! access (`seek_time`) re-scans from the start to the target frame
//! rather than maintaining an offset table, traded here for simplicity
//! since clips in this system are short previews, not long recordings.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Length of the big-endian frame-size prefix, in bytes.
const LENGTH_PREFIX_BYTES: usize = 5;

/// Fixed playback rate in Hz. The container carries no per-frame
/// timestamps, so this is external metadata.
pub const DEFAULT_FRAME_RATE: f64 = 20.0;

/// Random-access reader over a length-prefixed MJPEG file.
pub struct MjpegReader {
    path: PathBuf,
    file: File,
    frame_rate: f64,
    frame_count: u64,
    /// Index of the frame the next [`read_next`](Self::read_next) call
    /// will return. Also the RTP sequence-number source for the sender.
    frame_index: u64,
}

impl MjpegReader {
    /// Open `path` at the default frame rate, scanning it once to count frames.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_frame_rate(path, DEFAULT_FRAME_RATE)
    }

    /// Open `path` at an explicit frame rate (for containers packed at a
    /// non-default rate).
    pub fn open_with_frame_rate(path: impl AsRef<Path>, frame_rate: f64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let frame_count = count_frames(&mut file)?;
        file.seek(SeekFrom::Start(0))?;

        tracing::debug!(path = %path.display(), frame_count, frame_rate, "MJPEG file opened");

        Ok(Self {
            path,
            file,
            frame_rate,
            frame_count,
            frame_index: 0,
        })
    }

    /// Path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of frames found during the initial scan.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Fixed playback rate in Hz.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Index of the next frame [`read_next`](Self::read_next) will return.
    /// Used by the RTP sender as the sequence number.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Duration of the clip in seconds: `frame_count / frame_rate`.
    pub fn duration(&self) -> f64 {
        self.frame_count as f64 / self.frame_rate
    }

    /// Read the next frame's payload, advancing the cursor by one.
    ///
    /// Returns `Ok(None)` at end-of-stream (including when the cursor is
    /// already past the last frame, e.g. after a seek beyond `duration`).
    /// A truncated header or payload is treated as end-of-stream, not an
    /// error.
    pub fn read_next(&mut self) -> Result<Option<Vec<u8>>> {
        if self.frame_index >= self.frame_count {
            return Ok(None);
        }

        match read_one_frame(&mut self.file)? {
            Some(payload) => {
                self.frame_index += 1;
                Ok(Some(payload))
            }
            None => {
                // File is shorter than the scan implied (shouldn't happen,
                // but truncation is end-of-stream, never an error).
                self.frame_index = self.frame_count;
                Ok(None)
            }
        }
    }

    /// Seek to the frame at time `t` seconds, by re-scanning from the
    /// start of the file.
    ///
    /// If `t` exceeds `duration()`, the cursor moves past the last frame
    /// and the next [`read_next`](Self::read_next) returns end-of-stream.
    pub fn seek_time(&mut self, t: f64) -> Result<()> {
        let target = (t * self.frame_rate).round();
        let target_index = if target < 0.0 {
            0u64
        } else {
            target as u64
        };

        self.file.seek(SeekFrom::Start(0))?;
        let mut index = 0u64;
        while index < target_index && index < self.frame_count {
            if skip_one_frame(&mut self.file)?.is_none() {
                break;
            }
            index += 1;
        }

        self.frame_index = target_index.min(self.frame_count);
        tracing::debug!(t, target_index = self.frame_index, "MJPEG reader sought");
        Ok(())
    }

    /// Release the underlying file handle by dropping this reader. Exposed
    /// explicitly for callers that want an unambiguous close point; `Drop`
    /// performs the same cleanup for callers who don't call it.
    pub fn close(self) {}
}

/// Scan the whole file once, counting well-formed records.
fn count_frames(file: &mut File) -> Result<u64> {
    let mut count = 0u64;
    while skip_one_frame(file)?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Read the 5-byte length prefix and skip that many payload bytes,
/// without copying the payload. Returns `None` at a clean or truncated
/// end-of-file.
fn skip_one_frame(file: &mut File) -> Result<Option<()>> {
    let Some(size) = read_length_prefix(file)? else {
        return Ok(None);
    };
    let before = file.stream_position()?;
    let after = file.seek(SeekFrom::Start(before + size))?;
    if after - before < size {
        return Ok(None);
    }
    Ok(Some(()))
}

/// Read the 5-byte length prefix followed by that many payload bytes.
fn read_one_frame(file: &mut File) -> Result<Option<Vec<u8>>> {
    let Some(size) = read_length_prefix(file)? else {
        return Ok(None);
    };
    let mut payload = vec![0u8; size as usize];
    match file.read_exact(&mut payload) {
        Ok(()) => Ok(Some(payload)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read the 5-byte big-endian frame-size prefix.
fn read_length_prefix(file: &mut File) -> Result<Option<u64>> {
    let mut buf = [0u8; LENGTH_PREFIX_BYTES];
    match file.read_exact(&mut buf) {
        Ok(()) => {
            let mut padded = [0u8; 8];
            padded[3..].copy_from_slice(&buf);
            Ok(Some(u64::from_be_bytes(padded)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Write a length-prefixed MJPEG file with the given frame payloads.
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
    fn counts_frames_on_open() {
        let fixture = write_fixture(&[b"a", b"bb", b"ccc"]);
        let reader = MjpegReader::open(fixture.path()).unwrap();
        assert_eq!(reader.frame_count(), 3);
        assert_eq!(reader.frame_index(), 0);
    }

    #[test]
    fn read_next_returns_frames_in_order() {
        let fixture = write_fixture(&[b"one", b"two", b"three"]);
        let mut reader = MjpegReader::open(fixture.path()).unwrap();
        assert_eq!(reader.read_next().unwrap().unwrap(), b"one".to_vec());
        assert_eq!(reader.frame_index(), 1);
        assert_eq!(reader.read_next().unwrap().unwrap(), b"two".to_vec());
        assert_eq!(reader.read_next().unwrap().unwrap(), b"three".to_vec());
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn duration_is_frame_count_over_rate() {
        let frames: Vec<&[u8]> = vec![b"x"; 40];
        let fixture = write_fixture(&frames);
        let reader = MjpegReader::open(fixture.path()).unwrap();
        assert_eq!(reader.duration(), 2.0); // 40 frames / 20 Hz
    }

    #[test]
    fn seek_time_lands_on_rounded_frame_index() {
        let frames: Vec<&[u8]> = (0..200).map(|_| &b"f"[..]).collect();
        let fixture = write_fixture(&frames);
        let mut reader = MjpegReader::open(fixture.path()).unwrap();
        reader.seek_time(4.0).unwrap();
        assert_eq!(reader.frame_index(), 80); // round(4.0 * 20)
    }

    #[test]
    fn seek_past_duration_yields_end_of_stream() {
        let frames: Vec<&[u8]> = vec![b"f"; 10];
        let fixture = write_fixture(&frames);
        let mut reader = MjpegReader::open(fixture.path()).unwrap();
        reader.seek_time(100.0).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn missing_file_is_io_not_found() {
        let err = MjpegReader::open("/no/such/file.mjpeg").unwrap_err();
        match err {
            crate::error::RtspError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_trailing_frame_is_not_counted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&10u64.to_be_bytes()[3..]).unwrap(); // claims a 10-byte payload
        f.write_all(b"short").unwrap(); // only 5 bytes follow
        f.flush().unwrap();
        let reader = MjpegReader::open(f.path()).unwrap();
        assert_eq!(reader.frame_count(), 0);
    }
}

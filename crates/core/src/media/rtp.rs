//! RTP packetizer/parser for the fixed MJPEG payload type.
//!
//! This stream negotiates nothing: payload type 26, SSRC 0, no
//! extensions, no CSRC list. [`packetize`] and [`parse`] are plain
//! functions over byte slices rather than stateful encoder/decoder
//! objects, which keeps them separable from the socket code and easy
//! to unit test.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P=0|X=0|CC=0|M=0|   PT=26   |       Sequence Number        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   Timestamp (monotonic ms)                   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         SSRC (= 0)                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        JPEG payload ...                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use std::time::Instant;

use crate::error::{ParseErrorKind, Result, RtspError};

/// Fixed RTP payload type for MJPEG.
pub const MJPEG_PAYLOAD_TYPE: u8 = 26;

/// Length of the RTP fixed header, in bytes.
pub const HEADER_LEN: usize = 12;

/// Byte 0 of every packet: V=2, P=0, X=0, CC=0.
const FIRST_BYTE: u8 = 0b1000_0000;

/// Milliseconds elapsed on a process-wide monotonic clock, truncated to
/// the low 32 bits. Deliberately not a 90 kHz media clock: timestamps
/// here only need to be monotonic, not tied to sample rate.
fn monotonic_millis() -> u32 {
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    let start = *START.get_or_init(Instant::now);
    start.elapsed().as_millis() as u32
}

/// Build a 12-byte RTP header followed by `payload`, with `seqnum` as
/// the 16-bit sequence number.
///
/// The marker bit, padding, extension, and CSRC count are always 0;
/// SSRC is always 0, since this stream never needs to disambiguate
/// multiple sources.
pub fn packetize(payload: &[u8], seqnum: u16) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len());
    packet.push(FIRST_BYTE);
    packet.push(MJPEG_PAYLOAD_TYPE);
    packet.extend_from_slice(&seqnum.to_be_bytes());
    packet.extend_from_slice(&monotonic_millis().to_be_bytes());
    packet.extend_from_slice(&0u32.to_be_bytes()); // SSRC
    packet.extend_from_slice(payload);
    packet
}

/// Inverse of [`packetize`]: strip the 12-byte header and recover the
/// sequence number and payload.
pub fn parse(packet: &[u8]) -> Result<(u16, &[u8])> {
    if packet.len() < HEADER_LEN {
        return Err(RtspError::Parse {
            kind: ParseErrorKind::InvalidHeader,
        });
    }
    let seqnum = u16::from_be_bytes([packet[2], packet[3]]);
    Ok((seqnum, &packet[HEADER_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fixed_bytes() {
        let packet = packetize(b"jpeg-bytes", 7);
        assert_eq!(packet[0], 0x80, "V=2,P=0,X=0,CC=0");
        assert_eq!(packet[1], MJPEG_PAYLOAD_TYPE);
        assert_eq!(&packet[8..12], &[0, 0, 0, 0], "SSRC is fixed 0");
    }

    #[test]
    fn sequence_number_round_trips() {
        let packet = packetize(b"abc", 0xBEEF);
        let (seq, payload) = parse(&packet).unwrap();
        assert_eq!(seq, 0xBEEF);
        assert_eq!(payload, b"abc");
    }

    #[test]
    fn packetize_then_parse_is_identity() {
        let payload = b"a realistic jpeg frame body, more or less";
        for seqnum in [0u16, 1, 80, u16::MAX] {
            let packet = packetize(payload, seqnum);
            let (got_seq, got_payload) = parse(&packet).unwrap();
            assert_eq!(got_seq, seqnum);
            assert_eq!(got_payload, payload);
        }
    }

    #[test]
    fn parse_rejects_short_packet() {
        assert!(parse(&[0u8; 11]).is_err());
    }

    #[test]
    fn header_length_is_twelve() {
        let packet = packetize(b"", 0);
        assert_eq!(packet.len(), HEADER_LEN);
    }
}

//! Media: the MJPEG container reader, RTP packetizer/parser, sender,
//! and receiver.
//!
//! This system negotiates a single fixed codec (MJPEG, payload type
//! 26), so there is no per-codec trait or SDP-attribute indirection
//! here, only the concrete pieces each part needs.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`mjpeg`] | Length-prefixed frame container, random access by time |
//! | [`rtp`] | Packetize/parse functions over the fixed header |
//! | [`sender`] | Pausable UDP frame pump bound to one peer |
//! | [`receiver`] | Timed-out UDP read, client side |

pub mod mjpeg;
pub mod receiver;
pub mod rtp;
pub mod sender;

pub use mjpeg::MjpegReader;
pub use receiver::{RtpReceiver, StatsRecorder};
pub use sender::RtpSender;

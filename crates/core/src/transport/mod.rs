//! TCP transport for RTSP signaling: the acceptor loop and the
//! per-connection worker.
//!
//! RTP media delivery does not live here; each [`RtpSender`](crate::media::RtpSender)
//! owns its own outbound UDP socket directly, since there is no shared
//! state to multiplex across sessions.

pub mod tcp;

pub use tcp::accept_loop;

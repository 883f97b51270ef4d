//! # rtsp — MJPEG streaming over a pragmatic RTSP/RTP subset
//!
//! A Rust library for both ends of a streaming-media pair: an RTSP
//! server that publishes pre-packaged Motion-JPEG clips, and an RTSP
//! client state machine that drives playback against it. Media is
//! delivered over RTP/UDP at a fixed payload type (26); control flows
//! over a single RTSP/TCP connection per session.
//!
//! ## Protocol references
//!
//! | RFC | Topic | How this crate uses it |
//! |-----|-------|----------------------|
//! | [RFC 2326](https://tools.ietf.org/html/rfc2326) | RTSP 1.0 | Request/response parsing, session lifecycle, transport negotiation (a pragmatic subset — see [`protocol`]) |
//! | [RFC 3550](https://tools.ietf.org/html/rfc3550) | RTP | 12-byte fixed header, sequence numbers, SSRC |
//! | [RFC 4566](https://tools.ietf.org/html/rfc4566) | SDP | Session description generation for DESCRIBE responses |
//!
//! This crate does not implement RTSP authentication, TLS, RTCP, or
//! interleaved-TCP transport, and negotiates no codec beyond MJPEG/26.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Adapters (CLI binaries)                  │
//! ├──────────────────────────────────────────┤
//! │  Server / Client — public API, orchestrator│
//! │  MediaLibrary     — filename + playlist    │
//! ├──────────────────────────────────────────┤
//! │  Protocol      — RTSP parsing, SDP, etc.  │
//! │  Session       — server-side state machine│
//! ├──────────────────────────────────────────┤
//! │  Transport     — TCP signaling             │
//! │  Media         — MJPEG reader, RTP, pump   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use rtsp::{Server, ServerConfig};
//!
//! let mut server = Server::new(ServerConfig::new("0.0.0.0:8554", "./videos"));
//! server.start().unwrap();
//! ```
//!
//! ## Crate layout
//!
//! - [`server`] — High-level [`Server`] orchestrator and [`ServerConfig`].
//! - [`client`] — [`client::RtspClient`], the RTSP client state machine.
//! - [`library`] — [`library::MediaLibrary`]: filename resolution and the optional playlist.
//! - [`protocol`] — RTSP request/response parsing, method handling, SDP generation.
//! - [`session`] — Server-side session state machine and transport negotiation.
//! - [`transport`] — TCP listener for RTSP signaling (the acceptor loop and per-connection worker).
//! - [`media`] — MJPEG container reader, RTP packetizer/parser, sender, receiver.
//! - [`error`] — [`RtspError`] enum and [`Result`] alias.

pub mod client;
pub mod error;
pub mod library;
pub mod media;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;

pub use client::{ClientState, RtspClient};
pub use error::{Result, RtspError};
pub use library::MediaLibrary;
pub use server::{Server, ServerConfig};

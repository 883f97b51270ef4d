//! Error types for the RTSP/RTP library.

use std::fmt;

/// Errors that can occur anywhere in the library.
///
/// Variants map to the failure modes in the following groups:
///
/// - **Protocol**: [`Parse`](Self::Parse), [`CseqMismatch`](Self::CseqMismatch),
///   [`SessionMismatch`](Self::SessionMismatch) — malformed or unverified
///   RTSP request/response pairs.
/// - **State**: [`InvalidMethodForState`](Self::InvalidMethodForState) —
///   a method invoked in a state the transition table forbids.
/// - **Session**: [`SessionNotFound`](Self::SessionNotFound).
/// - **Media**: [`FileNotFound`](Self::FileNotFound),
///   [`PlaylistNotConfigured`](Self::PlaylistNotConfigured).
/// - **Server**: [`NotStarted`](Self::NotStarted),
///   [`AlreadyRunning`](Self::AlreadyRunning).
#[derive(Debug, thiserror::Error)]
pub enum RtspError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an RTSP request or response message (RFC 2326 §6/§7).
    #[error("RTSP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// A response's `CSeq` did not match the value of the just-sent request.
    #[error("CSeq mismatch: sent {sent}, got {got}")]
    CseqMismatch { sent: u32, got: u32 },

    /// A response's `Session` did not match the session id the client holds.
    #[error("Session mismatch: expected {expected}, got {got}")]
    SessionMismatch { expected: String, got: String },

    /// A method was invoked while the session/client was in a state that
    /// does not permit it.
    #[error("method {method} not valid in state {state}")]
    InvalidMethodForState { method: String, state: String },

    /// No session with the given id exists on the server.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The requested media file does not exist under the server's video
    /// directory.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// NEXT/PREVIOUS was requested but the server was not configured with
    /// a playlist.
    #[error("no playlist configured for this session")]
    PlaylistNotConfigured,

    /// The server answered a request with a non-200, non-404, non-455
    /// status (e.g. `500 Connection Error`).
    #[error("server returned {status} {reason}")]
    ServerError { status: u16, reason: String },

    /// [`Server::start`](crate::server::Server::start) has not been called.
    #[error("server not started")]
    NotStarted,

    /// [`Server::start`](crate::server::Server::start) was called twice.
    #[error("server already running")]
    AlreadyRunning,
}

/// Specific kind of RTSP parse failure.
#[derive(Debug)]
pub enum ParseErrorKind {
    /// Input was empty (no request/status line).
    EmptyMessage,
    /// The request line was not `METHOD SP URI SP VERSION`.
    InvalidRequestLine,
    /// The status line was not `VERSION SP CODE SP REASON`.
    InvalidStatusLine,
    /// A header line had no recognizable `name: value` split.
    InvalidHeader,
    /// The `CSeq` header was missing or not an integer.
    MissingCseq,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::InvalidRequestLine => write!(f, "invalid request line"),
            Self::InvalidStatusLine => write!(f, "invalid status line"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::MissingCseq => write!(f, "missing or malformed CSeq"),
        }
    }
}

/// Convenience alias for `Result<T, RtspError>`.
pub type Result<T> = std::result::Result<T, RtspError>;

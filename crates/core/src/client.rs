//! RTSP client state machine (C6): drives DESCRIBE/SETUP/PLAY/PAUSE/
//! TEARDOWN/NEXT/PREVIOUS against one server connection, enforcing the
//! transition table before a single byte goes over the wire.
//!
//! ```text
//! INIT --SETUP--> READY --PLAY--> PLAYING
//!        ^  ^        |  ^            |
//!        |  |        |  +---PAUSE---+
//!        |  +--------+
//!        |        (NEXT/PREVIOUS, via SWITCH)
//!        +-------------------TEARDOWN (from READY or PLAYING)
//! ```
//!
//! DESCRIBE is valid in any state and never changes it. The request
//! loop is strictly alternating: this type sends exactly one request,
//! then reads exactly one response, before sending the next — there is
//! no pipelining on the underlying TCP connection.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use crate::error::{Result, RtspError};
use crate::protocol::{NptRange, RtspRequest, RtspResponse};

/// Client-side session state, per spec.md §3 ("Client session (C6)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Init,
    Ready,
    Playing,
    /// Transient state while NEXT/PREVIOUS is in flight. Always resolves
    /// back to `Ready` before a call returns.
    Switch,
}

impl std::fmt::Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Ready => "READY",
            Self::Playing => "PLAYING",
            Self::Switch => "SWITCH",
        };
        write!(f, "{name}")
    }
}

/// The RTSP client state machine, bound to one TCP connection for its
/// whole lifetime (a fresh [`RtspClient::connect`] per server).
pub struct RtspClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    state: ClientState,
    cseq: u32,
    session_id: Option<String>,
    filename: String,
}

impl RtspClient {
    /// Connect to `addr`; the client starts in `INIT` with no filename
    /// until the first [`setup`](Self::setup) call.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        let reader_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(reader_stream),
            writer: stream,
            state: ClientState::Init,
            cseq: 0,
            session_id: None,
            filename: String::new(),
        })
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Retrieve the SDP session description for `filename`. Valid in any
    /// state; does not change it.
    pub fn describe(&mut self, filename: &str) -> Result<String> {
        let request = RtspRequest::new("DESCRIBE", filename).add_header("Accept", "application/sdp");
        let response = self.roundtrip(request)?;
        Ok(response.body.unwrap_or_default())
    }

    /// SETUP `filename`, requesting RTP delivery to `rtp_port` on this
    /// host. Only valid from `INIT`; assigns the session id from the
    /// response and transitions to `READY`.
    pub fn setup(&mut self, filename: &str, rtp_port: u16) -> Result<()> {
        self.require_state(&[ClientState::Init], "SETUP")?;

        let request = RtspRequest::new("SETUP", filename)
            .add_header("Transport", &format!("RTP/UDP; client_port= {rtp_port}"));
        let response = self.roundtrip(request)?;

        let session_id = response
            .header("Session")
            .ok_or(RtspError::Parse {
                kind: crate::error::ParseErrorKind::InvalidHeader,
            })?
            .to_string();

        self.filename = filename.to_string();
        self.session_id = Some(session_id);
        self.state = ClientState::Ready;
        Ok(())
    }

    /// PLAY (resume or start). Valid from `READY` or `PLAYING`; an
    /// optional seek target is sent as an open-ended `Range` header.
    pub fn play(&mut self, seek_to: Option<f64>) -> Result<()> {
        self.require_state(&[ClientState::Ready, ClientState::Playing], "PLAY")?;

        let mut request = RtspRequest::new("PLAY", &self.filename.clone());
        if let Some(t) = seek_to {
            request = request.add_header("Range", &NptRange::to_open_ended_header(t));
        }
        self.roundtrip(request)?;
        self.state = ClientState::Playing;
        Ok(())
    }

    /// PAUSE. A no-op (no bytes sent) if already `READY`; valid from
    /// `PLAYING`; fails from `INIT`.
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            ClientState::Init => Err(RtspError::InvalidMethodForState {
                method: "PAUSE".to_string(),
                state: self.state.to_string(),
            }),
            ClientState::Ready => Ok(()),
            ClientState::Playing | ClientState::Switch => {
                let request = RtspRequest::new("PAUSE", &self.filename.clone());
                self.roundtrip(request)?;
                self.state = ClientState::Ready;
                Ok(())
            }
        }
    }

    /// TEARDOWN. Always safe: swallows send/transport failures so local
    /// state resets to `INIT` even if the server has already died.
    pub fn teardown(&mut self) {
        if self.state != ClientState::Init {
            let request = RtspRequest::new("TEARDOWN", &self.filename.clone());
            let _ = self.roundtrip(request);
        }
        self.session_id = None;
        self.state = ClientState::Init;
    }

    /// Advance the playlist by one entry (server-side modulo wraparound).
    /// Returns the new filename from the `New-Filename` response header.
    pub fn next(&mut self) -> Result<String> {
        self.switch("NEXT")
    }

    /// Retreat the playlist by one entry.
    pub fn previous(&mut self) -> Result<String> {
        self.switch("PREVIOUS")
    }

    fn switch(&mut self, method: &str) -> Result<String> {
        self.require_state(&[ClientState::Ready, ClientState::Playing], method)?;

        if self.state == ClientState::Playing {
            self.pause()?;
        }
        self.state = ClientState::Switch;

        let request = RtspRequest::new(method, &self.filename.clone());
        let response = self.roundtrip(request)?;
        let new_filename = response
            .header("New-Filename")
            .ok_or(RtspError::Parse {
                kind: crate::error::ParseErrorKind::InvalidHeader,
            })?
            .to_string();

        self.filename = new_filename.clone();
        self.state = ClientState::Ready;
        Ok(new_filename)
    }

    /// Reject `method` up front, before any bytes are sent, if the
    /// current state is not one of `allowed` (spec.md §8 invariant 3).
    fn require_state(&self, allowed: &[ClientState], method: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RtspError::InvalidMethodForState {
                method: method.to_string(),
                state: self.state.to_string(),
            })
        }
    }

    /// Send one request, read exactly one response, and verify its
    /// `CSeq` and (if we have one) `Session` before returning it.
    fn roundtrip(&mut self, request: RtspRequest) -> Result<RtspResponse> {
        self.cseq += 1;
        let sent_cseq = self.cseq;

        let mut request = request.add_header("CSeq", &sent_cseq.to_string());
        if let Some(session_id) = &self.session_id {
            request = request.add_header("Session", session_id);
        }

        self.writer.write_all(request.serialize().as_bytes())?;
        self.writer.flush()?;

        let response = self.read_response()?;

        let got_cseq: u32 = response
            .header("CSeq")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        if got_cseq != sent_cseq {
            return Err(RtspError::CseqMismatch {
                sent: sent_cseq,
                got: got_cseq,
            });
        }
        if let (Some(expected), Some(got)) = (&self.session_id, response.header("Session"))
            && expected != got
        {
            return Err(RtspError::SessionMismatch {
                expected: expected.clone(),
                got: got.to_string(),
            });
        }

        match response.status_code {
            200 => Ok(response),
            404 => Err(RtspError::FileNotFound(self.filename.clone())),
            455 => Err(RtspError::InvalidMethodForState {
                method: request.method.clone(),
                state: self.state.to_string(),
            }),
            status => Err(RtspError::ServerError {
                status,
                reason: response.status_text.clone(),
            }),
        }
    }

    /// Read one complete response: the header block up to the blank
    /// line, then the body if `Content-Length` says there is one.
    fn read_response(&mut self) -> Result<RtspResponse> {
        let mut header_text = String::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(RtspError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed while reading response",
                )));
            }
            header_text.push_str(&line);
            if line == "\r\n" || line == "\n" {
                break;
            }
        }

        let mut response = RtspResponse::parse(&header_text)?;
        if let Some(len) = response
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            && len > 0
        {
            let mut body = vec![0u8; len];
            self.reader.read_exact(&mut body)?;
            response.body = Some(String::from_utf8_lossy(&body).into_owned());
        }
        Ok(response)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.writer.local_addr()?)
    }
}

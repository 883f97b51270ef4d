use crate::error::{ParseErrorKind, RtspError};

/// A parsed RTSP request.
///
/// ```text
/// <METHOD> <request-uri> RTSP/1.0
/// CSeq: <n>
/// [Session: <id>]
/// [Transport: RTP/UDP; client_port= <port>]
/// [Accept: application/sdp]
/// [Range: npt=<begin>-[<end>]]
/// ```
///
/// Lines are terminated by `\n`, not `\r\n`.
#[derive(Debug)]
pub struct RtspRequest {
    /// RTSP method (DESCRIBE, SETUP, PLAY, PAUSE, TEARDOWN, NEXT, PREVIOUS).
    pub method: String,
    /// Request-URI, typically a bare filename for this stream.
    pub uri: String,
    /// Protocol version (expected: `RTSP/1.0`).
    pub version: String,
    /// Headers as ordered (name, value) pairs. Names are stored as-received;
    /// lookups via [`get_header`](Self::get_header) are case-insensitive.
    pub headers: Vec<(String, String)>,
}

impl RtspRequest {
    /// Build a request for `method` against `uri`, with no headers yet.
    /// Used by the client side; pair with [`add_header`](Self::add_header)
    /// and [`serialize`](Self::serialize).
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        RtspRequest {
            method: method.into(),
            uri: uri.into(),
            version: "RTSP/1.0".to_string(),
            headers: Vec::new(),
        }
    }

    /// Append a header, preserving insertion order.
    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Serialize to the wire format: request line, headers, blank line.
    /// Lines are LF-terminated, matching [`RtspResponse::serialize`]
    /// (this system is consistent about `\n` on both peers).
    ///
    /// [`RtspResponse::serialize`]: crate::protocol::response::RtspResponse::serialize
    pub fn serialize(&self) -> String {
        let mut out = format!("{} {} {}\n", self.method, self.uri, self.version);
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}\n"));
        }
        out.push('\n');
        out
    }

    /// Parse an RTSP request from its text representation.
    ///
    /// Expects a complete request: request line, headers, and a trailing
    /// blank line. Returns [`RtspError::Parse`] on malformed input.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let mut lines = raw.split('\n');

        let request_line = lines.next().ok_or(RtspError::Parse {
            kind: ParseErrorKind::EmptyMessage,
        })?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(RtspError::Parse {
                kind: ParseErrorKind::InvalidRequestLine,
            });
        }

        let method = parts[0].to_string();
        let uri = parts[1].to_string();
        let version = parts[2].trim_end_matches('\r').to_string();

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            headers.push(parse_header_line(line)?);
        }

        Ok(RtspRequest {
            method,
            uri,
            version,
            headers,
        })
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the CSeq header value, which numbers and orders RTSP
    /// request/response pairs.
    pub fn cseq(&self) -> Option<&str> {
        self.get_header("CSeq")
    }
}

/// Split a header line on the first space; the first token (minus its
/// trailing `:`) is the name, the rest is the value.
fn parse_header_line(line: &str) -> crate::error::Result<(String, String)> {
    let space = line.find(' ').ok_or(RtspError::Parse {
        kind: ParseErrorKind::InvalidHeader,
    })?;
    let name = line[..space].trim_end_matches(':').to_string();
    let value = line[space + 1..].trim().to_string();
    Ok((name, value))
}

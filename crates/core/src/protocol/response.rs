use crate::error::{ParseErrorKind, RtspError};

/// An RTSP response.
///
/// Serializes to:
///
/// ```text
/// RTSP/1.0 200 OK\n
/// CSeq: 1\n
/// Session: 482913\n
/// Content-Length: 142\n
/// \n
/// v=0\n...
/// ```
///
/// Uses a builder pattern: chain [`add_header`](Self::add_header) and
/// [`with_body`](Self::with_body), then call [`serialize`](Self::serialize).
/// `Content-Length` is computed automatically when a body is present.
#[must_use]
pub struct RtspResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RtspResponse {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        RtspResponse {
            status_code,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// 200 OK: success.
    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// 404 Not Found: the requested file does not exist.
    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    /// 455 Method Not Valid In This State.
    pub fn method_not_valid() -> Self {
        Self::new(455, "Method Not Valid In This State")
    }

    /// 500 Connection Error.
    pub fn connection_error() -> Self {
        Self::new(500, "Connection Error")
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value by name (case-insensitive). Client side use.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parse the status line and headers of a response (everything up to,
    /// but not including, the body). Client side use: the body, if any, is
    /// read separately once `Content-Length` is known, then attached with
    /// [`with_body`](Self::with_body).
    ///
    /// `raw` is expected to end at the blank line that separates headers
    /// from body; trailing body bytes in `raw` (if passed a full message)
    /// are ignored rather than rejected.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let mut lines = raw.split('\n');

        let status_line = lines.next().ok_or(RtspError::Parse {
            kind: ParseErrorKind::EmptyMessage,
        })?;
        let status_line = status_line.trim_end_matches('\r');

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().ok_or(RtspError::Parse {
            kind: ParseErrorKind::InvalidStatusLine,
        })?;
        if !version.starts_with("RTSP/") {
            return Err(RtspError::Parse {
                kind: ParseErrorKind::InvalidStatusLine,
            });
        }
        let status_code: u16 = parts
            .next()
            .and_then(|code| code.parse().ok())
            .ok_or(RtspError::Parse {
                kind: ParseErrorKind::InvalidStatusLine,
            })?;
        let status_text = parts.next().unwrap_or("").to_string();

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            let space = line.find(' ').ok_or(RtspError::Parse {
                kind: ParseErrorKind::InvalidHeader,
            })?;
            let name = line[..space].trim_end_matches(':').to_string();
            let value = line[space + 1..].trim().to_string();
            headers.push((name, value));
        }

        Ok(RtspResponse {
            status_code,
            status_text,
            headers,
            body: None,
        })
    }

    /// Serialize to the wire format. Lines are LF-terminated; if a body
    /// is present, `Content-Length` is appended automatically ahead of
    /// the blank line that separates headers from body.
    pub fn serialize(&self) -> String {
        let mut response = format!("RTSP/1.0 {} {}\n", self.status_code, self.status_text);

        for (name, value) in &self.headers {
            response.push_str(&format!("{name}: {value}\n"));
        }

        if let Some(body) = &self.body {
            response.push_str(&format!("Content-Length: {}\n", body.len()));
            response.push('\n');
            response.push_str(body);
        } else {
            response.push('\n');
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_no_body() {
        let resp = RtspResponse::ok()
            .add_header("CSeq", "1")
            .add_header("Session", "482913");
        let s = resp.serialize();
        assert!(s.starts_with("RTSP/1.0 200 OK\n"));
        assert!(s.contains("CSeq: 1\n"));
        assert!(s.contains("Session: 482913\n"));
        assert!(s.ends_with("\n"));
        assert!(!s.contains('\r'));
    }

    #[test]
    fn serialize_with_body() {
        let resp = RtspResponse::ok()
            .add_header("CSeq", "2")
            .with_body("v=0\n".to_string());
        let s = resp.serialize();
        assert!(s.contains("Content-Length: 4\n"));
        assert!(s.ends_with("v=0\n"));
    }

    #[test]
    fn not_found_response() {
        let resp = RtspResponse::not_found().add_header("CSeq", "5");
        assert_eq!(resp.status_code, 404);
        let s = resp.serialize();
        assert!(s.starts_with("RTSP/1.0 404 Not Found\n"));
    }

    #[test]
    fn method_not_valid_status_code() {
        assert_eq!(RtspResponse::method_not_valid().status_code, 455);
    }

    #[test]
    fn parses_status_line_and_headers() {
        let raw = "RTSP/1.0 200 OK\nCSeq: 3\nSession: 482913\n\n";
        let resp = RtspResponse::parse(raw).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.status_text, "OK");
        assert_eq!(resp.header("CSeq"), Some("3"));
        assert_eq!(resp.header("session"), Some("482913"));
        assert!(resp.body.is_none());
    }

    #[test]
    fn parses_multi_word_reason_phrase() {
        let raw = "RTSP/1.0 455 Method Not Valid In This State\nCSeq: 1\n\n";
        let resp = RtspResponse::parse(raw).unwrap();
        assert_eq!(resp.status_code, 455);
        assert_eq!(resp.status_text, "Method Not Valid In This State");
    }

    #[test]
    fn built_response_round_trips_through_parse() {
        let built = RtspResponse::ok()
            .add_header("CSeq", "7")
            .add_header("Session", "100200");
        let parsed = RtspResponse::parse(&built.serialize()).unwrap();
        assert_eq!(parsed.status_code, 200);
        assert_eq!(parsed.header("CSeq"), Some("7"));
        assert_eq!(parsed.header("Session"), Some("100200"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(RtspResponse::parse("").is_err());
    }
}

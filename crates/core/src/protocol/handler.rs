use std::net::SocketAddr;
use std::sync::Arc;

use crate::library::MediaLibrary;
use crate::media::MjpegReader;
use crate::protocol::range::NptRange;
use crate::protocol::request::RtspRequest;
use crate::protocol::response::RtspResponse;
use crate::protocol::sdp;
use crate::session::{Session, SessionManager, SessionState, parse_client_port};

/// Handles RTSP method requests for a single TCP connection.
///
/// One worker owns at most one session, created on the first successful
/// SETUP. DESCRIBE never touches it.
pub struct MethodHandler {
    session_manager: SessionManager,
    library: Arc<MediaLibrary>,
    client_addr: SocketAddr,
    session_name: String,
    session: Option<Arc<Session>>,
}

impl MethodHandler {
    pub fn new(
        session_manager: SessionManager,
        library: Arc<MediaLibrary>,
        client_addr: SocketAddr,
        session_name: String,
    ) -> Self {
        MethodHandler {
            session_manager,
            library,
            client_addr,
            session_name,
            session: None,
        }
    }

    /// Id of the session owned by this connection, if any (for cleanup
    /// when the connection drops).
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_deref().map(|s| s.id.as_str())
    }

    /// Tear down the session owned by this connection without producing
    /// a response, for TCP-disconnect cleanup (spec.md S6): the sender is
    /// closed and joined, the reader dropped, and the id freed from the
    /// registry, exactly as an explicit TEARDOWN would, but with nobody
    /// left on the wire to reply to.
    pub fn teardown_owned_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.teardown();
            self.session_manager.remove(&session.id);
        }
    }

    pub fn handle(&mut self, request: &RtspRequest) -> RtspResponse {
        let cseq = request.cseq().unwrap_or("0").to_string();

        match request.method.as_str() {
            "DESCRIBE" => self.handle_describe(&cseq, &request.uri),
            "SETUP" => self.handle_setup(&cseq, request),
            "PLAY" => self.handle_play(&cseq, request),
            "PAUSE" => self.handle_pause(&cseq),
            "TEARDOWN" => self.handle_teardown(&cseq),
            "NEXT" => self.handle_switch(&cseq, 1),
            "PREVIOUS" => self.handle_switch(&cseq, -1),
            _ => {
                tracing::warn!(method = %request.method, %cseq, "unsupported RTSP method");
                RtspResponse::connection_error().add_header("CSeq", &cseq)
            }
        }
    }

    /// Attach `CSeq` and (if a session exists) `Session` headers.
    fn finish(&self, cseq: &str, response: RtspResponse) -> RtspResponse {
        let response = response.add_header("CSeq", cseq);
        match &self.session {
            Some(session) => response.add_header("Session", &session.id),
            None => response,
        }
    }

    fn handle_describe(&self, cseq: &str, filename: &str) -> RtspResponse {
        let path = match self.library.resolve(filename) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(filename, error = %e, "DESCRIBE for unknown file");
                return self.finish(cseq, RtspResponse::not_found());
            }
        };

        let reader = match MjpegReader::open(&path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(filename, error = %e, "DESCRIBE failed to open file");
                return self.finish(cseq, RtspResponse::not_found());
            }
        };
        let frame_rate = reader.frame_rate();
        let duration = reader.duration();
        reader.close();

        let session_id = self
            .session
            .as_ref()
            .map(|s| s.id.as_str())
            .unwrap_or("0");
        let sdp = sdp::generate_sdp(
            &self.client_addr.ip().to_string(),
            session_id,
            &self.session_name,
            frame_rate,
            duration,
        );

        self.finish(
            cseq,
            RtspResponse::ok()
                .add_header("Content-Type", "application/sdp")
                .with_body(sdp),
        )
    }

    fn handle_setup(&mut self, cseq: &str, request: &RtspRequest) -> RtspResponse {
        if let Some(session) = &self.session
            && session.state() == SessionState::Playing
        {
            tracing::warn!(%cseq, "SETUP rejected while playing");
            return self.finish(cseq, RtspResponse::method_not_valid());
        }

        let transport_header = match request.get_header("Transport") {
            Some(t) => t,
            None => {
                tracing::warn!(%cseq, "SETUP missing Transport header");
                return self.finish(cseq, RtspResponse::connection_error());
            }
        };
        let client_port = match parse_client_port(transport_header) {
            Some(port) => port,
            None => {
                tracing::warn!(%cseq, transport_header, "SETUP invalid Transport header");
                return self.finish(cseq, RtspResponse::connection_error());
            }
        };

        let path = match self.library.resolve(&request.uri) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(uri = %request.uri, error = %e, "SETUP for unknown file");
                return self.finish(cseq, RtspResponse::not_found());
            }
        };
        let reader = match MjpegReader::open(&path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(uri = %request.uri, error = %e, "SETUP failed to open file");
                return self.finish(cseq, RtspResponse::not_found());
            }
        };

        let session = match &self.session {
            Some(session) => session.clone(),
            None => {
                let session = self.session_manager.create_session();
                self.session = Some(session.clone());
                session
            }
        };

        let peer = SocketAddr::new(self.client_addr.ip(), client_port);
        let playlist_index = self.library.playlist_index_of(&request.uri);
        if let Err(e) = session.setup(peer, reader, request.uri.clone(), playlist_index) {
            tracing::error!(error = %e, "SETUP failed to start RTP sender");
            return self.finish(cseq, RtspResponse::connection_error());
        }
        session.set_state(SessionState::Ready);

        tracing::info!(session_id = %session.id, uri = %request.uri, %peer, "session set up");

        self.finish(
            cseq,
            RtspResponse::ok().add_header("Transport", &format!("RTP/UDP; client_port= {client_port}")),
        )
    }

    fn handle_play(&mut self, cseq: &str, request: &RtspRequest) -> RtspResponse {
        let Some(session) = self.session.clone() else {
            tracing::warn!(%cseq, "PLAY before SETUP");
            return self.finish(cseq, RtspResponse::method_not_valid());
        };

        let seek_to = match request.get_header("Range") {
            Some(value) => match NptRange::parse(value) {
                Ok(range) => Some(range.begin),
                Err(e) => {
                    tracing::warn!(%cseq, value, error = %e, "PLAY with invalid Range header");
                    return self.finish(cseq, RtspResponse::connection_error());
                }
            },
            None => None,
        };

        if let Err(e) = session.play(seek_to) {
            tracing::error!(error = %e, "PLAY failed to seek");
            return self.finish(cseq, RtspResponse::connection_error());
        }
        session.set_state(SessionState::Playing);

        let mut response = RtspResponse::ok();
        if let Some(t) = seek_to {
            response = response.add_header("Range", &NptRange::to_open_ended_header(t));
        }
        self.finish(cseq, response)
    }

    fn handle_pause(&mut self, cseq: &str) -> RtspResponse {
        let Some(session) = self.session.clone() else {
            tracing::warn!(%cseq, "PAUSE before SETUP");
            return self.finish(cseq, RtspResponse::method_not_valid());
        };

        session.pause();
        session.set_state(SessionState::Ready);
        self.finish(cseq, RtspResponse::ok())
    }

    fn handle_teardown(&mut self, cseq: &str) -> RtspResponse {
        if let Some(session) = self.session.take() {
            session.teardown();
            self.session_manager.remove(&session.id);
            tracing::info!(session_id = %session.id, "session torn down");
        }
        RtspResponse::ok().add_header("CSeq", cseq)
    }

    fn handle_switch(&mut self, cseq: &str, delta: i64) -> RtspResponse {
        let Some(session) = self.session.clone() else {
            tracing::warn!(%cseq, "NEXT/PREVIOUS before SETUP");
            return self.finish(cseq, RtspResponse::method_not_valid());
        };
        if session.state() != SessionState::Ready {
            tracing::warn!(%cseq, "NEXT/PREVIOUS while playing");
            return self.finish(cseq, RtspResponse::method_not_valid());
        }

        let Some(current_index) = session
            .playlist_index()
            .or_else(|| session.filename().and_then(|f| self.library.playlist_index_of(&f)))
        else {
            tracing::warn!(%cseq, "NEXT/PREVIOUS with no playlist configured");
            return self.finish(cseq, RtspResponse::method_not_valid());
        };

        let new_index = match self.library.step(current_index, delta) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(error = %e, "playlist step failed");
                return self.finish(cseq, RtspResponse::method_not_valid());
            }
        };
        let Some(new_filename) = self.library.playlist_name(new_index).map(str::to_string) else {
            return self.finish(cseq, RtspResponse::connection_error());
        };

        let path = match self.library.resolve(&new_filename) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(filename = %new_filename, error = %e, "playlist entry missing on disk");
                return self.finish(cseq, RtspResponse::not_found());
            }
        };
        let reader = match MjpegReader::open(&path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(filename = %new_filename, error = %e, "failed to open playlist entry");
                return self.finish(cseq, RtspResponse::not_found());
            }
        };

        session.switch_stream(reader, new_filename.clone(), new_index);
        tracing::info!(session_id = %session.id, filename = %new_filename, "switched stream");

        self.finish(
            cseq,
            RtspResponse::ok().add_header("New-Filename", &new_filename),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn write_fixture(dir: &std::path::Path, name: &str, frame_count: usize) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        use std::io::Write;
        for _ in 0..frame_count {
            file.write_all(&1u64.to_be_bytes()[3..]).unwrap();
            file.write_all(b"f").unwrap();
        }
    }

    fn new_handler(library: Arc<MediaLibrary>) -> MethodHandler {
        let peer = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 5006));
        MethodHandler::new(SessionManager::new(), library, peer, "test".to_string())
    }

    fn setup_request(cseq: &str) -> RtspRequest {
        RtspRequest::new("SETUP", "a.mjpeg")
            .add_header("CSeq", cseq)
            .add_header("Transport", "RTP/UDP; client_port= 5006")
    }

    #[test]
    fn describe_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let library = Arc::new(MediaLibrary::new(dir.path()));
        let mut handler = new_handler(library);
        let req = RtspRequest::new("DESCRIBE", "missing.mjpeg").add_header("CSeq", "1");
        let resp = handler.handle(&req);
        assert_eq!(resp.status_code, 404);
    }

    #[test]
    fn setup_then_play_then_pause_then_teardown() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "a.mjpeg", 5);
        let library = Arc::new(MediaLibrary::new(dir.path()));
        let mut handler = new_handler(library);

        let setup_resp = handler.handle(&setup_request("1"));
        assert_eq!(setup_resp.status_code, 200);
        assert!(handler.session_id().is_some());

        let play_req = RtspRequest::new("PLAY", "a.mjpeg").add_header("CSeq", "2");
        let play_resp = handler.handle(&play_req);
        assert_eq!(play_resp.status_code, 200);

        let pause_req = RtspRequest::new("PAUSE", "a.mjpeg").add_header("CSeq", "3");
        assert_eq!(handler.handle(&pause_req).status_code, 200);

        let teardown_req = RtspRequest::new("TEARDOWN", "a.mjpeg").add_header("CSeq", "4");
        assert_eq!(handler.handle(&teardown_req).status_code, 200);
        assert!(handler.session_id().is_none());
    }

    #[test]
    fn play_before_setup_is_455() {
        let dir = tempfile::tempdir().unwrap();
        let library = Arc::new(MediaLibrary::new(dir.path()));
        let mut handler = new_handler(library);
        let req = RtspRequest::new("PLAY", "a.mjpeg").add_header("CSeq", "1");
        assert_eq!(handler.handle(&req).status_code, 455);
    }

    #[test]
    fn setup_missing_file_is_404_and_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let library = Arc::new(MediaLibrary::new(dir.path()));
        let mut handler = new_handler(library);
        let resp = handler.handle(&setup_request("1"));
        assert_eq!(resp.status_code, 404);
        assert!(handler.session_id().is_none());
    }

    #[test]
    fn next_previous_wrap_playlist() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mjpeg", "b.mjpeg", "c.mjpeg"] {
            write_fixture(dir.path(), name, 3);
        }
        let library = Arc::new(MediaLibrary::with_playlist(
            dir.path(),
            vec!["a.mjpeg".into(), "b.mjpeg".into(), "c.mjpeg".into()],
        ));
        let mut handler = new_handler(library);

        let setup_req = RtspRequest::new("SETUP", "b.mjpeg")
            .add_header("CSeq", "1")
            .add_header("Transport", "RTP/UDP; client_port= 5006");
        assert_eq!(handler.handle(&setup_req).status_code, 200);

        let next_resp = handler.handle(&RtspRequest::new("NEXT", "b.mjpeg").add_header("CSeq", "2"));
        assert_eq!(next_resp.status_code, 200);
        assert_eq!(next_resp.headers.iter().find(|(k, _)| k == "New-Filename").map(|(_, v)| v.as_str()), Some("c.mjpeg"));

        let prev1 = handler.handle(&RtspRequest::new("PREVIOUS", "c.mjpeg").add_header("CSeq", "3"));
        assert_eq!(prev1.headers.iter().find(|(k, _)| k == "New-Filename").map(|(_, v)| v.as_str()), Some("b.mjpeg"));

        let prev2 = handler.handle(&RtspRequest::new("PREVIOUS", "b.mjpeg").add_header("CSeq", "4"));
        assert_eq!(prev2.headers.iter().find(|(k, _)| k == "New-Filename").map(|(_, v)| v.as_str()), Some("a.mjpeg"));
    }

    #[test]
    fn next_without_playlist_is_455() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "a.mjpeg", 3);
        let library = Arc::new(MediaLibrary::new(dir.path()));
        let mut handler = new_handler(library);
        assert_eq!(handler.handle(&setup_request("1")).status_code, 200);
        let resp = handler.handle(&RtspRequest::new("NEXT", "a.mjpeg").add_header("CSeq", "2"));
        assert_eq!(resp.status_code, 455);
    }

    #[test]
    fn setup_rejected_while_playing() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "a.mjpeg", 3);
        let library = Arc::new(MediaLibrary::new(dir.path()));
        let mut handler = new_handler(library);
        assert_eq!(handler.handle(&setup_request("1")).status_code, 200);
        assert_eq!(
            handler
                .handle(&RtspRequest::new("PLAY", "a.mjpeg").add_header("CSeq", "2"))
                .status_code,
            200
        );
        assert_eq!(handler.handle(&setup_request("3")).status_code, 455);
    }
}

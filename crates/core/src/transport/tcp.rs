use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::library::MediaLibrary;
use crate::protocol::{MethodHandler, RtspRequest};
use crate::session::SessionManager;

/// Non-blocking TCP accept loop.
///
/// Checks the `running` flag between accepts with a 50ms poll interval
/// so that [`crate::server::Server::stop`] can terminate it promptly.
/// `max_connections` is an optional bounded-parallelism gate: acceptance
/// blocks (by sleeping and retrying) while the cap is reached, rather
/// than refusing the connection outright.
pub fn accept_loop(
    listener: TcpListener,
    session_manager: SessionManager,
    library: Arc<MediaLibrary>,
    session_name: String,
    max_connections: Option<usize>,
    running: Arc<AtomicBool>,
) {
    let active = Arc::new(AtomicUsize::new(0));

    while running.load(Ordering::SeqCst) {
        if let Some(max) = max_connections
            && active.load(Ordering::SeqCst) >= max
        {
            thread::sleep(Duration::from_millis(50));
            continue;
        }

        match listener.accept() {
            Ok((stream, _)) => {
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                let sm = session_manager.clone();
                let lib = library.clone();
                let name = session_name.clone();
                let r = running.clone();
                let active = active.clone();
                active.fetch_add(1, Ordering::SeqCst);
                thread::spawn(move || {
                    Connection::handle(stream, sm, lib, name, &r);
                    active.fetch_sub(1, Ordering::SeqCst);
                });
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }
    tracing::debug!("accept loop exited");
}

/// A single RTSP client connection: one worker thread, owning at most
/// one session, for the lifetime of the socket.
struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    handler: MethodHandler,
    peer_addr: SocketAddr,
}

impl Connection {
    /// Entry point: set up a connection and run its request loop, then
    /// clean up any session it owns.
    fn handle(
        stream: TcpStream,
        session_manager: SessionManager,
        library: Arc<MediaLibrary>,
        session_name: String,
        running: &Arc<AtomicBool>,
    ) {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(_) => return,
        };

        tracing::info!(%peer_addr, "client connected");

        let reader_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(_) => return,
        };

        let handler = MethodHandler::new(session_manager, library, peer_addr, session_name);

        let mut conn = Connection {
            reader: BufReader::new(reader_stream),
            writer: stream,
            handler,
            peer_addr,
        };

        let reason = conn.run(running);
        conn.cleanup();

        tracing::info!(%peer_addr, reason, "client disconnected");
    }

    /// RTSP request/response loop. Returns the reason the loop exited.
    ///
    /// Per connection, a request is read to completion (request line plus
    /// headers, up to the blank line), dispatched, and its response
    /// written back before the next read — the single TCP connection is
    /// strictly serialized, never pipelined.
    fn run(&mut self, running: &Arc<AtomicBool>) -> &'static str {
        while running.load(Ordering::SeqCst) {
            let mut request_text = String::new();
            loop {
                let mut line = String::new();
                match self.reader.read_line(&mut line) {
                    Ok(0) => return "connection closed by client",
                    Ok(_) => {
                        request_text.push_str(&line);
                        if line == "\r\n" || line == "\n" {
                            break;
                        }
                    }
                    Err(_) => return "read error",
                }
            }

            if request_text.trim().is_empty() {
                continue;
            }

            match RtspRequest::parse(&request_text) {
                Ok(request) => {
                    tracing::debug!(
                        peer = %self.peer_addr,
                        method = %request.method,
                        uri = %request.uri,
                        "request"
                    );

                    let response = self.handler.handle(&request);

                    tracing::debug!(
                        peer = %self.peer_addr,
                        status = response.status_code,
                        "response"
                    );

                    if self
                        .writer
                        .write_all(response.serialize().as_bytes())
                        .is_err()
                    {
                        return "write error";
                    }
                }
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "parse error");
                    return "protocol error";
                }
            }
        }

        "server shutting down"
    }

    /// Release the session owned by this connection, if any — the TCP
    /// disconnect path for S6 (client closes mid-play): the sender is
    /// stopped and joined, the reader dropped, the session id freed.
    fn cleanup(&mut self) {
        if let Some(id) = self.handler.session_id().map(str::to_string) {
            self.handler.teardown_owned_session();
            tracing::info!(peer = %self.peer_addr, session_id = %id, "cleaned up session on disconnect");
        }
    }
}

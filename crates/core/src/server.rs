use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::error::{Result, RtspError};
use crate::library::MediaLibrary;
use crate::session::SessionManager;
use crate::transport::tcp;

/// Server-level configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the RTSP TCP listener on.
    pub bind_addr: String,
    /// Directory containing the served MJPEG files.
    pub video_dir: PathBuf,
    /// Ordered filenames enabling NEXT/PREVIOUS, relative to `video_dir`.
    pub playlist: Option<Vec<String>>,
    /// Session name advertised in SDP `s=` lines.
    pub session_name: String,
    /// Upper bound on concurrently accepted connections. `None` means
    /// unbounded.
    pub max_connections: Option<usize>,
}

impl ServerConfig {
    pub fn new(bind_addr: impl Into<String>, video_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            video_dir: video_dir.into(),
            playlist: None,
            session_name: "mjpeg-rtsp".to_string(),
            max_connections: None,
        }
    }

    pub fn with_playlist(mut self, playlist: Vec<String>) -> Self {
        self.playlist = Some(playlist);
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }
}

/// High-level RTSP server orchestrator: owns the session manager and
/// media library, and runs the TCP acceptor loop on a background thread.
pub struct Server {
    session_manager: SessionManager,
    library: Arc<MediaLibrary>,
    running: Arc<AtomicBool>,
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let library = match &config.playlist {
            Some(playlist) => MediaLibrary::with_playlist(&config.video_dir, playlist.clone()),
            None => MediaLibrary::new(&config.video_dir),
        };
        Self {
            session_manager: SessionManager::new(),
            library: Arc::new(library),
            running: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Bind the listener and spawn the acceptor loop. Returns once the
    /// listener is bound; the accept loop runs on its own thread.
    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(RtspError::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.config.bind_addr)?;
        listener.set_nonblocking(true)?;
        self.running.store(true, Ordering::SeqCst);

        let session_manager = self.session_manager.clone();
        let library = self.library.clone();
        let running = self.running.clone();
        let session_name = self.config.session_name.clone();
        let max_connections = self.config.max_connections;

        tracing::info!(addr = %self.config.bind_addr, "RTSP server listening");

        thread::spawn(move || {
            tcp::accept_loop(
                listener,
                session_manager,
                library,
                session_name,
                max_connections,
                running,
            );
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("server stopping");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    pub fn library(&self) -> &Arc<MediaLibrary> {
        &self.library
    }
}

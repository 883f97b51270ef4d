//! RTSP server-side session: the playback state and RTP sender owned by
//! one accepted connection, from SETUP through TEARDOWN.
//!
//! ```text
//! SETUP          -> Ready
//! PLAY           -> Playing
//! PAUSE          -> Ready    (from Playing)
//! NEXT/PREVIOUS  -> Ready    (no state change; requires Ready on entry)
//! TEARDOWN       -> (removed)
//! TCP disconnect -> (removed, via cleanup)
//! ```

pub mod transport;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::Rng;

use crate::error::Result;
use crate::media::{MjpegReader, RtpSender};

pub use transport::parse_client_port;

/// Server-side session state. There is no separate Paused state: PAUSE
/// drops straight back to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Playing,
}

struct SessionData {
    state: SessionState,
    sender: Option<RtpSender>,
    filename: Option<String>,
    playlist_index: Option<usize>,
}

/// A single RTSP session, created by the first successful SETUP on a
/// connection and torn down by TEARDOWN or disconnect cleanup.
pub struct Session {
    pub id: String,
    data: Mutex<SessionData>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            data: Mutex::new(SessionData {
                state: SessionState::Ready,
                sender: None,
                filename: None,
                playlist_index: None,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.data.lock().state
    }

    pub fn set_state(&self, state: SessionState) {
        self.data.lock().state = state;
    }

    pub fn filename(&self) -> Option<String> {
        self.data.lock().filename.clone()
    }

    pub fn playlist_index(&self) -> Option<usize> {
        self.data.lock().playlist_index
    }

    /// First SETUP for this session, or a SETUP that replaces the
    /// current stream: create the sender if none exists yet (bound to
    /// `peer`, suspended), otherwise swap the reader into the existing
    /// sender.
    pub fn setup(
        &self,
        peer: SocketAddr,
        reader: MjpegReader,
        filename: String,
        playlist_index: Option<usize>,
    ) -> Result<()> {
        let mut data = self.data.lock();
        match &data.sender {
            Some(sender) => sender.swap_stream(reader),
            None => data.sender = Some(RtpSender::spawn(peer, reader)?),
        }
        data.filename = Some(filename);
        data.playlist_index = playlist_index;
        Ok(())
    }

    /// Seek (if requested) and resume delivery.
    pub fn play(&self, seek_to: Option<f64>) -> Result<()> {
        let data = self.data.lock();
        if let Some(sender) = &data.sender {
            if let Some(t) = seek_to {
                sender.seek_time(t)?;
            }
            sender.play();
        }
        Ok(())
    }

    /// Suspend delivery.
    pub fn pause(&self) {
        if let Some(sender) = &self.data.lock().sender {
            sender.pause();
        }
    }

    /// Swap in a new reader for playlist navigation, without touching
    /// the sender's peer or play/pause state.
    pub fn switch_stream(&self, reader: MjpegReader, filename: String, playlist_index: usize) {
        let mut data = self.data.lock();
        if let Some(sender) = &data.sender {
            sender.swap_stream(reader);
        }
        data.filename = Some(filename);
        data.playlist_index = Some(playlist_index);
    }

    /// Stop and join the sender, if any, and clear stream state.
    pub fn teardown(&self) {
        let mut data = self.data.lock();
        if let Some(mut sender) = data.sender.take() {
            sender.close();
        }
        data.filename = None;
        data.playlist_index = None;
        data.state = SessionState::Ready;
    }
}

/// Thread-safe registry of active sessions, keyed by a random 6-digit id.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create and register a new session with a fresh random id.
    pub fn create_session(&self) -> Arc<Session> {
        let mut sessions = self.sessions.write();
        loop {
            let id = random_session_id();
            if !sessions.contains_key(&id) {
                let session = Arc::new(Session::new(id.clone()));
                sessions.insert(id, session.clone());
                return session;
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.write().remove(id)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn random_session_id() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_assigns_six_digit_id() {
        let manager = SessionManager::new();
        let session = manager.create_session();
        assert_eq!(session.id.len(), 6);
        assert!(session.id.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn get_and_remove_round_trip() {
        let manager = SessionManager::new();
        let session = manager.create_session();
        let id = session.id.clone();
        assert!(manager.get(&id).is_some());
        assert!(manager.remove(&id).is_some());
        assert!(manager.get(&id).is_none());
    }
}

//! Resolves stream filenames against a video directory, and an optional
//! ordered playlist for NEXT/PREVIOUS navigation.

use std::path::{Path, PathBuf};

use crate::error::{Result, RtspError};

/// Filename resolver and optional playlist for one server instance.
pub struct MediaLibrary {
    video_dir: PathBuf,
    playlist: Option<Vec<String>>,
}

impl MediaLibrary {
    /// A library with no playlist: every DESCRIBE/SETUP names its file
    /// directly, and NEXT/PREVIOUS always fail.
    pub fn new(video_dir: impl Into<PathBuf>) -> Self {
        Self {
            video_dir: video_dir.into(),
            playlist: None,
        }
    }

    /// A library with a configured playlist, enabling NEXT/PREVIOUS.
    pub fn with_playlist(video_dir: impl Into<PathBuf>, playlist: Vec<String>) -> Self {
        Self {
            video_dir: video_dir.into(),
            playlist: Some(playlist),
        }
    }

    /// Resolve `filename` to a path under the video directory. Rejects
    /// path traversal and missing files.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if filename.contains("..") || filename.starts_with('/') {
            return Err(RtspError::FileNotFound(filename.to_string()));
        }
        let path = self.video_dir.join(filename);
        if path.is_file() {
            Ok(path)
        } else {
            Err(RtspError::FileNotFound(filename.to_string()))
        }
    }

    /// Number of entries in the playlist, or 0 if none is configured.
    pub fn playlist_len(&self) -> usize {
        self.playlist.as_ref().map_or(0, Vec::len)
    }

    /// Filename at a playlist index.
    pub fn playlist_name(&self, index: usize) -> Option<&str> {
        self.playlist
            .as_ref()
            .and_then(|names| names.get(index))
            .map(String::as_str)
    }

    /// Index of `filename` within the playlist, if configured and present.
    pub fn playlist_index_of(&self, filename: &str) -> Option<usize> {
        self.playlist
            .as_ref()
            .and_then(|names| names.iter().position(|n| n == filename))
    }

    /// Advance (`delta = 1`) or retreat (`delta = -1`) a playlist index by
    /// one entry, wrapping modulo the playlist length. Fails if no
    /// playlist is configured.
    pub fn step(&self, index: usize, delta: i64) -> Result<usize> {
        let len = self.playlist_len();
        if len == 0 {
            return Err(RtspError::PlaylistNotConfigured);
        }
        let len = len as i64;
        let next = (index as i64 + delta).rem_euclid(len);
        Ok(next as usize)
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }
}

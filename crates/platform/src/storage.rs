//! Storage abstraction for file systems
//!
//! Blocking, single-owner access: the player holds at most one open file and
//! closes it by dropping the handle.

use heapless::{String, Vec};

use crate::config::{MAX_DIR_ENTRIES, MAX_NAME_LEN, MAX_PATH_LEN};

/// Extensions the decoder can play, compared case-insensitively.
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "wma"];

/// Storage trait for file system access
pub trait Storage {
    /// Error type
    type Error: core::fmt::Debug;
    /// File type
    type File: File;

    /// Open file for reading
    fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error>;

    /// Enumerate `dir`: audio files plus sub-directories, at most
    /// [`MAX_DIR_ENTRIES`] entries, in directory order.
    fn list_audio_files(&mut self, dir: &str) -> Result<TrackList, Self::Error>;
}

/// File trait for reading files
pub trait File {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read from current position; `Ok(0)` is end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Seek to an absolute position
    fn seek(&mut self, pos: u64) -> Result<u64, Self::Error>;

    /// Get file size
    fn size(&self) -> u64;
}

/// One directory entry as seen by track navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    /// File name without directory.
    pub name: String<MAX_NAME_LEN>,
    /// Full path usable with [`Storage::open_file`].
    pub path: String<MAX_PATH_LEN>,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Entry is a directory.
    pub is_directory: bool,
    /// Entry has a playable extension.
    pub is_audio: bool,
}

impl TrackEntry {
    /// Build an entry for `name` inside `dir`.
    ///
    /// Returns `None` when the name or the joined path does not fit.
    pub fn new(dir: &str, name: &str, size: u64, is_directory: bool) -> Option<Self> {
        let mut path: String<MAX_PATH_LEN> = String::new();
        path.push_str(dir).ok()?;
        if !dir.ends_with('/') {
            path.push('/').ok()?;
        }
        path.push_str(name).ok()?;
        Some(Self {
            name: String::try_from(name).ok()?,
            path,
            size,
            is_directory,
            is_audio: !is_directory && is_audio_file(name),
        })
    }
}

/// Bounded result of one directory enumeration.
pub type TrackList = Vec<TrackEntry, MAX_DIR_ENTRIES>;

/// Paths of the playable entries of a listing, in order.
pub fn audio_tracks(list: &TrackList) -> impl Iterator<Item = &TrackEntry> {
    list.iter().filter(|e| e.is_audio)
}

/// `true` when `name` has an audio extension and is not a hidden dot-file.
pub fn is_audio_file(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => AUDIO_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

//! Local filesystem Storage implementation for the desktop simulator.
//!
//! `LocalFileStorage` implements `platform::Storage` using `std::fs`.
//! Used when the `std` feature is enabled (simulator and host tests only).
//! All paths are resolved relative to the `music_root` provided at
//! construction; `/` names the root itself.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::config::MAX_DIR_ENTRIES;
use crate::storage::{File, Storage, TrackEntry, TrackList};

/// Error type for local filesystem operations.
#[derive(Debug)]
pub struct LocalStorageError(pub std::io::Error);

impl core::fmt::Display for LocalStorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "local storage error: {}", self.0)
    }
}

impl std::error::Error for LocalStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// An open file on the local filesystem.
pub struct LocalFile {
    inner: fs::File,
    size: u64,
}

impl File for LocalFile {
    type Error = LocalStorageError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Read::read(&mut self.inner, buf).map_err(LocalStorageError)
    }

    fn seek(&mut self, pos: u64) -> Result<u64, Self::Error> {
        Seek::seek(&mut self.inner, SeekFrom::Start(pos)).map_err(LocalStorageError)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// A `platform::Storage` implementation backed by `std::fs`.
///
/// # Example
/// ```no_run
/// use platform::storage_local::LocalFileStorage;
/// use platform::Storage;
/// let mut storage = LocalFileStorage::new("/home/user/music");
/// let tracks = storage.list_audio_files("/").unwrap();
/// # let _ = tracks;
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `music_root`.
    #[must_use]
    pub fn new(music_root: &str) -> Self {
        Self {
            root: PathBuf::from(music_root),
        }
    }

    /// Create from the `MUSIC_PATH` environment variable.
    ///
    /// Returns `None` if `MUSIC_PATH` is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("MUSIC_PATH").ok().map(|p| Self::new(&p))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for LocalFileStorage {
    type Error = LocalStorageError;
    type File = LocalFile;

    fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        let full = self.resolve(path);
        let file = fs::File::open(&full).map_err(LocalStorageError)?;
        let meta = file.metadata().map_err(LocalStorageError)?;
        Ok(LocalFile {
            inner: file,
            size: meta.len(),
        })
    }

    fn list_audio_files(&mut self, dir: &str) -> Result<TrackList, Self::Error> {
        let (dir, full) = if self.resolve(dir).is_dir() {
            (dir, self.resolve(dir))
        } else {
            tracing::warn!(dir, "music directory missing, listing root");
            ("/", self.root.clone())
        };

        let mut names: Vec<(String, u64, bool)> = Vec::new();
        for entry in fs::read_dir(&full).map_err(LocalStorageError)? {
            let entry = entry.map_err(LocalStorageError)?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let meta = entry.metadata().map_err(LocalStorageError)?;
            names.push((name, meta.len(), meta.is_dir()));
        }
        // read_dir order is platform-defined; sort for a stable track order.
        names.sort_by(|a, b| a.0.cmp(&b.0));

        let mut list = TrackList::new();
        for (name, size, is_dir) in names {
            if list.len() >= MAX_DIR_ENTRIES {
                tracing::debug!(dir, "directory listing truncated");
                break;
            }
            let Some(entry) = TrackEntry::new(dir, &name, if is_dir { 0 } else { size }, is_dir)
            else {
                tracing::debug!(name = name.as_str(), "name too long, skipped");
                continue;
            };
            if entry.is_directory || entry.is_audio {
                // Capacity checked above.
                let _ = list.push(entry);
            }
        }
        Ok(list)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn storage(tmp: &TempDir) -> LocalFileStorage {
        LocalFileStorage::new(tmp.path().to_str().unwrap())
    }

    #[test]
    fn local_storage_read_full_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("test.mp3"), b"hello world").unwrap();
        let mut file = storage(&tmp).open_file("/test.mp3").unwrap();
        let mut buf = [0u8; 11];
        let n = file.read(&mut buf).unwrap();
        assert_eq!(n, 11);
        assert_eq!(&buf, b"hello world");
    }

    #[test]
    fn local_storage_size_matches() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("size.mp3"), [0u8; 64]).unwrap();
        let file = storage(&tmp).open_file("size.mp3").unwrap();
        assert_eq!(file.size(), 64);
    }

    #[test]
    fn local_storage_seek_and_read() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("seek.mp3"), b"ABCDEFGH").unwrap();
        let mut file = storage(&tmp).open_file("seek.mp3").unwrap();
        file.seek(4).unwrap();
        let mut buf = [0u8; 4];
        file.read(&mut buf).unwrap();
        assert_eq!(&buf, b"EFGH");
    }

    #[test]
    fn local_storage_open_missing_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(storage(&tmp).open_file("missing.mp3").is_err());
    }

    #[test]
    fn listing_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.MP3"), b"x").unwrap();
        fs::write(tmp.path().join("a.wav"), b"xy").unwrap();
        fs::write(tmp.path().join("cover.jpg"), b"x").unwrap();
        fs::write(tmp.path().join(".hidden.mp3"), b"x").unwrap();
        fs::create_dir(tmp.path().join("album")).unwrap();

        let list = storage(&tmp).list_audio_files("/").unwrap();
        let names: Vec<&str> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.wav", "album", "b.MP3"]);
        assert_eq!(list[0].path.as_str(), "/a.wav");
        assert_eq!(list[0].size, 2);
        assert!(list[1].is_directory);
        assert!(!list[1].is_audio);
    }

    #[test]
    fn listing_subdirectory_builds_paths() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("music")).unwrap();
        fs::write(tmp.path().join("music").join("t.mp3"), b"x").unwrap();

        let mut s = storage(&tmp);
        let list = s.list_audio_files("/music").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].path.as_str(), "/music/t.mp3");
        assert!(s.open_file(list[0].path.as_str()).is_ok());
    }

    #[test]
    fn missing_directory_falls_back_to_root() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("root.mp3"), b"x").unwrap();
        let list = storage(&tmp).list_audio_files("/nope").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].path.as_str(), "/root.mp3");
    }

    #[test]
    fn listing_is_capped() {
        let tmp = TempDir::new().unwrap();
        for i in 0..(MAX_DIR_ENTRIES + 4) {
            fs::write(tmp.path().join(format!("t{i:02}.mp3")), b"x").unwrap();
        }
        let list = storage(&tmp).list_audio_files("/").unwrap();
        assert_eq!(list.len(), MAX_DIR_ENTRIES);
    }
}

//! Application configuration and constants
//!
//! Central configuration values used across the workspace. Capacities are
//! compile-time because track lists and paths live in `heapless` containers.

/// The application name
pub const APP_NAME: &str = "VS Stream Player";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of entries kept per directory listing.
pub const MAX_DIR_ENTRIES: usize = 16;

/// Maximum length of a file name (bytes).
pub const MAX_NAME_LEN: usize = 64;

/// Maximum length of a full path (bytes).
pub const MAX_PATH_LEN: usize = 128;

/// Player volume on power-up (percent).
pub const DEFAULT_VOLUME: u8 = 70;

/// Percent added or removed by one volume-up/down request.
pub const VOLUME_STEP: u8 = 10;

/// Bytes read from a file per refill.
pub const READ_BLOCK_LEN: usize = 512;

/// Default music directory.
pub const DEFAULT_MUSIC_DIR: &str = "/";

//! Playback session state and track navigation policy.

use heapless::String;
use platform::audio_types::VolumePercent;
use platform::config::MAX_PATH_LEN;
use rand::Rng;

/// Draws before random selection gives up on finding a different index.
const RANDOM_MAX_DRAWS: u32 = 64;

/// Track selection policy for next/previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayMode {
    /// Step by one, stop at either end.
    #[default]
    Single,
    /// Replay the current track.
    RepeatOne,
    /// Step by one, wrapping around.
    RepeatAll,
    /// Any track other than the current one.
    Random,
}

impl PlayMode {
    /// The mode after this one in the button cycle.
    pub fn cycle(self) -> Self {
        match self {
            Self::Single => Self::RepeatOne,
            Self::RepeatOne => Self::RepeatAll,
            Self::RepeatAll => Self::Random,
            Self::Random => Self::Single,
        }
    }

    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::RepeatOne => "repeat-one",
            Self::RepeatAll => "repeat-all",
            Self::Random => "random",
        }
    }
}

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Next track.
    Forward,
    /// Previous track.
    Backward,
}

/// Resolve the index to play next.
///
/// `current` is clamped into `0..count` first. Returns `None` for an empty
/// list and at the ends of the list in [`PlayMode::Single`].
pub fn resolve_index<R: Rng + ?Sized>(
    mode: PlayMode,
    current: usize,
    count: usize,
    direction: Direction,
    rng: &mut R,
) -> Option<usize> {
    let last = count.checked_sub(1)?;
    let current = current.min(last);
    match (mode, direction) {
        (PlayMode::RepeatOne, _) => Some(current),
        (PlayMode::Single, Direction::Forward) => current.checked_add(1).filter(|&i| i <= last),
        (PlayMode::Single, Direction::Backward) => current.checked_sub(1),
        (PlayMode::RepeatAll, Direction::Forward) => {
            Some(if current >= last { 0 } else { current.saturating_add(1) })
        }
        (PlayMode::RepeatAll, Direction::Backward) => {
            Some(current.checked_sub(1).unwrap_or(last))
        }
        (PlayMode::Random, _) => Some(random_other(current, count, rng)),
    }
}

/// Redraw until the pick differs from `current`.
fn random_other<R: Rng + ?Sized>(current: usize, count: usize, rng: &mut R) -> usize {
    if count <= 1 {
        return current;
    }
    for _ in 0..RANDOM_MAX_DRAWS {
        let pick = rng.gen_range(0..count);
        if pick != current {
            return pick;
        }
    }
    // A generator stuck on one value still has to move on.
    current.saturating_add(1).checked_rem(count).unwrap_or(0)
}

/// Player-level session state.
///
/// Invariant: `paused` implies `playing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    path: String<MAX_PATH_LEN>,
    playing: bool,
    paused: bool,
    decode_time: u16,
    index: usize,
    mode: PlayMode,
    volume: VolumePercent,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(VolumePercent::default(), PlayMode::default())
    }
}

impl PlaybackSession {
    /// A stopped session.
    pub fn new(volume: VolumePercent, mode: PlayMode) -> Self {
        Self {
            path: String::new(),
            playing: false,
            paused: false,
            decode_time: 0,
            index: 0,
            mode,
            volume,
        }
    }

    /// Record a new track about to start; flags stay cleared until
    /// [`PlaybackSession::mark_playing`].
    ///
    /// A path longer than the session buffer is truncated at a character
    /// boundary; the file itself was opened with the full path.
    pub fn begin_track(&mut self, path: &str) {
        self.path.clear();
        for c in path.chars() {
            if self.path.push(c).is_err() {
                break;
            }
        }
        self.playing = false;
        self.paused = false;
        self.decode_time = 0;
    }

    /// The decoder accepted the stream.
    pub fn mark_playing(&mut self) {
        self.playing = true;
        self.paused = false;
    }

    /// Pause if playing. Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        if self.playing && !self.paused {
            self.paused = true;
            true
        } else {
            false
        }
    }

    /// Resume if paused. Returns `true` if the state changed.
    pub fn resume(&mut self) -> bool {
        if self.paused {
            self.paused = false;
            true
        } else {
            false
        }
    }

    /// Clear the playing flags and the decode time.
    pub fn stop(&mut self) {
        self.playing = false;
        self.paused = false;
        self.decode_time = 0;
    }

    /// Path of the current or last track.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// A track is playing (possibly paused).
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playback is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last sampled decode time in seconds.
    pub fn decode_time(&self) -> u16 {
        self.decode_time
    }

    /// Store a decode-time sample; returns `true` if it changed.
    pub fn set_decode_time(&mut self, secs: u16) -> bool {
        let changed = self.decode_time != secs;
        self.decode_time = secs;
        changed
    }

    /// Index into the audio entries of the last listing.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Commit a resolved index.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Navigation policy.
    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Change the navigation policy.
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.mode = mode;
    }

    /// Session volume.
    pub fn volume(&self) -> VolumePercent {
        self.volume
    }

    /// Store the session volume.
    pub fn set_volume(&mut self, volume: VolumePercent) {
        self.volume = volume;
    }
}

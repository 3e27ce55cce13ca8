//! Status reporting out of the player.
//!
//! The player never renders anything itself. It pushes events into a
//! [`StatusSink`] and answers [`PlayerStatus`] snapshots for callers that
//! prefer polling.

use heapless::String;
use platform::audio_types::VolumePercent;
use platform::config::MAX_PATH_LEN;

use crate::decoder::DecoderState;
use crate::player::PlayerError;
use crate::session::PlayMode;

/// Receiver for player events. Every method defaults to a no-op.
pub trait StatusSink {
    /// The decoder moved to a new state.
    fn on_state_changed(&mut self, _state: DecoderState) {}

    /// An operation failed.
    fn on_error(&mut self, _error: PlayerError) {}

    /// A new decode-time sample, in seconds.
    fn on_time(&mut self, _secs: u16) {}

    /// The volume changed.
    fn on_volume(&mut self, _volume: VolumePercent) {}

    /// A track ended (end of file or read error).
    fn on_track_finished(&mut self, _path: &str) {}
}

impl StatusSink for () {}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn on_state_changed(&mut self, state: DecoderState) {
        (**self).on_state_changed(state);
    }

    fn on_error(&mut self, error: PlayerError) {
        (**self).on_error(error);
    }

    fn on_time(&mut self, secs: u16) {
        (**self).on_time(secs);
    }

    fn on_volume(&mut self, volume: VolumePercent) {
        (**self).on_volume(volume);
    }

    fn on_track_finished(&mut self, path: &str) {
        (**self).on_track_finished(path);
    }
}

/// Point-in-time view of the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    /// Decoder state.
    pub state: DecoderState,
    /// Current or last track path (empty before the first play).
    pub file: String<MAX_PATH_LEN>,
    /// Index into the audio entries of the music directory.
    pub index: usize,
    /// Decoded seconds at the last sample.
    pub time_secs: u16,
    /// Track length estimated from file size and stream byte rate.
    pub total_secs: Option<u32>,
    /// Volume.
    pub volume: VolumePercent,
    /// Navigation policy.
    pub mode: PlayMode,
}

/// Estimate a track length from its size and the decoder's byte rate.
///
/// `None` until the decoder reports a nonzero rate.
pub fn estimate_total_secs(file_size: u64, byte_rate: u16) -> Option<u32> {
    let secs = file_size.checked_div(u64::from(byte_rate))?;
    Some(u32::try_from(secs).unwrap_or(u32::MAX))
}

//! Playback state machine.
//!
//! [`AudioPlayer`] owns the decoder driver, the storage collaborator, the
//! stream pump and the session. It runs in one of two modes:
//!
//! - **Cooperative**: the caller invokes [`AudioPlayer::task`] from its main
//!   loop. Each call does at most one pump tick and never waits on DREQ.
//! - **Blocking**: [`AudioPlayer::play_blocking`] and
//!   [`AudioPlayer::run_playlist_blocking`] loop over the same pump tick,
//!   waiting for DREQ with a bounded budget and polling buttons between
//!   ticks.
//!
//! ```text
//! play(path) ──► stop current ──► open + skip tag ──► start_decode ──► playing
//!                                      │ err               │ err
//!                                      ▼                   ▼
//!                               FileOpenFailed      NotReady / BusTimeout
//! ```

use heapless::{String, Vec};
use platform::audio_types::VolumePercent;
use platform::config::{
    DEFAULT_MUSIC_DIR, DEFAULT_VOLUME, MAX_DIR_ENTRIES, MAX_PATH_LEN, VOLUME_STEP,
};
use platform::storage::audio_tracks;
use platform::{Button, DecoderBus, InputDevice, InputEvent, Storage, WaitStrategy};
use rand::RngCore;
use thiserror_no_std::Error;

use crate::decoder::{ChipVariant, DecoderError, DecoderState, Vs1053};
use crate::session::{resolve_index, Direction, PlayMode, PlaybackSession};
use crate::status::{estimate_total_secs, PlayerStatus, StatusSink};
use crate::stream::{StreamCursor, StreamEnd, StreamPump, TickOutcome};

/// Delay between input polls while paused in blocking mode.
const PAUSE_POLL_MS: u32 = 10;

/// Player failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerError {
    /// Decoder not initialized or in the `Error` state.
    #[error("decoder not ready")]
    NotReady,
    /// DREQ never came good within the budget.
    #[error("decoder bus timeout")]
    BusTimeout,
    /// Decoder self-test failed during initialization.
    #[error("decoder self-test failed")]
    SelfTestFailed,
    /// Decoder rejected a plugin image.
    #[error("malformed plugin image")]
    MalformedPlugin,
    /// The track could not be opened.
    #[error("could not open track")]
    FileOpenFailed,
    /// The track could not be read.
    #[error("could not read track")]
    FileReadError,
    /// The music directory holds no playable files.
    #[error("no tracks")]
    EmptyTrackList,
    /// `Single` mode is at the end of the list.
    #[error("no more tracks")]
    NoMoreTracks,
}

impl From<DecoderError> for PlayerError {
    fn from(e: DecoderError) -> Self {
        match e {
            DecoderError::NotReady => Self::NotReady,
            DecoderError::BusTimeout => Self::BusTimeout,
            DecoderError::SelfTestFailed => Self::SelfTestFailed,
            DecoderError::MalformedPlugin => Self::MalformedPlugin,
        }
    }
}

/// How a blocking play ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockingExit {
    /// The whole file was played.
    Finished,
    /// Next button.
    Next,
    /// Previous button.
    Previous,
    /// Back button.
    Stopped,
}

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Volume before the first change, 0 to 100.
    pub default_volume: u8,
    /// Step for [`AudioPlayer::volume_up`] and [`AudioPlayer::volume_down`].
    pub volume_step: u8,
    /// Navigation policy at start.
    pub default_mode: PlayMode,
    /// Directory enumerated for navigation.
    pub music_dir: String<MAX_PATH_LEN>,
    /// Start the next track when one ends in cooperative mode.
    pub auto_advance: bool,
    /// Minimum time between decode-time samples in [`AudioPlayer::task`].
    pub time_sample_interval_ms: u64,
    /// Per-block DREQ budget in blocking mode.
    pub blocking_ready_budget_ms: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let mut music_dir = String::new();
        // Fits: the default is a single character.
        let _ = music_dir.push_str(DEFAULT_MUSIC_DIR);
        Self {
            default_volume: DEFAULT_VOLUME,
            volume_step: VOLUME_STEP,
            default_mode: PlayMode::Single,
            music_dir,
            auto_advance: true,
            time_sample_interval_ms: 1000,
            blocking_ready_budget_ms: 1000,
        }
    }
}

impl PlayerConfig {
    /// Same configuration with another music directory.
    ///
    /// Returns `None` when `dir` does not fit a path buffer.
    pub fn with_music_dir(mut self, dir: &str) -> Option<Self> {
        self.music_dir = String::try_from(dir).ok()?;
        Some(self)
    }
}

type TrackPaths = Vec<String<MAX_PATH_LEN>, MAX_DIR_ENTRIES>;

/// The player composite.
pub struct AudioPlayer<B, W, S: Storage, R, K = ()> {
    decoder: Vs1053<B, W>,
    storage: S,
    pump: StreamPump<S::File>,
    session: PlaybackSession,
    rng: R,
    sink: K,
    config: PlayerConfig,
    last_sample_ms: Option<u64>,
}

impl<B, W, S, R> AudioPlayer<B, W, S, R, ()>
where
    B: DecoderBus,
    W: WaitStrategy,
    S: Storage,
    R: RngCore,
{
    /// Player without a status sink. Call [`AudioPlayer::init`] before use.
    pub fn new(decoder: Vs1053<B, W>, storage: S, rng: R, config: PlayerConfig) -> Self {
        let session = PlaybackSession::new(
            VolumePercent::new(config.default_volume),
            config.default_mode,
        );
        Self {
            decoder,
            storage,
            pump: StreamPump::new(),
            session,
            rng,
            sink: (),
            config,
            last_sample_ms: None,
        }
    }
}

impl<B, W, S, R, K> AudioPlayer<B, W, S, R, K>
where
    B: DecoderBus,
    W: WaitStrategy,
    S: Storage,
    R: RngCore,
    K: StatusSink,
{
    /// Replace the status sink.
    pub fn with_sink<K2: StatusSink>(self, sink: K2) -> AudioPlayer<B, W, S, R, K2> {
        AudioPlayer {
            decoder: self.decoder,
            storage: self.storage,
            pump: self.pump,
            session: self.session,
            rng: self.rng,
            sink,
            config: self.config,
            last_sample_ms: self.last_sample_ms,
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    /// Bring up the decoder and apply the session volume.
    pub fn init(&mut self) -> Result<ChipVariant, PlayerError> {
        let result = self.decoder.initialize().map_err(PlayerError::from);
        self.sink.on_state_changed(self.decoder.state());
        let variant = self.reported(result)?;
        let volume = self.session.volume();
        self.decoder.set_volume(volume);
        Ok(variant)
    }

    /// Decoder initialized and usable.
    pub fn is_ready(&self) -> bool {
        self.decoder.is_ready()
    }

    /// Stop, forget the session and mark the decoder uninitialized.
    pub fn deinit(&mut self) {
        if let Err(e) = self.halt() {
            tracing::warn!(error = ?e, "stop during deinit failed");
        }
        self.decoder.deinit();
        self.session = PlaybackSession::new(
            VolumePercent::new(self.config.default_volume),
            self.config.default_mode,
        );
        self.last_sample_ms = None;
    }

    // ── Transport ──────────────────────────────────────────────────────────

    /// Stop whatever plays and start `path`.
    ///
    /// On failure the session is left stopped.
    pub fn play(&mut self, path: &str) -> Result<(), PlayerError> {
        let result = self.start_track(path);
        self.reported(result)
    }

    /// Pause if playing. Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        if !self.session.pause() {
            return false;
        }
        self.decoder.pause();
        tracing::info!("paused");
        self.sink.on_state_changed(self.decoder.state());
        true
    }

    /// Resume if paused. Returns `true` if the state changed.
    pub fn resume(&mut self) -> bool {
        if !self.session.resume() {
            return false;
        }
        self.decoder.resume();
        tracing::info!("resumed");
        self.sink.on_state_changed(self.decoder.state());
        true
    }

    /// Close the file and bring the decoder back to `Idle`.
    ///
    /// Safe to call at any time; a second call does nothing.
    pub fn stop(&mut self) -> Result<(), PlayerError> {
        let result = self.halt();
        self.reported(result)
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    /// Play the next track according to the play mode.
    pub fn next(&mut self) -> Result<(), PlayerError> {
        let result = self.navigate(Direction::Forward);
        self.reported(result)
    }

    /// Play the previous track according to the play mode.
    pub fn prev(&mut self) -> Result<(), PlayerError> {
        let result = self.navigate(Direction::Backward);
        self.reported(result)
    }

    /// Replay the current track.
    ///
    /// This is the session path, which may lie outside the music directory
    /// when it was started with [`AudioPlayer::play`]. Before anything has
    /// played, the track at the session index (clamped to the list) is used.
    pub fn play_current(&mut self) -> Result<(), PlayerError> {
        let result = if self.session.path().is_empty() {
            self.play_at(self.session.index())
        } else {
            self.replay()
        };
        self.reported(result)
    }

    /// Play the first track of the music directory.
    pub fn play_first(&mut self) -> Result<(), PlayerError> {
        let result = self.play_at(0);
        self.reported(result)
    }

    /// Change the play mode.
    pub fn set_mode(&mut self, mode: PlayMode) {
        tracing::info!(mode = mode.label(), "play mode");
        self.session.set_mode(mode);
    }

    /// Current play mode.
    pub fn mode(&self) -> PlayMode {
        self.session.mode()
    }

    // ── Volume ─────────────────────────────────────────────────────────────

    /// Set the volume in percent, clamped to 100. Returns the stored value.
    pub fn set_volume(&mut self, volume: u8) -> VolumePercent {
        self.apply_volume(VolumePercent::new(volume))
    }

    /// Current volume.
    pub fn volume(&self) -> VolumePercent {
        self.session.volume()
    }

    /// One step louder.
    pub fn volume_up(&mut self) -> VolumePercent {
        let volume = self.session.volume().step_up(self.config.volume_step);
        self.apply_volume(volume)
    }

    /// One step quieter.
    pub fn volume_down(&mut self) -> VolumePercent {
        let volume = self.session.volume().step_down(self.config.volume_step);
        self.apply_volume(volume)
    }

    // ── Cooperative mode ───────────────────────────────────────────────────

    /// One unit of cooperative work at time `now_ms`.
    ///
    /// Does nothing unless a track is playing and not paused. Samples the
    /// decode time at most once per configured interval and, when a track
    /// ends, advances if configured to.
    pub fn task(&mut self, now_ms: u64) -> TickOutcome {
        if !self.session.is_playing() || self.session.is_paused() || !self.pump.is_open() {
            return TickOutcome::Idle;
        }
        let outcome = self.pump.tick(&mut self.decoder);
        match outcome {
            TickOutcome::Finished(end) => self.on_stream_end(end),
            TickOutcome::Idle | TickOutcome::Busy | TickOutcome::Sent(_) => {
                self.sample_time_at(now_ms);
            }
        }
        outcome
    }

    // ── Blocking mode ──────────────────────────────────────────────────────

    /// Play `path` to completion, polling `input` between blocks.
    ///
    /// Must not be mixed with [`AudioPlayer::task`] calls.
    pub fn play_blocking<I: InputDevice>(
        &mut self,
        path: &str,
        mut input: I,
    ) -> Result<BlockingExit, PlayerError> {
        let result = self.run_blocking(path, &mut input);
        self.reported(result)
    }

    /// Play the music directory from the session index until the play
    /// mode runs out of tracks or `Back` is pressed.
    ///
    /// Tracks that fail to open or read are skipped; the call fails once
    /// every track in a row has failed.
    pub fn run_playlist_blocking<I: InputDevice>(&mut self, mut input: I) -> Result<(), PlayerError> {
        let paths = self.track_paths();
        let mut paths = self.reported(paths)?;
        let mut index = self.session.index().min(paths.len().saturating_sub(1));
        let mut failures = 0usize;

        loop {
            let Some(path) = paths.get(index).cloned() else {
                return Ok(());
            };
            self.session.set_index(index);
            let direction = match self.run_blocking(&path, &mut input) {
                Ok(BlockingExit::Finished | BlockingExit::Next) => {
                    failures = 0;
                    Direction::Forward
                }
                Ok(BlockingExit::Previous) => {
                    failures = 0;
                    Direction::Backward
                }
                Ok(BlockingExit::Stopped) => return Ok(()),
                Err(e @ (PlayerError::FileOpenFailed | PlayerError::FileReadError)) => {
                    self.sink.on_error(e);
                    failures = failures.saturating_add(1);
                    if failures >= paths.len() {
                        tracing::warn!("every track failed, giving up");
                        return Err(e);
                    }
                    tracing::warn!(path = path.as_str(), error = ?e, "skipping track");
                    Direction::Forward
                }
                Err(e) => return self.reported(Err(e)),
            };

            let refreshed = self.track_paths();
            paths = self.reported(refreshed)?;
            let mode = self.session.mode();
            match resolve_index(mode, index, paths.len(), direction, &mut self.rng) {
                Some(next) => index = next,
                None => {
                    tracing::info!("end of track list");
                    return Ok(());
                }
            }
        }
    }

    // ── Queries ────────────────────────────────────────────────────────────

    /// Snapshot for display.
    pub fn status(&mut self) -> PlayerStatus {
        let size = self.pump.cursor().map(StreamCursor::file_size);
        let total_secs = match size {
            Some(size) if self.session.is_playing() => {
                estimate_total_secs(size, self.decoder.byte_rate())
            }
            _ => None,
        };
        let mut file = String::new();
        // Same capacity as the session path.
        let _ = file.push_str(self.session.path());
        PlayerStatus {
            state: self.decoder.state(),
            file,
            index: self.session.index(),
            time_secs: self.session.decode_time(),
            total_secs,
            volume: self.session.volume(),
            mode: self.session.mode(),
        }
    }

    /// A track is playing (possibly paused).
    pub fn is_playing(&self) -> bool {
        self.session.is_playing()
    }

    /// Playback is paused.
    pub fn is_paused(&self) -> bool {
        self.session.is_paused()
    }

    /// Path of the current or last track.
    pub fn current_file(&self) -> Option<&str> {
        let path = self.session.path();
        (!path.is_empty()).then_some(path)
    }

    /// Seconds decoded at the last sample.
    pub fn play_time(&self) -> u16 {
        self.session.decode_time()
    }

    /// Session index.
    pub fn current_index(&self) -> usize {
        self.session.index()
    }

    /// The pump's state.
    pub fn pump(&self) -> &StreamPump<S::File> {
        &self.pump
    }

    /// The decoder driver.
    pub fn decoder(&self) -> &Vs1053<B, W> {
        &self.decoder
    }

    /// The decoder driver, for diagnostics such as the sine test.
    pub fn decoder_mut(&mut self) -> &mut Vs1053<B, W> {
        &mut self.decoder
    }

    /// The storage collaborator.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The status sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// The configuration.
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    // ── Internals ──────────────────────────────────────────────────────────

    fn reported<T>(&mut self, result: Result<T, PlayerError>) -> Result<T, PlayerError> {
        if let Err(e) = result {
            tracing::warn!(error = ?e, "player operation failed");
            self.sink.on_error(e);
        }
        result
    }

    fn start_track(&mut self, path: &str) -> Result<(), PlayerError> {
        self.halt()?;
        if !self.decoder.is_ready() {
            return Err(PlayerError::NotReady);
        }
        self.session.begin_track(path);
        self.last_sample_ms = None;

        let file = self.storage.open_file(path).map_err(|e| {
            tracing::warn!(path, error = ?e, "open failed");
            PlayerError::FileOpenFailed
        })?;
        self.pump.open(file).map_err(|e| {
            tracing::warn!(path, error = ?e, "header read failed");
            PlayerError::FileReadError
        })?;

        if let Err(e) = self.decoder.start_decode() {
            self.pump.close();
            self.session.stop();
            return Err(e.into());
        }
        self.session.mark_playing();
        tracing::info!(path, index = self.session.index(), "track started");
        self.sink.on_state_changed(self.decoder.state());
        Ok(())
    }

    /// Stop without reporting to the sink.
    fn halt(&mut self) -> Result<(), PlayerError> {
        let streaming = self.pump.is_open();
        self.pump.close();
        self.session.stop();
        if !self.decoder.is_ready() {
            return Ok(());
        }

        let before = self.decoder.state();
        let result = match before {
            DecoderState::Playing | DecoderState::Paused if streaming => {
                self.decoder.cancel_decode().map(|tier| {
                    tracing::debug!(%tier, "stream cancelled");
                })
            }
            DecoderState::Playing | DecoderState::Paused | DecoderState::Stopped => {
                self.decoder.stop()
            }
            DecoderState::Idle | DecoderState::Error => Ok(()),
        };
        if self.decoder.state() != before {
            tracing::info!("stopped");
            self.sink.on_state_changed(self.decoder.state());
        }
        result.map_err(PlayerError::from)
    }

    fn track_paths(&mut self) -> Result<TrackPaths, PlayerError> {
        let list = self
            .storage
            .list_audio_files(&self.config.music_dir)
            .map_err(|e| {
                tracing::warn!(error = ?e, "track listing failed");
                PlayerError::EmptyTrackList
            })?;
        let mut paths = TrackPaths::new();
        for entry in audio_tracks(&list) {
            if paths.push(entry.path.clone()).is_err() {
                break;
            }
        }
        if paths.is_empty() {
            return Err(PlayerError::EmptyTrackList);
        }
        Ok(paths)
    }

    fn navigate(&mut self, direction: Direction) -> Result<(), PlayerError> {
        if !self.decoder.is_ready() {
            return Err(PlayerError::NotReady);
        }
        let paths = self.track_paths()?;
        let mode = self.session.mode();
        let index = resolve_index(
            mode,
            self.session.index(),
            paths.len(),
            direction,
            &mut self.rng,
        )
        .ok_or(PlayerError::NoMoreTracks)?;
        let path = paths.get(index).ok_or(PlayerError::EmptyTrackList)?;
        self.session.set_index(index);
        self.start_track(path)
    }

    fn play_at(&mut self, index: usize) -> Result<(), PlayerError> {
        if !self.decoder.is_ready() {
            return Err(PlayerError::NotReady);
        }
        let paths = self.track_paths()?;
        let index = index.min(paths.len().saturating_sub(1));
        let path = paths.get(index).ok_or(PlayerError::EmptyTrackList)?;
        self.session.set_index(index);
        self.start_track(path)
    }

    fn replay(&mut self) -> Result<(), PlayerError> {
        if !self.decoder.is_ready() {
            return Err(PlayerError::NotReady);
        }
        let path: String<MAX_PATH_LEN> = String::try_from(self.session.path())
            .map_err(|_| PlayerError::FileOpenFailed)?;
        self.start_track(&path)
    }

    fn apply_volume(&mut self, volume: VolumePercent) -> VolumePercent {
        self.session.set_volume(volume);
        self.decoder.set_volume(volume);
        tracing::debug!(volume = volume.get(), "volume");
        self.sink.on_volume(volume);
        volume
    }

    fn sample_time_at(&mut self, now_ms: u64) {
        let due = self.last_sample_ms.map_or(true, |last| {
            now_ms.saturating_sub(last) >= self.config.time_sample_interval_ms
        });
        if due {
            self.last_sample_ms = Some(now_ms);
            self.sample_time();
        }
    }

    fn sample_time(&mut self) {
        let secs = self.decoder.decode_time();
        if self.session.set_decode_time(secs) {
            self.sink.on_time(secs);
        }
    }

    /// Bookkeeping once the pump has closed the file.
    fn finish_track(&mut self, end: StreamEnd) {
        self.session.stop();
        self.pump.close();
        self.decoder.end_stream();
        tracing::info!(path = self.session.path(), ?end, "track finished");
        self.sink.on_track_finished(self.session.path());
        self.sink.on_state_changed(self.decoder.state());
    }

    fn on_stream_end(&mut self, end: StreamEnd) {
        self.finish_track(end);
        if end == StreamEnd::ReadError {
            self.sink.on_error(PlayerError::FileReadError);
            if self.session.mode() == PlayMode::RepeatOne {
                return;
            }
        }
        if !self.config.auto_advance {
            return;
        }
        // Unopenable tracks are skipped, at most once per listed track.
        let attempts = self.track_paths().map_or(1, |paths| paths.len());
        for _ in 0..attempts {
            match self.navigate(Direction::Forward) {
                Ok(()) => return,
                Err(PlayerError::NoMoreTracks) => {
                    tracing::info!("end of track list");
                    return;
                }
                Err(e @ (PlayerError::FileOpenFailed | PlayerError::FileReadError)) => {
                    let _ = self.reported::<()>(Err(e));
                    if self.session.mode() == PlayMode::RepeatOne {
                        return;
                    }
                    tracing::warn!(path = self.session.path(), "skipping track");
                }
                Err(e) => {
                    let _ = self.reported::<()>(Err(e));
                    return;
                }
            }
        }
        tracing::warn!("every track failed, giving up");
    }

    fn run_blocking<I: InputDevice>(
        &mut self,
        path: &str,
        input: &mut I,
    ) -> Result<BlockingExit, PlayerError> {
        self.start_track(path)?;
        loop {
            if let Some(event) = input.poll_event() {
                if let Some(exit) = self.blocking_button(event)? {
                    return Ok(exit);
                }
            }
            if self.session.is_paused() {
                self.decoder.delay_ms(PAUSE_POLL_MS);
                continue;
            }
            match self.pump.tick(&mut self.decoder) {
                TickOutcome::Sent(_) => self.sample_time(),
                TickOutcome::Busy => {
                    if !self
                        .decoder
                        .wait_data_ready(self.config.blocking_ready_budget_ms)
                    {
                        tracing::warn!("decoder stuck busy, cancelling stream");
                        if let Err(e) = self.halt() {
                            tracing::warn!(error = ?e, "recovery failed");
                        }
                        return Err(PlayerError::BusTimeout);
                    }
                }
                TickOutcome::Finished(StreamEnd::EndOfFile) => {
                    self.finish_track(StreamEnd::EndOfFile);
                    return Ok(BlockingExit::Finished);
                }
                TickOutcome::Finished(StreamEnd::ReadError) => {
                    self.finish_track(StreamEnd::ReadError);
                    return Err(PlayerError::FileReadError);
                }
                TickOutcome::Idle => return Ok(BlockingExit::Stopped),
            }
        }
    }

    fn blocking_button(&mut self, event: InputEvent) -> Result<Option<BlockingExit>, PlayerError> {
        let Some(button) = event.pressed() else {
            return Ok(None);
        };
        let exit = match button {
            Button::Next => Some(BlockingExit::Next),
            Button::Previous => Some(BlockingExit::Previous),
            Button::Back => Some(BlockingExit::Stopped),
            Button::Play => {
                if !self.pause() {
                    self.resume();
                }
                None
            }
            Button::VolumeUp => {
                self.volume_up();
                None
            }
            Button::VolumeDown => {
                self.volume_down();
                None
            }
            Button::Mode => {
                self.set_mode(self.mode().cycle());
                None
            }
        };
        if exit.is_some() {
            self.halt()?;
        }
        Ok(exit)
    }
}

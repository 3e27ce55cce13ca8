//! Application loop: buttons in, player commands out.
//!
//! [`DapApp`] owns the player and one [`InputDevice`]. The main loop calls
//! [`DapApp::poll`] with a millisecond clock; each call drains pending input
//! and runs one cooperative player tick.

use platform::audio_types::VolumePercent;
use platform::{Button, DecoderBus, InputDevice, InputEvent, Storage, WaitStrategy};
use playback::{AudioPlayer, DecoderState, PlayerError, StatusSink, TickOutcome};
use rand::RngCore;

/// Upper bound on input events handled per [`DapApp::poll`].
pub const MAX_EVENTS_PER_POLL: usize = 16;

/// [`StatusSink`] that writes player events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus {
    errors: u32,
    finished: u32,
}

impl LogStatus {
    /// Errors seen so far.
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Tracks played to the end.
    pub fn finished(&self) -> u32 {
        self.finished
    }
}

impl StatusSink for LogStatus {
    fn on_state_changed(&mut self, state: DecoderState) {
        tracing::info!(?state, "decoder");
    }

    fn on_error(&mut self, error: PlayerError) {
        self.errors = self.errors.saturating_add(1);
        tracing::warn!(%error, "player");
    }

    fn on_time(&mut self, secs: u16) {
        tracing::debug!(secs, "decode time");
    }

    fn on_volume(&mut self, volume: VolumePercent) {
        tracing::info!(volume = volume.get(), "volume");
    }

    fn on_track_finished(&mut self, path: &str) {
        self.finished = self.finished.saturating_add(1);
        tracing::info!(path, "track finished");
    }
}

/// The player application.
pub struct DapApp<B, W, S: Storage, R, K, I> {
    player: AudioPlayer<B, W, S, R, K>,
    input: I,
}

impl<B, W, S, R, K, I> DapApp<B, W, S, R, K, I>
where
    B: DecoderBus,
    W: WaitStrategy,
    S: Storage,
    R: RngCore,
    K: StatusSink,
    I: InputDevice,
{
    /// App over an initialized or uninitialized player.
    pub fn new(player: AudioPlayer<B, W, S, R, K>, input: I) -> Self {
        Self { player, input }
    }

    /// Act on one input event.
    ///
    /// | Event            | Action                                        |
    /// |------------------|-----------------------------------------------|
    /// | Play             | pause, resume, or start the current track     |
    /// | Next / Previous  | navigate by the play mode                     |
    /// | VolumeUp / Down  | one volume step                               |
    /// | Mode             | cycle the play mode                           |
    /// | Back             | stop                                          |
    /// | long Play        | stop                                          |
    ///
    /// Releases and other long presses are ignored.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<(), PlayerError> {
        let button = match event {
            InputEvent::ButtonPress(button) => button,
            InputEvent::ButtonLongPress(Button::Play) => return self.player.stop(),
            InputEvent::ButtonRelease(_) | InputEvent::ButtonLongPress(_) => return Ok(()),
        };
        match button {
            Button::Play => self.toggle_play(),
            Button::Next => self.player.next(),
            Button::Previous => self.player.prev(),
            Button::VolumeUp => {
                self.player.volume_up();
                Ok(())
            }
            Button::VolumeDown => {
                self.player.volume_down();
                Ok(())
            }
            Button::Mode => {
                let mode = self.player.mode().cycle();
                self.player.set_mode(mode);
                Ok(())
            }
            Button::Back => self.player.stop(),
        }
    }

    /// Drain pending input, then run one player tick at `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> TickOutcome {
        for _ in 0..MAX_EVENTS_PER_POLL {
            let Some(event) = self.input.poll_event() else {
                break;
            };
            // The player already reported the failure to its sink.
            if let Err(e) = self.handle_event(event) {
                tracing::debug!(?event, error = ?e, "input action failed");
            }
        }
        self.player.task(now_ms)
    }

    /// Play the music directory in blocking mode, reading buttons from the
    /// app's input.
    pub fn run_blocking(&mut self) -> Result<(), PlayerError> {
        self.player.run_playlist_blocking(&mut self.input)
    }

    /// The player.
    pub fn player(&self) -> &AudioPlayer<B, W, S, R, K> {
        &self.player
    }

    /// The player, for direct commands.
    pub fn player_mut(&mut self) -> &mut AudioPlayer<B, W, S, R, K> {
        &mut self.player
    }

    /// The input source.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// The input source, for scanning hardware lines.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Split back into player and input.
    pub fn into_parts(self) -> (AudioPlayer<B, W, S, R, K>, I) {
        (self.player, self.input)
    }

    fn toggle_play(&mut self) -> Result<(), PlayerError> {
        if self.player.is_paused() {
            self.player.resume();
            Ok(())
        } else if self.player.is_playing() {
            self.player.pause();
            Ok(())
        } else if self.player.current_file().is_some() {
            self.player.play_current()
        } else {
            self.player.play_first()
        }
    }
}

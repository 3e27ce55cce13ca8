//! Playback core for a VS1053-class streaming audio decoder.
//!
//! Layers, bottom-up:
//!
//! - [`protocol`]: SCI register access and SDI data transfer over a
//!   [`platform::DecoderBus`], with bounded ready waits.
//! - [`decoder`]: chip control (reset, self-test, configuration, stream
//!   start, tiered cancel) as the [`Vs1053`] state machine.
//! - [`stream`]: the file-to-decoder pump with ID3 tag skipping.
//! - [`session`]: play modes and track navigation.
//! - [`player`]: the [`AudioPlayer`] composite in cooperative or blocking mode.
//! - [`status`]: events pushed to a [`StatusSink`].
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]

pub mod decoder;
pub mod player;
pub mod protocol;
pub mod recovery;
pub mod session;
pub mod status;
pub mod stream;
pub mod volume;

pub use decoder::{
    ChipVariant, DecoderConfig, DecoderError, DecoderState, SendStatus, StreamInfo, Vs1053,
};
pub use player::{AudioPlayer, BlockingExit, PlayerConfig, PlayerError};
pub use recovery::{RecoveryLog, RecoveryTier};
pub use session::{Direction, PlayMode, PlaybackSession};
pub use status::{PlayerStatus, StatusSink};
pub use stream::{PumpState, StreamEnd, StreamPump, TickOutcome};

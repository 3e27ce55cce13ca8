//! Hardware Abstraction Layer (HAL) for the streaming decoder player
//!
//! This crate provides trait-based abstractions for every collaborator the
//! playback core talks to, enabling development and testing without the
//! physical decoder board.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate)
//!         ↓
//! Playback core (playback crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (embedded-hal SPI + GPIO, FAT filesystem)
//! ```
//!
//! # Abstractions
//!
//! - [`DecoderBus`] - serial link to the decoder chip (command/data select,
//!   speed switching, busy/ready line, reset line)
//! - [`SpiDecoderBus`] - [`DecoderBus`] built from `embedded-hal` 1.0 parts
//! - [`WaitStrategy`] - how bounded waits on the ready line are spent
//! - [`Storage`] / [`File`] - file access and audio track enumeration
//! - [`InputDevice`] - button input
//!
//! # Features
//!
//! - `std`: local filesystem storage and the [`mocks`] module (host testing)
//! - `defmt`: derive `defmt::Format` on public enums

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio_types;
pub mod bus;
pub mod config;
pub mod input;
pub mod spi_bus;
pub mod storage;
pub mod vs1053;
pub mod wait;

#[cfg(any(test, feature = "std"))]
pub mod mocks;
#[cfg(any(test, feature = "std"))]
pub mod storage_local;

// Re-export main high-level traits
pub use bus::{BusClock, BusSpeed, DecoderBus};
pub use input::{Button, InputDevice, InputEvent};
pub use spi_bus::SpiDecoderBus;
pub use storage::{File, Storage, TrackEntry, TrackList};
pub use wait::{DelayWait, WaitStrategy};

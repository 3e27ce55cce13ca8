//! Streaming decoder player application.
//!
//! Ties the playback core to an input source.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (app, input, simulator binary)
//!         ↓
//! Playback core (playback crate)
//!         ↓
//! Platform HAL (platform crate)
//! ```
//!
//! # Features
//!
//! - `std` - Enable standard library (host tests)
//! - `simulator` - Desktop binary streaming a local music directory into the
//!   simulated decoder chip
//! - `defmt` - `defmt::Format` derives on the platform and playback types
//!
//! ## Simulator
//!
//! ```bash
//! cargo run -p firmware --bin simulator --features simulator -- --music-dir ./music
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod app;
pub mod input;

pub use app::{DapApp, LogStatus};
pub use input::{ButtonScanner, KeyScript};

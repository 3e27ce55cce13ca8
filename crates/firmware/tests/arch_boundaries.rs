//! Architecture boundary tests. Run with `cargo test -p firmware --test arch_boundaries`
// Architecture test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
//!
//! Layering rules:
//!   Rule 1: platform (HAL) must not depend on playback or firmware
//!   Rule 2: playback must not depend on firmware (app layer)
//!   Rule 3: playback drives the decoder only through `platform::DecoderBus`
//!
//! The Cargo dependency graph enforces these at build time; a cycle would
//! stop this binary from linking. The tests name the boundary types so a
//! rule change shows up as a compile error here.

use platform::mocks::{FakeDelay, MemStorage, SimulatedVs1053};
use platform::DelayWait;
use playback::{DecoderConfig, DecoderState, Vs1053};

/// The HAL traits are reachable without any playback or firmware type.
#[test]
fn platform_hal_is_independent() {
    fn _assert_bus<T: platform::DecoderBus>() {}
    fn _assert_wait<T: platform::WaitStrategy>() {}
    fn _assert_storage<T: platform::Storage>() {}
    fn _assert_input<T: platform::InputDevice>() {}

    _assert_bus::<SimulatedVs1053>();
    _assert_storage::<MemStorage>();
}

/// The decoder driver is generic over the HAL bus; the simulated chip
/// stands in for the SPI-backed one.
#[test]
fn playback_drives_any_decoder_bus() {
    let chip = SimulatedVs1053::new();
    let mut decoder = Vs1053::new(
        chip.clone(),
        DelayWait::new(FakeDelay::new()),
        DecoderConfig::default(),
    );
    assert_eq!(decoder.state(), DecoderState::Idle);
    decoder.initialize().expect("simulated chip initializes");
    assert!(decoder.is_ready());
    assert_eq!(chip.hard_resets(), 1);
}

/// Every register and wire constant the driver needs lives in the HAL.
#[test]
fn chip_constants_live_in_platform() {
    use platform::vs1053::{END_FILL_LEN, SCI_READ, SCI_WRITE, SDI_BLOCK_LEN};
    assert_eq!(SCI_WRITE, 0x02);
    assert_eq!(SCI_READ, 0x03);
    assert_eq!(SDI_BLOCK_LEN, 32);
    assert_eq!(END_FILL_LEN, 2052);
}

/// `defmt` derives live in the lower crates; the app feature only forwards.
#[test]
fn defmt_feature_only_forwards() {
    let manifest = include_str!("../Cargo.toml");
    assert!(!manifest.contains("dep:defmt"));
    assert!(manifest.contains(r#"defmt = ["platform/defmt", "playback/defmt"]"#));
}

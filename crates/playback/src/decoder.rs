//! VS1053 decoder control.
//!
//! Builds the chip-level operations on top of the [`Sci`] register protocol:
//! hard and soft reset, the SDI memory self-test, volume/tone/speaker
//! configuration, stream start, the tiered cancel sequence and the 32-byte
//! data block transfer gated by DREQ.
//!
//! # State machine
//!
//! ```text
//!            initialize() ok
//!   (uninit) ───────────────► Idle ◄──────────────┐
//!       │                      │ start_decode()   │ stop() / cancel_decode()
//!       │ failure              ▼                  │
//!       └────────► Error     Playing ⇄ Paused ────┘
//! ```
//!
//! `Error` has no automatic exit; only a new `initialize()` leaves it.

use platform::audio_types::{ToneLevel, VolumePercent};
use platform::vs1053::{
    CANCEL_BYTE_BUDGET, CLOCKF_DEFAULT, END_FILL_LEN, GPIO_DDR, GPIO_ODATA, MODE_AFTER_RESET,
    MODE_RESET_REQUEST, MODE_TEST, PARAM_BYTE_RATE, PARAM_END_FILL_BYTE, SCI_AUDATA, SCI_BASS,
    SCI_CLOCKF, SCI_DECODE_TIME, SCI_HDAT0, SCI_HDAT1, SCI_MODE, SCI_VOL, SCI_WRAM, SCI_WRAMADDR,
    SDI_BLOCK_LEN, SELF_TEST_COMMAND, SELF_TEST_SIGNATURE_VS1003, SELF_TEST_SIGNATURE_VS1053,
    SINE_TEST_START, SINE_TEST_STOP, SM_CANCEL, SM_LAYER12, SM_RESET, SM_TESTS, SPEAKER_GPIO,
};
use platform::{BusSpeed, DecoderBus, WaitStrategy};
use thiserror_no_std::Error;

use crate::protocol::{Sci, REGISTER_READY_TIMEOUT_MS};
use crate::recovery::{RecoveryLog, RecoveryTier};
use crate::volume::volume_register;

/// Length of the reset pulse and of the settle time after it.
const HARD_RESET_PULSE_MS: u32 = 20;
/// Ready budget after releasing the reset line.
const HARD_RESET_READY_TIMEOUT_MS: u32 = 200;
/// Settle time after a soft reset.
const SOFT_RESET_SETTLE_MS: u32 = 20;
/// Read-back attempts for the mode and clock registers during soft reset.
const RESET_RETRIES: u32 = 100;
/// Delay between read-back attempts.
const RESET_RETRY_DELAY_MS: u32 = 2;
/// Time the memory test needs before HDAT0 holds the result.
const SELF_TEST_DELAY_MS: u32 = 150;
/// Ready budget before priming a new stream.
const START_READY_TIMEOUT_MS: u32 = 1000;
/// Blocks of silence sent to prime the decoder.
const PRIME_BLOCKS: usize = 4;

/// Decoder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    /// Initialized and not decoding.
    Idle,
    /// Accepting stream data.
    Playing,
    /// Stream open but not being fed.
    Paused,
    /// Transient state while a stop flushes the chip.
    Stopped,
    /// Initialization failed or the chip stopped responding.
    Error,
}

/// Decoder control failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderError {
    /// Not initialized, or in the `Error` state.
    #[error("decoder not ready")]
    NotReady,
    /// The ready line or a register read-back never came good.
    #[error("decoder bus timeout")]
    BusTimeout,
    /// Memory test signature did not match a supported chip.
    #[error("decoder self-test failed")]
    SelfTestFailed,
    /// Plugin image ended in the middle of a record.
    #[error("malformed plugin image")]
    MalformedPlugin,
}

/// Outcome of [`Vs1053::send_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendStatus {
    /// The block was clocked out.
    Sent,
    /// DREQ was low; nothing was transferred.
    Busy,
}

/// Chip revision identified by the self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipVariant {
    /// VS1053 (signature 0x83FF).
    Vs1053,
    /// VS1003 (signature 0x807F).
    Vs1003,
}

/// Format of the stream being decoded, from `AUDATA` and `HDAT0/1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamInfo {
    /// Sample rate in Hz.
    pub sample_rate: u16,
    /// Two channels.
    pub stereo: bool,
    /// Raw stream header word 0.
    pub hdat0: u16,
    /// Raw stream header word 1.
    pub hdat1: u16,
}

/// Decoder configuration applied at initialization and on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderConfig {
    /// Output volume.
    pub volume: VolumePercent,
    /// Bass enhancer lower limit, 10 Hz steps.
    pub bass_freq: ToneLevel,
    /// Bass enhancement, 1 dB steps.
    pub bass_amp: ToneLevel,
    /// Treble control lower limit, 1 kHz steps.
    pub treble_freq: ToneLevel,
    /// Treble level, 1.5 dB steps.
    pub treble_amp: ToneLevel,
    /// On-board amplifier enabled.
    pub speaker: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            volume: VolumePercent::new(50),
            bass_freq: ToneLevel::new(6),
            bass_amp: ToneLevel::new(8),
            treble_freq: ToneLevel::new(10),
            treble_amp: ToneLevel::new(5),
            speaker: true,
        }
    }
}

/// VS1053 driver over a [`DecoderBus`] and a [`WaitStrategy`].
pub struct Vs1053<B, W> {
    sci: Sci<B, W>,
    state: DecoderState,
    config: DecoderConfig,
    initialized: bool,
    variant: Option<ChipVariant>,
    recovery: RecoveryLog,
}

impl<B: DecoderBus, W: WaitStrategy> Vs1053<B, W> {
    /// Create an uninitialized driver.
    pub fn new(bus: B, wait: W, config: DecoderConfig) -> Self {
        Self {
            sci: Sci::new(bus, wait),
            state: DecoderState::Idle,
            config,
            initialized: false,
            variant: None,
            recovery: RecoveryLog::new(),
        }
    }

    /// Full bring-up: hard reset, soft reset, self-test, configuration.
    ///
    /// Enters `Idle` on success, `Error` on any failure.
    pub fn initialize(&mut self) -> Result<ChipVariant, DecoderError> {
        tracing::info!("initializing decoder");
        self.initialized = false;
        match self.bring_up() {
            Ok(variant) => {
                self.initialized = true;
                self.variant = Some(variant);
                self.set_state(DecoderState::Idle);
                tracing::info!(?variant, "decoder ready");
                Ok(variant)
            }
            Err(e) => {
                self.set_state(DecoderState::Error);
                tracing::error!(error = ?e, "decoder initialization failed");
                Err(e)
            }
        }
    }

    fn bring_up(&mut self) -> Result<ChipVariant, DecoderError> {
        self.hard_reset()?;
        self.soft_reset()?;
        let variant = self.self_test()?;
        let config = self.config;
        self.apply_config(&config);
        Ok(variant)
    }

    /// Drop back to the uninitialized state (chip left as is).
    pub fn deinit(&mut self) {
        self.initialized = false;
        self.variant = None;
        self.set_state(DecoderState::Idle);
    }

    /// Pulse the reset line and wait for the chip to come back.
    pub fn hard_reset(&mut self) -> Result<(), DecoderError> {
        tracing::debug!("hard reset");
        self.sci.bus_mut().set_reset(true);
        self.sci.delay_ms(HARD_RESET_PULSE_MS);
        self.sci.bus_mut().select_command(false);
        self.sci.bus_mut().select_data(false);
        self.sci.bus_mut().set_reset(false);
        if !self.sci.wait_ready(HARD_RESET_READY_TIMEOUT_MS) {
            tracing::error!("decoder never raised DREQ after reset");
            self.set_state(DecoderState::Error);
            return Err(DecoderError::BusTimeout);
        }
        self.sci.delay_ms(HARD_RESET_PULSE_MS);
        Ok(())
    }

    /// Reset through `SM_RESET` and reprogram the clock multiplier.
    ///
    /// Both registers are rewritten until they read back as expected, at
    /// most [`RESET_RETRIES`] times each.
    pub fn soft_reset(&mut self) -> Result<(), DecoderError> {
        tracing::debug!("soft reset");
        self.sci.wait_ready(REGISTER_READY_TIMEOUT_MS);
        let bus = self.sci.bus_mut();
        bus.set_speed(BusSpeed::Low);
        bus.select_command(false);
        bus.select_data(false);
        bus.exchange(0xFF);

        if !self.write_until_read_back(SCI_MODE, MODE_RESET_REQUEST, MODE_AFTER_RESET) {
            tracing::warn!("mode register never settled after reset request");
            return Err(DecoderError::BusTimeout);
        }
        self.sci.wait_ready(REGISTER_READY_TIMEOUT_MS);
        if !self.write_until_read_back(SCI_CLOCKF, CLOCKF_DEFAULT, CLOCKF_DEFAULT) {
            tracing::warn!("clock register never read back");
            return Err(DecoderError::BusTimeout);
        }
        self.sci.delay_ms(SOFT_RESET_SETTLE_MS);
        Ok(())
    }

    fn write_until_read_back(&mut self, addr: u8, value: u16, expected: u16) -> bool {
        for _ in 0..RESET_RETRIES {
            self.sci.write_register(addr, value);
            if self.sci.read_register(addr) == expected {
                return true;
            }
            self.sci.delay_ms(RESET_RETRY_DELAY_MS);
        }
        false
    }

    /// Run the SDI memory test and identify the chip.
    pub fn self_test(&mut self) -> Result<ChipVariant, DecoderError> {
        let mode = self.sci.read_register(SCI_MODE);
        if mode == 0xFFFF || mode == 0x0000 {
            tracing::error!(mode, "mode register reads as a floating bus");
            return Err(DecoderError::SelfTestFailed);
        }

        self.sci.write_register(SCI_MODE, MODE_TEST);
        self.sci.wait_ready(REGISTER_READY_TIMEOUT_MS);
        self.sci.bus_mut().set_speed(BusSpeed::Low);
        self.sci.bus_mut().select_data(true);
        self.sci.bus_mut().write_all(&SELF_TEST_COMMAND);
        self.sci.delay_ms(SELF_TEST_DELAY_MS);
        self.sci.bus_mut().select_data(false);

        let signature = self.sci.read_register(SCI_HDAT0);
        self.sci.bus_mut().set_speed(BusSpeed::High);
        match signature {
            SELF_TEST_SIGNATURE_VS1053 => Ok(ChipVariant::Vs1053),
            SELF_TEST_SIGNATURE_VS1003 => Ok(ChipVariant::Vs1003),
            other => {
                tracing::error!(signature = other, "unexpected self-test signature");
                Err(DecoderError::SelfTestFailed)
            }
        }
    }

    /// Prepare the chip for a new stream and enter `Playing`.
    ///
    /// On failure the state is left unchanged.
    pub fn start_decode(&mut self) -> Result<(), DecoderError> {
        self.ensure_ready()?;
        self.soft_reset()?;
        // DECODE_TIME only reliably clears on a repeated write.
        self.sci.write_register(SCI_DECODE_TIME, 0);
        self.sci.write_register(SCI_DECODE_TIME, 0);
        let mode = self.sci.read_register(SCI_MODE);
        self.sci
            .write_register(SCI_MODE, mode & !(SM_TESTS | SM_RESET));
        self.write_output_config();

        if !self.sci.wait_ready(START_READY_TIMEOUT_MS) {
            tracing::warn!("decoder not ready to start stream");
            return Err(DecoderError::BusTimeout);
        }
        let silence = [0u8; SDI_BLOCK_LEN];
        for _ in 0..PRIME_BLOCKS {
            self.send_block_blocking(&silence, REGISTER_READY_TIMEOUT_MS)?;
        }
        self.set_state(DecoderState::Playing);
        Ok(())
    }

    /// Abort the current stream, escalating until the chip is clean.
    ///
    /// Ends in `Idle` with the speaker re-enabled, or in `Error` when the
    /// hardware reset tier fails.
    pub fn cancel_decode(&mut self) -> Result<RecoveryTier, DecoderError> {
        self.ensure_ready()?;
        let mode = self.sci.read_register(SCI_MODE);
        self.sci
            .write_register(SCI_MODE, mode | SM_CANCEL | SM_LAYER12);

        let mut tier = if self.feed_until_cancelled() {
            let fill = self.end_fill_byte();
            self.send_fill(fill, END_FILL_LEN);
            RecoveryTier::Cooperative
        } else {
            tracing::warn!("cancel not acknowledged, soft reset");
            if let Err(e) = self.soft_reset() {
                tracing::warn!(error = ?e, "soft reset during cancel failed");
            }
            RecoveryTier::SoftReset
        };

        let residue = self
            .sci
            .read_register(SCI_HDAT0)
            .saturating_add(self.sci.read_register(SCI_HDAT1));
        if residue != 0 {
            tier = RecoveryTier::HardReset;
            tracing::warn!(residue, "decoder still holds samples, hard reset");
            self.hard_reset()?;
            self.soft_reset()?;
        }

        self.recovery.record(tier);
        tracing::info!(%tier, "stream cancelled");
        self.set_state(DecoderState::Idle);
        let speaker = self.config.speaker;
        self.set_speaker(speaker);
        Ok(tier)
    }

    /// Send zero blocks until `SM_CANCEL` self-clears or the budget runs out.
    fn feed_until_cancelled(&mut self) -> bool {
        let zeros = [0u8; SDI_BLOCK_LEN];
        let mut sent = 0usize;
        while sent < CANCEL_BYTE_BUDGET {
            if self
                .send_block_blocking(&zeros, REGISTER_READY_TIMEOUT_MS)
                .is_err()
            {
                return false;
            }
            sent = sent.saturating_add(SDI_BLOCK_LEN);
            if self.sci.read_register(SCI_MODE) & SM_CANCEL == 0 {
                tracing::debug!(sent, "cancel acknowledged");
                return true;
            }
        }
        false
    }

    /// Send `len` copies of `fill` in ready-gated blocks.
    fn send_fill(&mut self, fill: u8, len: usize) {
        let block = [fill; SDI_BLOCK_LEN];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(SDI_BLOCK_LEN);
            let chunk = block.get(..n).unwrap_or(&block);
            if self
                .send_block_blocking(chunk, REGISTER_READY_TIMEOUT_MS)
                .is_err()
            {
                tracing::warn!(remaining, "end fill cut short");
                return;
            }
            remaining = remaining.saturating_sub(n);
        }
    }

    /// `Playing → Paused`. Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        if self.state == DecoderState::Playing {
            self.set_state(DecoderState::Paused);
            true
        } else {
            false
        }
    }

    /// `Paused → Playing`. Returns `true` if the state changed.
    pub fn resume(&mut self) -> bool {
        if self.state == DecoderState::Paused {
            self.set_state(DecoderState::Playing);
            true
        } else {
            false
        }
    }

    /// The whole stream has been sent: `Playing`/`Paused → Idle` without
    /// touching the chip, which keeps decoding what it has buffered.
    pub fn end_stream(&mut self) -> bool {
        if matches!(self.state, DecoderState::Playing | DecoderState::Paused) {
            self.set_state(DecoderState::Idle);
            true
        } else {
            false
        }
    }

    /// Flush the chip and return to `Idle`.
    pub fn stop(&mut self) -> Result<(), DecoderError> {
        self.ensure_ready()?;
        self.set_state(DecoderState::Stopped);
        let result = self.soft_reset();
        self.set_state(DecoderState::Idle);
        result
    }

    /// Send one block (at most 32 bytes) if DREQ is high.
    ///
    /// Longer input is truncated to 32 bytes.
    pub fn send_block(&mut self, block: &[u8]) -> SendStatus {
        if !self.sci.is_ready() {
            return SendStatus::Busy;
        }
        let block = block.get(..SDI_BLOCK_LEN).unwrap_or(block);
        self.sci.send_data(block);
        SendStatus::Sent
    }

    /// Wait up to `timeout_ms` for DREQ, then send one block.
    pub fn send_block_blocking(&mut self, block: &[u8], timeout_ms: u32) -> Result<(), DecoderError> {
        if !self.sci.wait_ready(timeout_ms) {
            return Err(DecoderError::BusTimeout);
        }
        match self.send_block(block) {
            SendStatus::Sent => Ok(()),
            SendStatus::Busy => Err(DecoderError::BusTimeout),
        }
    }

    /// Sample DREQ once.
    pub fn is_data_ready(&mut self) -> bool {
        self.sci.is_ready()
    }

    /// Wait up to `timeout_ms` for DREQ.
    pub fn wait_data_ready(&mut self, timeout_ms: u32) -> bool {
        self.sci.wait_ready(timeout_ms)
    }

    /// Delay through the wait strategy.
    pub fn delay_ms(&mut self, ms: u32) {
        self.sci.delay_ms(ms);
    }

    /// Seconds decoded since the stream started.
    pub fn decode_time(&mut self) -> u16 {
        self.sci.read_register(SCI_DECODE_TIME)
    }

    /// Set output volume (both channels).
    pub fn set_volume(&mut self, volume: VolumePercent) {
        self.config.volume = volume;
        self.sci.write_register(SCI_VOL, volume_register(volume));
    }

    /// Set the bass enhancer, leaving the treble byte untouched.
    pub fn set_bass(&mut self, freq: ToneLevel, amp: ToneLevel) {
        self.config.bass_freq = freq;
        self.config.bass_amp = amp;
        let value = bass_bits(freq, amp);
        let current = self.sci.read_register(SCI_BASS);
        self.sci
            .write_register(SCI_BASS, (current & 0xFF00) | value);
    }

    /// Set the treble control, leaving the bass byte untouched.
    pub fn set_treble(&mut self, freq: ToneLevel, amp: ToneLevel) {
        self.config.treble_freq = freq;
        self.config.treble_amp = amp;
        let value = treble_bits(freq, amp);
        let current = self.sci.read_register(SCI_BASS);
        self.sci
            .write_register(SCI_BASS, (current & 0x00FF) | value);
    }

    /// Drive the amplifier enable on GPIO4.
    pub fn set_speaker(&mut self, enable: bool) {
        self.config.speaker = enable;
        self.write_ram(GPIO_DDR, SPEAKER_GPIO);
        self.write_ram(GPIO_ODATA, if enable { SPEAKER_GPIO } else { 0 });
    }

    /// Apply every field of `config`.
    pub fn apply_config(&mut self, config: &DecoderConfig) {
        self.config = *config;
        self.write_output_config();
        self.set_speaker(config.speaker);
    }

    fn write_output_config(&mut self) {
        let c = self.config;
        self.sci.write_register(SCI_VOL, volume_register(c.volume));
        self.sci.write_register(
            SCI_BASS,
            treble_bits(c.treble_freq, c.treble_amp) | bass_bits(c.bass_freq, c.bass_amp),
        );
    }

    /// Current configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Read a word of decoder RAM.
    pub fn read_ram(&mut self, addr: u16) -> u16 {
        self.sci.write_register(SCI_WRAMADDR, addr);
        self.sci.read_register(SCI_WRAM)
    }

    /// Write a word of decoder RAM.
    pub fn write_ram(&mut self, addr: u16, value: u16) {
        self.sci.write_register(SCI_WRAMADDR, addr);
        self.sci.write_register(SCI_WRAM, value);
    }

    /// Byte the chip wants streams padded with.
    pub fn end_fill_byte(&mut self) -> u8 {
        let [_, low] = self.read_ram(PARAM_END_FILL_BYTE).to_be_bytes();
        low
    }

    /// Average byte rate of the current stream (0 until known).
    pub fn byte_rate(&mut self) -> u16 {
        self.read_ram(PARAM_BYTE_RATE)
    }

    /// Sample rate, channel count and raw header words.
    pub fn stream_info(&mut self) -> StreamInfo {
        let audata = self.sci.read_register(SCI_AUDATA);
        StreamInfo {
            sample_rate: audata & 0xFFFE,
            stereo: audata & 0x0001 != 0,
            hdat0: self.sci.read_register(SCI_HDAT0),
            hdat1: self.sci.read_register(SCI_HDAT1),
        }
    }

    /// Start the built-in sine test; `code` selects the frequency.
    pub fn sine_test_start(&mut self, code: u8) -> Result<(), DecoderError> {
        self.ensure_ready()?;
        let mode = self.sci.read_register(SCI_MODE);
        self.sci.write_register(SCI_MODE, mode | SM_TESTS);
        if !self.sci.wait_ready(REGISTER_READY_TIMEOUT_MS) {
            return Err(DecoderError::BusTimeout);
        }
        let [a, b, c] = SINE_TEST_START;
        self.sci.send_data(&[a, b, c, code, 0, 0, 0, 0]);
        tracing::info!(code, "sine test started");
        Ok(())
    }

    /// Stop the sine test and leave test mode.
    pub fn sine_test_stop(&mut self) -> Result<(), DecoderError> {
        self.ensure_ready()?;
        if !self.sci.wait_ready(REGISTER_READY_TIMEOUT_MS) {
            return Err(DecoderError::BusTimeout);
        }
        self.sci.send_data(&SINE_TEST_STOP);
        let mode = self.sci.read_register(SCI_MODE);
        self.sci.write_register(SCI_MODE, mode & !SM_TESTS);
        Ok(())
    }

    /// Upload a compressed plugin image.
    ///
    /// Records are `addr, n, data…`: with bit 15 of `n` set the single
    /// following word is written `n & 0x7FFF` times, otherwise `n` words
    /// follow. Returns the number of register writes. A truncated image is
    /// reported after the complete records before it were written.
    pub fn load_plugin(&mut self, image: &[u16]) -> Result<usize, DecoderError> {
        let mut words = image.iter().copied();
        let mut written = 0usize;
        while let Some(addr) = words.next() {
            let count = words.next().ok_or(DecoderError::MalformedPlugin)?;
            let reg = u8::try_from(addr).map_err(|_| DecoderError::MalformedPlugin)?;
            if count & 0x8000 != 0 {
                let repeat = count & 0x7FFF;
                let value = words.next().ok_or(DecoderError::MalformedPlugin)?;
                for _ in 0..repeat {
                    self.sci.write_register(reg, value);
                }
                written = written.saturating_add(usize::from(repeat));
            } else {
                for _ in 0..count {
                    let value = words.next().ok_or(DecoderError::MalformedPlugin)?;
                    self.sci.write_register(reg, value);
                }
                written = written.saturating_add(usize::from(count));
            }
        }
        tracing::info!(written, "plugin loaded");
        Ok(written)
    }

    /// Current state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Initialized and not in `Error`.
    pub fn is_ready(&self) -> bool {
        self.initialized && self.state != DecoderState::Error
    }

    /// `initialize()` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Revision found by the last successful self-test.
    pub fn variant(&self) -> Option<ChipVariant> {
        self.variant
    }

    /// Cancel outcomes so far.
    pub fn recovery_log(&self) -> &RecoveryLog {
        &self.recovery
    }

    /// `true` if a register access ran without DREQ since the last call.
    pub fn take_bus_timeout(&mut self) -> bool {
        self.sci.take_timeout()
    }

    /// The transport.
    pub fn bus(&self) -> &B {
        self.sci.bus()
    }

    /// Give the transport and wait strategy back.
    pub fn release(self) -> (B, W) {
        self.sci.release()
    }

    fn ensure_ready(&self) -> Result<(), DecoderError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(DecoderError::NotReady)
        }
    }

    fn set_state(&mut self, state: DecoderState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "decoder state");
            self.state = state;
        }
    }
}

fn bass_bits(freq: ToneLevel, amp: ToneLevel) -> u16 {
    u16::from(amp.get()) << 4 | u16::from(freq.get())
}

fn treble_bits(freq: ToneLevel, amp: ToneLevel) -> u16 {
    u16::from(amp.get()) << 12 | u16::from(freq.get()) << 8
}

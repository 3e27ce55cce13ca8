//! VS1053 / VS1003 decoder register map and protocol constants.
//!
//! Reference: VLSI Solution VS1053b datasheet v1.31, sections 7 (SPI), 8.7
//! (SCI registers) and 9.6 (SDI tests).
//!
//! The chip exposes sixteen 16-bit Serial Control Interface (SCI) registers
//! on the command channel and consumes compressed audio on the Serial Data
//! Interface (SDI) in 32-byte blocks, paced by DREQ.

/// SCI opcode: write register.
pub const SCI_WRITE: u8 = 0x02;
/// SCI opcode: read register.
pub const SCI_READ: u8 = 0x03;

/// Register 0x0: mode control.
pub const SCI_MODE: u8 = 0x00;
/// Register 0x1: status.
pub const SCI_STATUS: u8 = 0x01;
/// Register 0x2: built-in bass/treble control.
pub const SCI_BASS: u8 = 0x02;
/// Register 0x3: clock frequency and multiplier.
pub const SCI_CLOCKF: u8 = 0x03;
/// Register 0x4: decode time in seconds.
pub const SCI_DECODE_TIME: u8 = 0x04;
/// Register 0x5: sample rate and channel count.
pub const SCI_AUDATA: u8 = 0x05;
/// Register 0x6: RAM read/write data.
pub const SCI_WRAM: u8 = 0x06;
/// Register 0x7: RAM read/write address.
pub const SCI_WRAMADDR: u8 = 0x07;
/// Register 0x8: stream header data 0.
pub const SCI_HDAT0: u8 = 0x08;
/// Register 0x9: stream header data 1.
pub const SCI_HDAT1: u8 = 0x09;
/// Register 0xA: start address of application.
pub const SCI_AIADDR: u8 = 0x0A;
/// Register 0xB: volume (high byte left, low byte right; 0 = loudest).
pub const SCI_VOL: u8 = 0x0B;

/// Differential output.
pub const SM_DIFF: u16 = 0x0001;
/// Allow MPEG layers I and II.
pub const SM_LAYER12: u16 = 0x0002;
/// Soft reset (self-clearing).
pub const SM_RESET: u16 = 0x0004;
/// Cancel decoding of the current file (self-clearing on acknowledgement).
pub const SM_CANCEL: u16 = 0x0008;
/// EarSpeaker low setting.
pub const SM_EARSPEAKER_LO: u16 = 0x0010;
/// Allow SDI tests.
pub const SM_TESTS: u16 = 0x0020;
/// Stream mode.
pub const SM_STREAM: u16 = 0x0040;
/// EarSpeaker high setting.
pub const SM_EARSPEAKER_HI: u16 = 0x0080;
/// Native SPI modes (separate XDCS line).
pub const SM_SDINEW: u16 = 0x0800;

/// Mode value requesting a soft reset in native SPI mode.
pub const MODE_RESET_REQUEST: u16 = SM_SDINEW | SM_RESET;
/// Mode value read back once the soft reset has completed.
pub const MODE_AFTER_RESET: u16 = SM_SDINEW;
/// Mode value enabling SDI tests.
pub const MODE_TEST: u16 = SM_SDINEW | SM_TESTS;

/// CLOCKF value: 3.0x multiplier, +1.5x allowed when decoding WMA/AAC.
pub const CLOCKF_DEFAULT: u16 = 0x9800;

/// SDI memory test command (run in test mode; result lands in HDAT0).
pub const SELF_TEST_COMMAND: [u8; 8] = [0x4D, 0xEA, 0x6D, 0x54, 0x00, 0x00, 0x00, 0x00];
/// HDAT0 memory-test result of a healthy VS1053.
pub const SELF_TEST_SIGNATURE_VS1053: u16 = 0x83FF;
/// HDAT0 memory-test result of a healthy VS1003.
pub const SELF_TEST_SIGNATURE_VS1003: u16 = 0x807F;

/// SDI sine-test start prefix; the fourth byte selects the frequency.
pub const SINE_TEST_START: [u8; 3] = [0x53, 0xEF, 0x6E];
/// SDI sine-test exit sequence.
pub const SINE_TEST_STOP: [u8; 8] = [0x45, 0x78, 0x69, 0x74, 0x00, 0x00, 0x00, 0x00];

/// RAM address of the GPIO direction register.
pub const GPIO_DDR: u16 = 0xC017;
/// RAM address of the GPIO output register.
pub const GPIO_ODATA: u16 = 0xC019;
/// GPIO line driving the on-board speaker amplifier enable.
pub const SPEAKER_GPIO: u16 = 1 << 4;

/// RAM parameter: average byte rate of the current stream.
pub const PARAM_BYTE_RATE: u16 = 0x1E05;
/// RAM parameter: byte to pad the end of a stream with.
pub const PARAM_END_FILL_BYTE: u16 = 0x1E06;

/// SDI transfer granularity guaranteed by one DREQ pulse.
pub const SDI_BLOCK_LEN: usize = 32;
/// Zero bytes to stream while waiting for the chip to acknowledge SM_CANCEL.
pub const CANCEL_BYTE_BUDGET: usize = 2048;
/// End-fill bytes to send after a successful cancel.
pub const END_FILL_LEN: usize = 2052;

/// Loudest native volume value.
pub const VOLUME_NATIVE_LOUDEST: u8 = 0x00;
/// Quietest native volume value accepted by the volume mapping.
pub const VOLUME_NATIVE_QUIETEST: u8 = 0xFE;

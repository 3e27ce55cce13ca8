//! Volume control mapping for the VS1053 `SCI_VOL` register.
//!
//! The decoder attenuates each channel in 0.5 dB steps where:
//! - `0x00` = 0 dB attenuation (maximum loudness)
//! - `0xFE` = the quietest value the percentage mapping produces
//!
//! The user-facing linear percentage (0 – 100) maps to the hardware value via
//! the [`VolumePercent`] and [`NativeVolume`] newtypes, which enforce valid
//! ranges at compile time.

use platform::audio_types::{NativeVolume, VolumePercent};

/// Map a [`VolumePercent`] to the decoder's native attenuation.
///
/// # Register encoding
///
/// ```text
/// native = 254 - volume_percent * 254 / 100
/// ```
///
/// | `volume` | Native | Effect            |
/// |----------|--------|-------------------|
/// | 0%       | 254    | -127 dB (silent)  |
/// | 50%      | 127    | -63.5 dB          |
/// | 100%     | 0      | 0 dB (full volume)|
pub fn volume_to_native(volume: VolumePercent) -> NativeVolume {
    NativeVolume::from_percent(volume)
}

/// `SCI_VOL` value for `volume`: identical left (high byte) and right
/// (low byte) attenuation.
pub fn volume_register(volume: VolumePercent) -> u16 {
    volume_to_native(volume).register_value()
}

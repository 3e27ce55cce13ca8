//! Audio domain newtypes for compile-time safety.
//!
//! - `VolumePercent`: clamps 0–100, the only volume unit the player API speaks
//! - `NativeVolume`: decoder attenuation, derived from `VolumePercent` only
//! - `ToneLevel`: 4-bit bass/treble field value

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── VolumePercent ────────────────────────────────────────────────────────────

/// Volume as a percentage, clamped to 0–100.
///
/// Wraps a `u8` with the invariant `0 <= value <= 100`.
/// Construct with [`VolumePercent::new`] (clamping) or
/// [`VolumePercent::try_new`] (fallible, strict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct VolumePercent(u8);

impl VolumePercent {
    /// Silence.
    pub const MIN: Self = Self(0);
    /// Full scale.
    pub const MAX: Self = Self(100);

    /// Create a `VolumePercent`, clamping values above 100 to 100.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Create a `VolumePercent`, returning an error if `value > 100`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `value > 100`.
    pub fn try_new(value: u8) -> Result<Self, OutOfRangeError> {
        if value > 100 {
            Err(OutOfRangeError {
                value: u32::from(value),
                min: 0,
                max: 100,
            })
        } else {
            Ok(Self(value))
        }
    }

    /// Return the inner volume value (0–100).
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Raise by `step`, saturating at 100.
    #[must_use]
    pub fn step_up(self, step: u8) -> Self {
        Self::new(self.0.saturating_add(step))
    }

    /// Lower by `step`, saturating at 0.
    #[must_use]
    pub fn step_down(self, step: u8) -> Self {
        Self(self.0.saturating_sub(step))
    }
}

impl Default for VolumePercent {
    fn default() -> Self {
        Self(crate::config::DEFAULT_VOLUME)
    }
}

// ── NativeVolume ─────────────────────────────────────────────────────────────

/// Decoder attenuation in 0.5 dB steps (0x00 = loudest, 0xFE = silent).
///
/// This type can only be constructed from a [`VolumePercent`], ensuring the
/// mapping is applied consistently:
///
/// `native = 254 - percent * 254 / 100`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct NativeVolume(u8);

impl NativeVolume {
    /// Convert a percentage to decoder attenuation.
    ///
    /// - 100% → 0x00
    /// - 0%   → 0xFE
    #[must_use]
    pub fn from_percent(vol: VolumePercent) -> Self {
        let quietest = u16::from(crate::vs1053::VOLUME_NATIVE_QUIETEST);
        // percent <= 100, so the product stays below u16::MAX.
        let scaled = u16::from(vol.get()).saturating_mul(quietest) / 100;
        let native = quietest.saturating_sub(scaled);
        Self(u8::try_from(native).unwrap_or(crate::vs1053::VOLUME_NATIVE_QUIETEST))
    }

    /// Return the per-channel attenuation value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Value for the volume register: same attenuation on both channels.
    #[must_use]
    pub fn register_value(self) -> u16 {
        u16::from_be_bytes([self.0, self.0])
    }
}

impl From<VolumePercent> for NativeVolume {
    fn from(vol: VolumePercent) -> Self {
        Self::from_percent(vol)
    }
}

// ── ToneLevel ────────────────────────────────────────────────────────────────

/// A 4-bit field of the bass/treble register (frequency or amplitude).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ToneLevel(u8);

impl ToneLevel {
    /// Create a level, clamping to 15.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(0x0F))
    }

    /// Create a level, rejecting values that do not fit in four bits.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `value > 15`.
    pub fn try_new(value: u8) -> Result<Self, OutOfRangeError> {
        if value > 0x0F {
            Err(OutOfRangeError {
                value: u32::from(value),
                min: 0,
                max: 15,
            })
        } else {
            Ok(Self(value))
        }
    }

    /// Return the nibble.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

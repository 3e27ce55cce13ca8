//! Property-based tests for audio domain math.
//! Verifies invariants hold for ALL valid inputs, not just fixed examples.

use platform::audio_types::{NativeVolume, ToneLevel, VolumePercent};

proptest::proptest! {
    /// VolumePercent::new never panics for any u8 input (clamps to 100).
    #[test]
    fn volume_percent_new_never_panics(pct in 0u8..=255u8) {
        let v = VolumePercent::new(pct);
        assert!(v.get() <= 100);
        if pct <= 100 {
            assert_eq!(v.get(), pct);
        }
    }

    /// The native value is exactly `254 - v*254/100` for every percentage.
    #[test]
    fn native_volume_matches_formula(pct in 0u8..=100u8) {
        let native = NativeVolume::from_percent(VolumePercent::new(pct));
        let expected = 254 - (u32::from(pct) * 254 / 100);
        assert_eq!(u32::from(native.get()), expected);
    }

    /// Both channels of the register carry the same attenuation.
    #[test]
    fn native_volume_register_is_symmetric(pct in 0u8..=100u8) {
        let native = NativeVolume::from_percent(VolumePercent::new(pct));
        let [left, right] = native.register_value().to_be_bytes();
        assert_eq!(left, right);
        assert_eq!(left, native.get());
    }

    /// Higher volume → lower or equal attenuation (monotone inverse relationship).
    #[test]
    fn native_is_monotone_inverse_of_volume(a in 0u8..=100u8, b in 0u8..=100u8) {
        let na = NativeVolume::from_percent(VolumePercent::new(a));
        let nb = NativeVolume::from_percent(VolumePercent::new(b));
        if a > b {
            assert!(na.get() <= nb.get(),
                "volume {} → native {} should be <= volume {} → native {}",
                a, na.get(), b, nb.get());
        } else if a < b {
            assert!(na.get() >= nb.get(),
                "volume {} → native {} should be >= volume {} → native {}",
                a, na.get(), b, nb.get());
        }
    }

    /// Stepping never leaves 0..=100.
    #[test]
    fn volume_steps_stay_in_range(pct in 0u8..=100u8, step in 0u8..=255u8) {
        let v = VolumePercent::new(pct);
        assert!(v.step_up(step).get() <= 100);
        assert!(v.step_down(step).get() <= v.get());
    }

    /// ToneLevel::new always yields a nibble.
    #[test]
    fn tone_level_is_a_nibble(raw in 0u8..=255u8) {
        assert!(ToneLevel::new(raw).get() <= 15);
        assert_eq!(ToneLevel::try_new(raw).is_ok(), raw <= 15);
    }
}

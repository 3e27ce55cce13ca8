//! Decoder bus transport abstraction
//!
//! The decoder chip sits on a synchronous serial link with two chip-select
//! lines that pick the channel (command registers vs. raw audio data), a
//! hardware reset line, and a busy/ready output (DREQ) that the chip raises
//! whenever it can take another transfer block.
//!
//! Bus-level failures are not observable at this layer: implementations
//! swallow and log them, the decoder protocol notices a misbehaving chip
//! through register read-back instead.

/// Serial clock rate class.
///
/// Register access must run at the low rate (the chip's command interface is
/// clocked from its un-multiplied input clock); audio data may use the high
/// rate once the clock multiplier is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusSpeed {
    /// Safe rate for register access (~1 MHz).
    Low,
    /// Streaming rate (~9 MHz).
    High,
}

/// Byte-level transport to the decoder chip.
pub trait DecoderBus {
    /// Clock one byte out and return the byte clocked in.
    fn exchange(&mut self, byte: u8) -> u8;

    /// Clock out a block, discarding what comes back.
    fn write_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.exchange(b);
        }
    }

    /// Drive the command-select line (active = selected).
    fn select_command(&mut self, active: bool);

    /// Drive the data-select line (active = selected).
    fn select_data(&mut self, active: bool);

    /// Switch the serial clock rate.
    fn set_speed(&mut self, speed: BusSpeed);

    /// Sample the busy/ready line; `true` means the chip accepts a block.
    fn is_ready(&mut self) -> bool;

    /// Drive the hardware reset line (asserted = chip held in reset).
    fn set_reset(&mut self, asserted: bool);
}

impl<T: DecoderBus + ?Sized> DecoderBus for &mut T {
    fn exchange(&mut self, byte: u8) -> u8 {
        (**self).exchange(byte)
    }

    fn write_all(&mut self, bytes: &[u8]) {
        (**self).write_all(bytes);
    }

    fn select_command(&mut self, active: bool) {
        (**self).select_command(active);
    }

    fn select_data(&mut self, active: bool) {
        (**self).select_data(active);
    }

    fn set_speed(&mut self, speed: BusSpeed) {
        (**self).set_speed(speed);
    }

    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }

    fn set_reset(&mut self, asserted: bool) {
        (**self).set_reset(asserted);
    }
}

/// Clock-rate control for a serial peripheral.
///
/// `embedded-hal` has no notion of changing the bus frequency at runtime, so
/// the HAL-specific reconfiguration is injected through this trait. `()` is
/// the no-op implementation for buses that run at a single fixed rate.
pub trait BusClock {
    /// Reconfigure the peripheral for `speed`.
    fn set_speed(&mut self, speed: BusSpeed);
}

impl BusClock for () {
    fn set_speed(&mut self, _speed: BusSpeed) {}
}

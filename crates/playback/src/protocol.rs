//! SCI register protocol.
//!
//! One register access is one fully serialized transaction:
//!
//! ```text
//! wait ready → low speed → XCS low → opcode, addr, hi, lo → XCS high → high speed
//! ```
//!
//! `&mut self` on every method keeps other bus traffic from interleaving
//! between the ready wait and the release of the command-select line.

use platform::vs1053::{SCI_READ, SCI_WRITE};
use platform::{BusSpeed, DecoderBus, WaitStrategy};

/// Ready budget for a single register transaction.
pub const REGISTER_READY_TIMEOUT_MS: u32 = 100;

/// Register-level access to the decoder.
pub struct Sci<B, W> {
    bus: B,
    wait: W,
    timed_out: bool,
}

impl<B: DecoderBus, W: WaitStrategy> Sci<B, W> {
    /// Wrap a transport and a wait strategy.
    pub fn new(bus: B, wait: W) -> Self {
        Self {
            bus,
            wait,
            timed_out: false,
        }
    }

    /// Write a 16-bit register, high byte first.
    pub fn write_register(&mut self, addr: u8, value: u16) {
        self.begin();
        let [hi, lo] = value.to_be_bytes();
        self.bus.exchange(SCI_WRITE);
        self.bus.exchange(addr);
        self.bus.exchange(hi);
        self.bus.exchange(lo);
        self.end();
        tracing::trace!(addr, value, "sci write");
    }

    /// Read a 16-bit register.
    pub fn read_register(&mut self, addr: u8) -> u16 {
        self.begin();
        self.bus.exchange(SCI_READ);
        self.bus.exchange(addr);
        let hi = self.bus.exchange(0xFF);
        let lo = self.bus.exchange(0xFF);
        self.end();
        let value = u16::from_be_bytes([hi, lo]);
        tracing::trace!(addr, value, "sci read");
        value
    }

    /// Wait up to `timeout_ms` for the ready line.
    pub fn wait_ready(&mut self, timeout_ms: u32) -> bool {
        let bus = &mut self.bus;
        self.wait.wait_until(&mut || bus.is_ready(), timeout_ms)
    }

    /// Sample the ready line once.
    pub fn is_ready(&mut self) -> bool {
        self.bus.is_ready()
    }

    /// Clock `bytes` out on the data channel without checking readiness.
    pub fn send_data(&mut self, bytes: &[u8]) {
        self.bus.select_data(true);
        self.bus.write_all(bytes);
        self.bus.select_data(false);
    }

    /// Unconditional settle delay.
    pub fn delay_ms(&mut self, ms: u32) {
        self.wait.delay_ms(ms);
    }

    /// `true` if any register transaction ran without seeing the ready line
    /// since the last call. Clears the flag.
    pub fn take_timeout(&mut self) -> bool {
        core::mem::take(&mut self.timed_out)
    }

    /// The transport.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// The transport, mutably (reset line, speed, raw selects).
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the transport and wait strategy back.
    pub fn release(self) -> (B, W) {
        (self.bus, self.wait)
    }

    fn begin(&mut self) {
        if !self.wait_ready(REGISTER_READY_TIMEOUT_MS) {
            // The transaction still goes out; a dead chip shows up in read-back.
            self.timed_out = true;
            tracing::warn!("decoder not ready for register access");
        }
        self.bus.set_speed(BusSpeed::Low);
        self.bus.select_command(true);
    }

    fn end(&mut self) {
        self.bus.select_command(false);
        self.bus.set_speed(BusSpeed::High);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{FakeDelay, SimulatedVs1053};
    use platform::vs1053::{SCI_CLOCKF, SCI_VOL};
    use platform::DelayWait;

    fn sci(chip: &SimulatedVs1053) -> Sci<SimulatedVs1053, DelayWait<FakeDelay>> {
        Sci::new(chip.clone(), DelayWait::new(FakeDelay::new()))
    }

    #[test]
    fn write_then_read_back() {
        let chip = SimulatedVs1053::new();
        let mut sci = sci(&chip);
        sci.write_register(SCI_VOL, 0x1234);
        assert_eq!(sci.read_register(SCI_VOL), 0x1234);
        assert_eq!(chip.register(SCI_VOL), 0x1234);
    }

    #[test]
    fn register_access_runs_at_low_speed_and_restores_high() {
        let chip = SimulatedVs1053::new();
        let mut sci = sci(&chip);
        sci.bus_mut().set_speed(BusSpeed::High);
        sci.write_register(SCI_CLOCKF, 0x9800);
        let _ = sci.read_register(SCI_CLOCKF);
        assert_eq!(chip.sci_at_high_speed(), 0);
        assert_eq!(chip.speed(), BusSpeed::High);
    }

    #[test]
    fn every_transaction_samples_ready_first() {
        let chip = SimulatedVs1053::new();
        let mut sci = sci(&chip);
        sci.write_register(SCI_VOL, 0);
        sci.write_register(SCI_VOL, 1);
        assert_eq!(chip.ready_polls(), 2);
    }

    #[test]
    fn busy_chip_sets_timeout_flag_but_still_writes() {
        let chip = SimulatedVs1053::new();
        chip.set_ready(false);
        let mut sci = sci(&chip);
        sci.write_register(SCI_VOL, 0x4242);
        assert!(sci.take_timeout());
        assert!(!sci.take_timeout());
        assert_eq!(chip.register(SCI_VOL), 0x4242);
    }

    #[test]
    fn waits_through_a_short_busy_period() {
        let chip = SimulatedVs1053::new();
        chip.script_ready([false, false, false]);
        let mut sci = sci(&chip);
        sci.write_register(SCI_VOL, 7);
        assert!(!sci.take_timeout());
        assert_eq!(chip.ready_polls(), 4);
    }
}

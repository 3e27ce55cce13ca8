//! Bounded waiting on the decoder's busy/ready line
//!
//! Every place the decoder protocol has to wait for the chip goes through a
//! [`WaitStrategy`], so the policy (spin with a millisecond delay on the
//! target, virtual time in tests) is swappable. All waits are bounded: the
//! caller always gets `false` back instead of hanging on a dead chip.

use embedded_hal::delay::DelayNs;

/// Capability to wait for a condition with a millisecond budget.
pub trait WaitStrategy {
    /// Poll `ready` until it returns `true` or `timeout_ms` has elapsed.
    ///
    /// Returns `true` when the condition was observed. `ready` is always
    /// polled at least once, so a zero timeout is a plain sample.
    fn wait_until(&mut self, ready: &mut dyn FnMut() -> bool, timeout_ms: u32) -> bool;

    /// Unconditional settle delay.
    fn delay_ms(&mut self, ms: u32);
}

impl<T: WaitStrategy + ?Sized> WaitStrategy for &mut T {
    fn wait_until(&mut self, ready: &mut dyn FnMut() -> bool, timeout_ms: u32) -> bool {
        (**self).wait_until(ready, timeout_ms)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms);
    }
}

/// Polls once per millisecond using an `embedded-hal` delay provider.
///
/// This is the blocking-mode strategy on hardware: the CPU spins in the
/// delay between samples of the ready line.
pub struct DelayWait<D> {
    delay: D,
}

impl<D: DelayNs> DelayWait<D> {
    /// Wrap a delay provider.
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    /// Give the delay provider back.
    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> WaitStrategy for DelayWait<D> {
    fn wait_until(&mut self, ready: &mut dyn FnMut() -> bool, timeout_ms: u32) -> bool {
        let mut waited = 0u32;
        loop {
            if ready() {
                return true;
            }
            if waited >= timeout_ms {
                return false;
            }
            self.delay.delay_ms(1);
            waited = waited.saturating_add(1);
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

//! [`DecoderBus`] over `embedded-hal` 1.0 parts
//!
//! Wires a raw [`SpiBus`] plus the four control lines of the decoder board
//! into the byte-level transport the playback core expects:
//!
//! | Line  | Direction | Active level |
//! |-------|-----------|--------------|
//! | XCS   | out       | low (command channel) |
//! | XDCS  | out       | low (data channel) |
//! | XRESET| out       | low (chip held in reset) |
//! | DREQ  | in        | high (ready for 32 bytes) |
//!
//! Transport errors are counted and logged, never propagated: the register
//! protocol detects a dead chip through read-back mismatches.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::bus::{BusClock, BusSpeed, DecoderBus};

/// Decoder transport built from an SPI bus and GPIO lines.
pub struct SpiDecoderBus<SPI, XCS, XDCS, RST, DREQ, CLK = ()> {
    spi: SPI,
    xcs: XCS,
    xdcs: XDCS,
    reset: RST,
    dreq: DREQ,
    clock: CLK,
    speed: BusSpeed,
    faults: u32,
}

impl<SPI, XCS, XDCS, RST, DREQ> SpiDecoderBus<SPI, XCS, XDCS, RST, DREQ, ()> {
    /// Create a bus with a fixed clock rate.
    pub fn new(spi: SPI, xcs: XCS, xdcs: XDCS, reset: RST, dreq: DREQ) -> Self {
        Self {
            spi,
            xcs,
            xdcs,
            reset,
            dreq,
            clock: (),
            speed: BusSpeed::Low,
            faults: 0,
        }
    }
}

impl<SPI, XCS, XDCS, RST, DREQ, CLK> SpiDecoderBus<SPI, XCS, XDCS, RST, DREQ, CLK> {
    /// Attach a clock controller so [`DecoderBus::set_speed`] reconfigures the peripheral.
    pub fn with_clock<C: BusClock>(self, clock: C) -> SpiDecoderBus<SPI, XCS, XDCS, RST, DREQ, C> {
        SpiDecoderBus {
            spi: self.spi,
            xcs: self.xcs,
            xdcs: self.xdcs,
            reset: self.reset,
            dreq: self.dreq,
            clock,
            speed: self.speed,
            faults: self.faults,
        }
    }

    /// Number of transport errors swallowed so far.
    pub fn fault_count(&self) -> u32 {
        self.faults
    }

    /// Current clock rate class.
    pub fn speed(&self) -> BusSpeed {
        self.speed
    }

    /// Give the parts back.
    pub fn release(self) -> (SPI, XCS, XDCS, RST, DREQ) {
        (self.spi, self.xcs, self.xdcs, self.reset, self.dreq)
    }

    fn fault(&mut self, what: &'static str) {
        self.faults = self.faults.saturating_add(1);
        tracing::warn!(faults = self.faults, "decoder bus fault: {}", what);
    }
}

/// Drive an active-low output.
fn drive_active_low<P: OutputPin>(pin: &mut P, active: bool) -> Result<(), P::Error> {
    if active {
        pin.set_low()
    } else {
        pin.set_high()
    }
}

impl<SPI, XCS, XDCS, RST, DREQ, CLK> DecoderBus for SpiDecoderBus<SPI, XCS, XDCS, RST, DREQ, CLK>
where
    SPI: SpiBus<u8>,
    XCS: OutputPin,
    XDCS: OutputPin,
    RST: OutputPin,
    DREQ: InputPin,
    CLK: BusClock,
{
    fn exchange(&mut self, byte: u8) -> u8 {
        let mut buf = [byte];
        if self.spi.transfer_in_place(&mut buf).is_err() {
            self.fault("spi transfer");
            return 0xFF;
        }
        let [rx] = buf;
        rx
    }

    fn write_all(&mut self, bytes: &[u8]) {
        if self.spi.write(bytes).is_err() {
            self.fault("spi write");
        }
    }

    fn select_command(&mut self, active: bool) {
        // Every byte must be on the wire before the select line is released.
        if !active && self.spi.flush().is_err() {
            self.fault("spi flush");
        }
        if drive_active_low(&mut self.xcs, active).is_err() {
            self.fault("xcs");
        }
    }

    fn select_data(&mut self, active: bool) {
        if !active && self.spi.flush().is_err() {
            self.fault("spi flush");
        }
        if drive_active_low(&mut self.xdcs, active).is_err() {
            self.fault("xdcs");
        }
    }

    fn set_speed(&mut self, speed: BusSpeed) {
        if self.speed != speed {
            self.clock.set_speed(speed);
            self.speed = speed;
        }
    }

    fn is_ready(&mut self) -> bool {
        match self.dreq.is_high() {
            Ok(ready) => ready,
            Err(_) => {
                self.fault("dreq");
                false
            }
        }
    }

    fn set_reset(&mut self, asserted: bool) {
        if drive_active_low(&mut self.reset, asserted).is_err() {
            self.fault("xreset");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    type MockBus<CLK = ()> = SpiDecoderBus<SpiMock<u8>, PinMock, PinMock, PinMock, PinMock, CLK>;

    struct RecordingClock(std::vec::Vec<BusSpeed>);

    impl BusClock for &mut RecordingClock {
        fn set_speed(&mut self, speed: BusSpeed) {
            self.0.push(speed);
        }
    }

    fn idle() -> PinMock {
        PinMock::new(&[])
    }

    fn finish<CLK>(bus: MockBus<CLK>) {
        let (mut spi, mut xcs, mut xdcs, mut rst, mut dreq) = bus.release();
        spi.done();
        xcs.done();
        xdcs.done();
        rst.done();
        dreq.done();
    }

    #[test]
    fn exchange_is_full_duplex_single_byte() {
        let spi = SpiMock::new(&[SpiTransaction::transfer_in_place(vec![0x03], vec![0xAB])]);
        let mut bus = SpiDecoderBus::new(spi, idle(), idle(), idle(), idle());

        assert_eq!(bus.exchange(0x03), 0xAB);
        assert_eq!(bus.fault_count(), 0);
        finish(bus);
    }

    #[test]
    fn command_select_is_active_low_and_flushes_on_release() {
        let spi = SpiMock::new(&[SpiTransaction::flush()]);
        let xcs = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut bus = SpiDecoderBus::new(spi, xcs, idle(), idle(), idle());

        bus.select_command(true);
        bus.select_command(false);
        finish(bus);
    }

    #[test]
    fn ready_line_reads_dreq_high() {
        let dreq = PinMock::new(&[
            PinTransaction::get(State::High),
            PinTransaction::get(State::Low),
        ]);
        let mut bus = SpiDecoderBus::new(SpiMock::new(&[]), idle(), idle(), idle(), dreq);

        assert!(bus.is_ready());
        assert!(!bus.is_ready());
        finish(bus);
    }

    #[test]
    fn reset_is_active_low() {
        let rst = PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]);
        let mut bus = SpiDecoderBus::new(SpiMock::new(&[]), idle(), idle(), rst, idle());

        bus.set_reset(true);
        bus.set_reset(false);
        finish(bus);
    }

    #[test]
    fn speed_changes_reach_the_clock_once() {
        let mut clock = RecordingClock(std::vec::Vec::new());
        let mut bus = SpiDecoderBus::new(SpiMock::new(&[]), idle(), idle(), idle(), idle())
            .with_clock(&mut clock);

        bus.set_speed(BusSpeed::High);
        bus.set_speed(BusSpeed::High);
        bus.set_speed(BusSpeed::Low);
        assert_eq!(bus.speed(), BusSpeed::Low);
        finish(bus);

        assert_eq!(clock.0, vec![BusSpeed::High, BusSpeed::Low]);
    }
}

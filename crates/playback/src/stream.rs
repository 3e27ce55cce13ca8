//! File-to-decoder streaming pump.
//!
//! ```text
//! Closed ─open()─► HeaderCheck ─► Streaming ─EOF─► Draining ─► Closed
//!                                     │
//!                                     └─read error──────────────► Closed
//! ```
//!
//! Each [`StreamPump::tick`] does at most one bounded unit of work: sample
//! DREQ, refill the 512-byte block if it is used up, then send 32-byte
//! slices while DREQ stays high. A tick that finds the decoder busy touches
//! neither the file nor the cursor.
//!
//! After end of file the pump pads the stream with the decoder's end-fill
//! byte so the last frames are decoded, using the same DREQ gating.

use platform::config::READ_BLOCK_LEN;
use platform::vs1053::{END_FILL_LEN, SDI_BLOCK_LEN};
use platform::{DecoderBus, File, WaitStrategy};

use crate::decoder::{SendStatus, Vs1053};

/// Length of an ID3v2 tag header.
pub const ID3_HEADER_LEN: usize = 10;
const ID3_MAGIC: &[u8; 3] = b"ID3";

/// Pump lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpState {
    /// No file.
    Closed,
    /// Probing for a leading metadata tag.
    HeaderCheck,
    /// Feeding file data.
    Streaming,
    /// File exhausted, sending end-fill padding.
    Draining,
}

/// Why a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamEnd {
    /// The whole file was sent.
    EndOfFile,
    /// The file could not be read further.
    ReadError,
}

/// Result of one pump tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Nothing to do (no open stream, or playback not running).
    Idle,
    /// DREQ low; nothing moved.
    Busy,
    /// Bytes handed to the decoder this tick.
    Sent(usize),
    /// The stream is over and the file closed.
    Finished(StreamEnd),
}

/// Open file plus the staged transfer block.
///
/// Invariant: `offset <= valid <= READ_BLOCK_LEN`.
pub struct StreamCursor<F> {
    file: F,
    block: [u8; READ_BLOCK_LEN],
    valid: usize,
    offset: usize,
    audio_start: u64,
    streamed: u64,
}

impl<F: File> StreamCursor<F> {
    fn new(file: F, audio_start: u64) -> Self {
        Self {
            file,
            block: [0; READ_BLOCK_LEN],
            valid: 0,
            offset: 0,
            audio_start,
            streamed: 0,
        }
    }

    /// Bytes staged and not yet sent.
    pub fn pending(&self) -> usize {
        self.valid.saturating_sub(self.offset)
    }

    /// Offset into the staged block already sent.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes of the staged block that hold file data.
    pub fn valid(&self) -> usize {
        self.valid
    }

    /// File offset of the first audio byte.
    pub fn audio_start(&self) -> u64 {
        self.audio_start
    }

    /// Audio bytes handed to the decoder so far.
    pub fn streamed(&self) -> u64 {
        self.streamed
    }

    /// Total file size.
    pub fn file_size(&self) -> u64 {
        self.file.size()
    }

    fn refill(&mut self) -> Result<usize, F::Error> {
        let n = self.file.read(&mut self.block)?.min(READ_BLOCK_LEN);
        self.valid = n;
        self.offset = 0;
        Ok(n)
    }

    fn next_slice(&self) -> &[u8] {
        let end = self.offset.saturating_add(SDI_BLOCK_LEN).min(self.valid);
        self.block.get(self.offset..end).unwrap_or(&[])
    }

    fn advance(&mut self, n: usize) {
        self.offset = self.offset.saturating_add(n).min(self.valid);
        self.streamed = self.streamed.saturating_add(n as u64);
    }
}

/// Decode the 28-bit synchsafe size of an ID3v2 header.
fn synchsafe(bytes: [u8; 4]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| (acc << 7) | u32::from(b & 0x7F))
}

/// Position `file` at the first audio byte and return that offset.
///
/// With a leading ID3v2 tag the file is positioned past the tag
/// (`size + 10`); otherwise it is rewound to the start.
pub fn skip_metadata<F: File>(file: &mut F) -> Result<u64, F::Error> {
    let mut header = [0u8; ID3_HEADER_LEN];
    let mut filled = 0usize;
    while filled < ID3_HEADER_LEN {
        let rest = header.get_mut(filled..).unwrap_or(&mut []);
        let n = file.read(rest)?;
        if n == 0 {
            break;
        }
        filled = filled.saturating_add(n);
    }

    let start = if filled == ID3_HEADER_LEN && header.starts_with(ID3_MAGIC) {
        let [.., s0, s1, s2, s3] = header;
        let start = u64::from(synchsafe([s0, s1, s2, s3])).saturating_add(ID3_HEADER_LEN as u64);
        tracing::debug!(start, "skipping ID3 tag");
        start
    } else {
        0
    };
    file.seek(start)?;
    Ok(start)
}

/// Streams one file into the decoder.
pub struct StreamPump<F> {
    cursor: Option<StreamCursor<F>>,
    state: PumpState,
    drain_remaining: usize,
    fill_byte: u8,
}

impl<F: File> Default for StreamPump<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: File> StreamPump<F> {
    /// A closed pump.
    pub fn new() -> Self {
        Self {
            cursor: None,
            state: PumpState::Closed,
            drain_remaining: 0,
            fill_byte: 0,
        }
    }

    /// Take ownership of `file`, skip any metadata tag and start streaming.
    ///
    /// Any previous file is closed first. On error the pump stays closed.
    pub fn open(&mut self, mut file: F) -> Result<(), F::Error> {
        self.close();
        self.state = PumpState::HeaderCheck;
        match skip_metadata(&mut file) {
            Ok(start) => {
                self.cursor = Some(StreamCursor::new(file, start));
                self.state = PumpState::Streaming;
                Ok(())
            }
            Err(e) => {
                self.state = PumpState::Closed;
                Err(e)
            }
        }
    }

    /// Drop the file, if any.
    pub fn close(&mut self) {
        self.cursor = None;
        self.state = PumpState::Closed;
        self.drain_remaining = 0;
    }

    /// Current state.
    pub fn state(&self) -> PumpState {
        self.state
    }

    /// A file is open (streaming or draining).
    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// The cursor of the open file.
    pub fn cursor(&self) -> Option<&StreamCursor<F>> {
        self.cursor.as_ref()
    }

    /// One unit of work. Never waits on DREQ.
    pub fn tick<B, W>(&mut self, decoder: &mut Vs1053<B, W>) -> TickOutcome
    where
        B: DecoderBus,
        W: WaitStrategy,
    {
        match self.state {
            PumpState::Closed | PumpState::HeaderCheck => TickOutcome::Idle,
            PumpState::Streaming => self.stream(decoder),
            PumpState::Draining => self.drain(decoder),
        }
    }

    fn stream<B: DecoderBus, W: WaitStrategy>(&mut self, decoder: &mut Vs1053<B, W>) -> TickOutcome {
        if !decoder.is_data_ready() {
            return TickOutcome::Busy;
        }
        let Some(cursor) = self.cursor.as_mut() else {
            self.state = PumpState::Closed;
            return TickOutcome::Idle;
        };

        if cursor.pending() == 0 {
            match cursor.refill() {
                Ok(0) => {
                    tracing::debug!(streamed = cursor.streamed(), "end of file");
                    self.fill_byte = decoder.end_fill_byte();
                    self.drain_remaining = END_FILL_LEN;
                    self.state = PumpState::Draining;
                    return self.drain(decoder);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = ?e, "read error, ending stream");
                    self.close();
                    return TickOutcome::Finished(StreamEnd::ReadError);
                }
            }
        }

        let mut sent = 0usize;
        while cursor.pending() > 0 {
            let slice = cursor.next_slice();
            let len = slice.len();
            match decoder.send_block(slice) {
                SendStatus::Sent => {
                    cursor.advance(len);
                    sent = sent.saturating_add(len);
                }
                SendStatus::Busy => break,
            }
        }
        if sent == 0 {
            TickOutcome::Busy
        } else {
            TickOutcome::Sent(sent)
        }
    }

    fn drain<B: DecoderBus, W: WaitStrategy>(&mut self, decoder: &mut Vs1053<B, W>) -> TickOutcome {
        let block = [self.fill_byte; SDI_BLOCK_LEN];
        let mut sent = 0usize;
        while self.drain_remaining > 0 {
            let n = self.drain_remaining.min(SDI_BLOCK_LEN);
            let chunk = block.get(..n).unwrap_or(&block);
            match decoder.send_block(chunk) {
                SendStatus::Sent => {
                    self.drain_remaining = self.drain_remaining.saturating_sub(n);
                    sent = sent.saturating_add(n);
                }
                SendStatus::Busy => break,
            }
        }
        if self.drain_remaining == 0 {
            self.close();
            TickOutcome::Finished(StreamEnd::EndOfFile)
        } else if sent == 0 {
            TickOutcome::Busy
        } else {
            TickOutcome::Sent(sent)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::decoder::DecoderConfig;
    use platform::mocks::{FakeDelay, MemFile, MemStorage, SimulatedVs1053};
    use platform::{DelayWait, Storage};

    type TestDecoder = Vs1053<SimulatedVs1053, DelayWait<FakeDelay>>;

    fn decoder(chip: &SimulatedVs1053) -> TestDecoder {
        let mut dec = Vs1053::new(
            chip.clone(),
            DelayWait::new(FakeDelay::new()),
            DecoderConfig::default(),
        );
        dec.initialize().unwrap();
        dec.start_decode().unwrap();
        chip.clear_sdi();
        dec
    }

    fn open(data: &[u8]) -> MemFile {
        let mut storage = MemStorage::with_files([("/t.mp3", data)]);
        storage.open_file("/t.mp3").unwrap()
    }

    fn id3(size: u32, body: &[u8]) -> Vec<u8> {
        let mut v = b"ID3\x04\x00\x00".to_vec();
        v.extend_from_slice(&[
            ((size >> 21) & 0x7F) as u8,
            ((size >> 14) & 0x7F) as u8,
            ((size >> 7) & 0x7F) as u8,
            (size & 0x7F) as u8,
        ]);
        v.extend(std::iter::repeat(0xEE).take(size as usize));
        v.extend_from_slice(body);
        v
    }

    fn run_to_end(pump: &mut StreamPump<MemFile>, dec: &mut TestDecoder) -> StreamEnd {
        for _ in 0..10_000 {
            if let TickOutcome::Finished(end) = pump.tick(dec) {
                return end;
            }
        }
        panic!("stream never finished");
    }

    #[test]
    fn synchsafe_decodes_seven_bit_groups() {
        assert_eq!(synchsafe([0x00, 0x00, 0x02, 0x01]), 257);
        assert_eq!(synchsafe([0x7F, 0x7F, 0x7F, 0x7F]), 0x0FFF_FFFF);
    }

    #[test]
    fn tagged_file_skips_header_plus_ten() {
        let data = id3(300, b"audio");
        let mut file = open(&data);
        assert_eq!(skip_metadata(&mut file).unwrap(), 310);
        let mut buf = [0u8; 5];
        file.read(&mut buf).unwrap();
        assert_eq!(&buf, b"audio");
    }

    #[test]
    fn untagged_file_rewinds_to_start() {
        let mut file = open(b"\xFF\xFBframe data");
        assert_eq!(skip_metadata(&mut file).unwrap(), 0);
        let mut buf = [0u8; 2];
        file.read(&mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFB]);
    }

    #[test]
    fn short_file_rewinds_to_start() {
        let mut file = open(b"ID3");
        assert_eq!(skip_metadata(&mut file).unwrap(), 0);
    }

    #[test]
    fn streams_whole_file_then_end_fill() {
        let chip = SimulatedVs1053::new();
        let mut dec = decoder(&chip);
        chip.set_ram(platform::vs1053::PARAM_END_FILL_BYTE, 0x55);
        let body: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let mut pump = StreamPump::new();
        pump.open(open(&id3(20, &body))).unwrap();

        assert_eq!(run_to_end(&mut pump, &mut dec), StreamEnd::EndOfFile);
        let sdi = chip.sdi_bytes();
        assert_eq!(&sdi[..body.len()], &body[..]);
        assert_eq!(sdi.len(), body.len() + END_FILL_LEN);
        assert!(sdi[body.len()..].iter().all(|&b| b == 0x55));
        assert_eq!(pump.state(), PumpState::Closed);
        assert!(!pump.is_open());
    }

    #[test]
    fn busy_decoder_does_not_move_cursor() {
        let chip = SimulatedVs1053::new();
        let mut dec = decoder(&chip);
        let mut pump = StreamPump::new();
        pump.open(open(&[1u8; 100])).unwrap();

        chip.set_ready(false);
        for _ in 0..5 {
            assert_eq!(pump.tick(&mut dec), TickOutcome::Busy);
        }
        let cursor = pump.cursor().unwrap();
        assert_eq!(cursor.valid(), 0);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(chip.sdi_len(), 0);

        chip.set_ready(true);
        assert_eq!(pump.tick(&mut dec), TickOutcome::Sent(100));
    }

    #[test]
    fn busy_midway_keeps_remaining_bytes_staged() {
        let chip = SimulatedVs1053::new();
        let mut dec = decoder(&chip);
        let mut pump = StreamPump::new();
        pump.open(open(&[2u8; 100])).unwrap();

        // One sample for the tick's own check, two blocks, then busy.
        chip.script_ready([true, true, true, false]);
        assert_eq!(pump.tick(&mut dec), TickOutcome::Sent(64));
        let cursor = pump.cursor().unwrap();
        assert_eq!(cursor.offset(), 64);
        assert_eq!(cursor.pending(), 36);
    }

    #[test]
    fn final_partial_slice_is_short() {
        let chip = SimulatedVs1053::new();
        let mut dec = decoder(&chip);
        let mut pump = StreamPump::new();
        pump.open(open(&[3u8; 40])).unwrap();
        assert_eq!(pump.tick(&mut dec), TickOutcome::Sent(40));
        assert_eq!(chip.sdi_len(), 40);
    }

    #[test]
    fn read_error_finishes_without_padding() {
        let chip = SimulatedVs1053::new();
        let mut dec = decoder(&chip);
        let mut storage = MemStorage::with_files([("/bad.mp3", &[0u8; 2048][..])]);
        storage.fail_read_at("/bad.mp3", 1024);
        let mut pump = StreamPump::new();
        pump.open(storage.open_file("/bad.mp3").unwrap()).unwrap();

        assert_eq!(run_to_end(&mut pump, &mut dec), StreamEnd::ReadError);
        assert_eq!(chip.sdi_len(), 1024);
    }

    #[test]
    fn closed_pump_is_idle() {
        let chip = SimulatedVs1053::new();
        let mut dec = decoder(&chip);
        let mut pump: StreamPump<MemFile> = StreamPump::new();
        assert_eq!(pump.tick(&mut dec), TickOutcome::Idle);
    }
}

//! Mock implementations for testing
//!
//! Host-side stand-ins for every collaborator of the playback core:
//!
//! - [`SimulatedVs1053`]: register-accurate fake decoder chip behind
//!   [`DecoderBus`], with a scriptable ready line and fault injection
//! - [`MemStorage`]: in-memory [`Storage`] with open/read/list failures
//! - [`ScriptedInput`]: queued [`InputEvent`]s
//! - [`FakeDelay`]: `DelayNs` that only accumulates virtual time
//!
//! The chip and the storage are cheap shared handles (`Clone`), so a test
//! keeps one handle for inspection while the player owns the other.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::bus::{BusSpeed, DecoderBus};
use crate::config::MAX_DIR_ENTRIES;
use crate::input::{InputDevice, InputEvent};
use crate::storage::{File, Storage, TrackEntry, TrackList};
use crate::vs1053::{
    MODE_AFTER_RESET, SCI_DECODE_TIME, SCI_HDAT0, SCI_HDAT1, SCI_MODE, SCI_READ, SCI_WRAM,
    SCI_WRAMADDR, SCI_WRITE, SELF_TEST_COMMAND, SELF_TEST_SIGNATURE_VS1053, SINE_TEST_START,
    SINE_TEST_STOP, SM_CANCEL, SM_RESET, SM_TESTS,
};

// ── SimulatedVs1053 ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum SciPhase {
    Idle,
    Address { op: u8 },
    WriteHi { addr: u8 },
    WriteLo { addr: u8, hi: u8 },
    ReadHi { addr: u8 },
    ReadLo { lo: u8 },
    Done,
}

#[derive(Debug)]
struct ChipState {
    regs: [u16; 16],
    ram: HashMap<u16, u16>,
    ram_addr: u16,
    phase: SciPhase,
    command_selected: bool,
    data_selected: bool,
    speed: BusSpeed,
    reset_asserted: bool,
    ready_script: VecDeque<bool>,
    ready_default: bool,
    ready_polls: u64,
    sdi: Vec<u8>,
    test_window: VecDeque<u8>,
    cancel_ack_after: Option<usize>,
    cancel_bytes: usize,
    signature: u16,
    sticky_hdat: bool,
    stuck_reset: bool,
    floating: bool,
    hard_resets: u32,
    soft_resets: u32,
    writes: Vec<(u8, u16)>,
    sci_at_high_speed: u32,
    sine: Option<u8>,
}

impl ChipState {
    fn power_on() -> Self {
        let mut regs = [0u16; 16];
        regs[usize::from(SCI_MODE)] = MODE_AFTER_RESET;
        Self {
            regs,
            ram: HashMap::new(),
            ram_addr: 0,
            phase: SciPhase::Idle,
            command_selected: false,
            data_selected: false,
            speed: BusSpeed::Low,
            reset_asserted: false,
            ready_script: VecDeque::new(),
            ready_default: true,
            ready_polls: 0,
            sdi: Vec::new(),
            test_window: VecDeque::new(),
            cancel_ack_after: Some(64),
            cancel_bytes: 0,
            signature: SELF_TEST_SIGNATURE_VS1053,
            sticky_hdat: false,
            stuck_reset: false,
            floating: false,
            hard_resets: 0,
            soft_resets: 0,
            writes: Vec::new(),
            sci_at_high_speed: 0,
            sine: None,
        }
    }

    fn reg(&self, addr: u8) -> u16 {
        self.regs[usize::from(addr & 0x0F)]
    }

    fn set_reg(&mut self, addr: u8, value: u16) {
        self.regs[usize::from(addr & 0x0F)] = value;
    }

    fn soft_reset(&mut self) {
        self.soft_resets += 1;
        self.set_reg(SCI_DECODE_TIME, 0);
        if !self.sticky_hdat {
            self.set_reg(SCI_HDAT0, 0);
            self.set_reg(SCI_HDAT1, 0);
        }
        self.cancel_bytes = 0;
        self.sine = None;
        self.test_window.clear();
    }

    fn hard_reset(&mut self) {
        self.hard_resets += 1;
        let keep_ram = std::mem::take(&mut self.ram);
        let fresh = Self::power_on();
        self.regs = fresh.regs;
        self.ram = keep_ram;
        self.ram_addr = 0;
        self.cancel_bytes = 0;
        self.sine = None;
        self.sticky_hdat = false;
        self.test_window.clear();
    }

    fn write_reg(&mut self, addr: u8, value: u16) {
        self.writes.push((addr, value));
        match addr {
            SCI_MODE => {
                let previous = self.reg(SCI_MODE);
                if value & SM_RESET != 0 {
                    self.soft_reset();
                    let after = if self.stuck_reset {
                        value
                    } else {
                        value & !SM_RESET
                    };
                    self.set_reg(SCI_MODE, after);
                } else {
                    self.set_reg(SCI_MODE, value);
                }
                if value & SM_CANCEL != 0 && previous & SM_CANCEL == 0 {
                    self.cancel_bytes = 0;
                }
            }
            SCI_WRAMADDR => {
                self.ram_addr = value;
                self.set_reg(addr, value);
            }
            SCI_WRAM => {
                self.ram.insert(self.ram_addr, value);
                self.ram_addr = self.ram_addr.wrapping_add(1);
            }
            SCI_HDAT0 | SCI_HDAT1 => {}
            _ => self.set_reg(addr, value),
        }
    }

    fn read_reg(&mut self, addr: u8) -> u16 {
        if addr == SCI_WRAM {
            let value = self.ram.get(&self.ram_addr).copied().unwrap_or(0);
            self.ram_addr = self.ram_addr.wrapping_add(1);
            value
        } else {
            self.reg(addr)
        }
    }

    fn sci_byte(&mut self, byte: u8) -> u8 {
        let (next, out) = match self.phase {
            SciPhase::Idle => {
                if self.speed == BusSpeed::High {
                    self.sci_at_high_speed += 1;
                }
                (SciPhase::Address { op: byte }, 0)
            }
            SciPhase::Address { op } if op == SCI_WRITE => (SciPhase::WriteHi { addr: byte }, 0),
            SciPhase::Address { op } if op == SCI_READ => (SciPhase::ReadHi { addr: byte }, 0),
            SciPhase::Address { .. } => (SciPhase::Done, 0),
            SciPhase::WriteHi { addr } => (SciPhase::WriteLo { addr, hi: byte }, 0),
            SciPhase::WriteLo { addr, hi } => {
                self.write_reg(addr, u16::from_be_bytes([hi, byte]));
                (SciPhase::Done, 0)
            }
            SciPhase::ReadHi { addr } => {
                let [hi, lo] = self.read_reg(addr).to_be_bytes();
                (SciPhase::ReadLo { lo }, hi)
            }
            SciPhase::ReadLo { lo } => (SciPhase::Done, lo),
            SciPhase::Done => (SciPhase::Done, 0),
        };
        self.phase = next;
        out
    }

    fn sdi_byte(&mut self, byte: u8) {
        self.sdi.push(byte);
        let mode = self.reg(SCI_MODE);
        if mode & SM_CANCEL != 0 {
            self.cancel_bytes += 1;
            if let Some(limit) = self.cancel_ack_after {
                if self.cancel_bytes >= limit {
                    self.set_reg(SCI_MODE, mode & !SM_CANCEL);
                }
            }
        }
        if mode & SM_TESTS != 0 {
            if self.test_window.len() == 8 {
                self.test_window.pop_front();
            }
            self.test_window.push_back(byte);
            self.check_test_command();
        }
    }

    fn check_test_command(&mut self) {
        let window: Vec<u8> = self.test_window.iter().copied().collect();
        if window.len() != 8 {
            return;
        }
        if window == SELF_TEST_COMMAND {
            let signature = self.signature;
            self.set_reg(SCI_HDAT0, signature);
        } else if window == SINE_TEST_STOP {
            self.sine = None;
        } else if window[..3] == SINE_TEST_START && window[4..].iter().all(|&b| b == 0) {
            self.sine = Some(window[3]);
        } else {
            return;
        }
        self.test_window.clear();
    }
}

/// Register-accurate fake VS1053 behind [`DecoderBus`].
///
/// Models the SCI byte protocol (opcode, address, 16-bit value), soft reset
/// through `SM_RESET`, cancel acknowledgement after a configurable number of
/// SDI bytes, the SDI memory and sine tests, RAM access through
/// `WRAMADDR`/`WRAM`, and hard reset through the reset line.
#[derive(Debug, Clone)]
pub struct SimulatedVs1053 {
    inner: Rc<RefCell<ChipState>>,
}

impl Default for SimulatedVs1053 {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedVs1053 {
    /// A healthy VS1053 with the ready line permanently asserted.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ChipState::power_on())),
        }
    }

    /// Current value of an SCI register (no side effects).
    pub fn register(&self, addr: u8) -> u16 {
        self.inner.borrow().reg(addr)
    }

    /// Force an SCI register value, e.g. the decode time.
    pub fn set_register(&self, addr: u8, value: u16) {
        self.inner.borrow_mut().set_reg(addr, value);
    }

    /// Every value written to `addr`, in order.
    pub fn register_writes(&self, addr: u8) -> Vec<u16> {
        self.inner
            .borrow()
            .writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|&(_, v)| v)
            .collect()
    }

    /// Total number of SCI writes seen.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes.len()
    }

    /// Word stored in decoder RAM.
    pub fn ram(&self, addr: u16) -> u16 {
        self.inner.borrow().ram.get(&addr).copied().unwrap_or(0)
    }

    /// Preset a word of decoder RAM (e.g. byte rate or end-fill byte).
    pub fn set_ram(&self, addr: u16, value: u16) {
        self.inner.borrow_mut().ram.insert(addr, value);
    }

    /// Level the ready line reports once the script is exhausted.
    pub fn set_ready(&self, ready: bool) {
        self.inner.borrow_mut().ready_default = ready;
    }

    /// Queue ready-line samples consumed before falling back to the default.
    pub fn script_ready<I: IntoIterator<Item = bool>>(&self, samples: I) {
        self.inner.borrow_mut().ready_script.extend(samples);
    }

    /// Number of times the ready line was sampled.
    pub fn ready_polls(&self) -> u64 {
        self.inner.borrow().ready_polls
    }

    /// Acknowledge `SM_CANCEL` after `bytes` SDI bytes, or never with `None`.
    pub fn set_cancel_ack_after(&self, bytes: Option<usize>) {
        self.inner.borrow_mut().cancel_ack_after = bytes;
    }

    /// HDAT0 value produced by the SDI memory test.
    pub fn set_self_test_signature(&self, signature: u16) {
        self.inner.borrow_mut().signature = signature;
    }

    /// Leave decoded-sample counters behind; `sticky` ones survive soft reset.
    pub fn set_residual_samples(&self, hdat0: u16, hdat1: u16, sticky: bool) {
        let mut s = self.inner.borrow_mut();
        s.set_reg(SCI_HDAT0, hdat0);
        s.set_reg(SCI_HDAT1, hdat1);
        s.sticky_hdat = sticky;
    }

    /// Keep `SM_RESET` set after a reset request, so read-back never matches.
    pub fn set_stuck_reset(&self, stuck: bool) {
        self.inner.borrow_mut().stuck_reset = stuck;
    }

    /// Disconnected chip: every exchanged byte reads back as 0xFF.
    pub fn set_floating(&self, floating: bool) {
        self.inner.borrow_mut().floating = floating;
    }

    /// Advance the decode-time register by `secs`.
    pub fn advance_decode_time(&self, secs: u16) {
        let mut s = self.inner.borrow_mut();
        let t = s.reg(SCI_DECODE_TIME).saturating_add(secs);
        s.set_reg(SCI_DECODE_TIME, t);
    }

    /// Audio bytes received on the data channel (test sequences included).
    pub fn sdi_bytes(&self) -> Vec<u8> {
        self.inner.borrow().sdi.clone()
    }

    /// Number of bytes received on the data channel.
    pub fn sdi_len(&self) -> usize {
        self.inner.borrow().sdi.len()
    }

    /// Forget recorded data-channel bytes.
    pub fn clear_sdi(&self) {
        self.inner.borrow_mut().sdi.clear();
    }

    /// Completed hardware reset pulses.
    pub fn hard_resets(&self) -> u32 {
        self.inner.borrow().hard_resets
    }

    /// Soft resets triggered through `SM_RESET`.
    pub fn soft_resets(&self) -> u32 {
        self.inner.borrow().soft_resets
    }

    /// SCI transactions started while the bus ran at high speed.
    pub fn sci_at_high_speed(&self) -> u32 {
        self.inner.borrow().sci_at_high_speed
    }

    /// Frequency code of the running sine test.
    pub fn sine_tone(&self) -> Option<u8> {
        self.inner.borrow().sine
    }

    /// Current bus clock class.
    pub fn speed(&self) -> BusSpeed {
        self.inner.borrow().speed
    }
}

impl DecoderBus for SimulatedVs1053 {
    fn exchange(&mut self, byte: u8) -> u8 {
        let mut s = self.inner.borrow_mut();
        if s.floating || s.reset_asserted {
            return 0xFF;
        }
        match (s.command_selected, s.data_selected) {
            (true, false) => s.sci_byte(byte),
            (false, true) => {
                s.sdi_byte(byte);
                0
            }
            _ => 0xFF,
        }
    }

    fn select_command(&mut self, active: bool) {
        let mut s = self.inner.borrow_mut();
        s.command_selected = active;
        s.phase = SciPhase::Idle;
    }

    fn select_data(&mut self, active: bool) {
        self.inner.borrow_mut().data_selected = active;
    }

    fn set_speed(&mut self, speed: BusSpeed) {
        self.inner.borrow_mut().speed = speed;
    }

    fn is_ready(&mut self) -> bool {
        let mut s = self.inner.borrow_mut();
        s.ready_polls += 1;
        let scripted = s.ready_script.pop_front();
        if s.reset_asserted {
            return false;
        }
        scripted.unwrap_or(s.ready_default)
    }

    fn set_reset(&mut self, asserted: bool) {
        let mut s = self.inner.borrow_mut();
        if s.reset_asserted && !asserted {
            s.hard_reset();
        }
        s.reset_asserted = asserted;
    }
}

// ── MemStorage ───────────────────────────────────────────────────────────────

/// Failure injected or detected by [`MemStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemStorageError {
    /// No file at that path.
    NotFound,
    /// Failure requested by the test.
    Injected,
}

#[derive(Debug)]
struct MemNode {
    path: String,
    data: Option<Rc<Vec<u8>>>,
}

#[derive(Debug, Default)]
struct MemState {
    nodes: Vec<MemNode>,
    fail_open: HashSet<String>,
    fail_read_at: HashMap<String, usize>,
    fail_listing: bool,
    opened: Vec<String>,
    listings: u32,
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// In-memory [`Storage`] keeping entries in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    inner: Rc<RefCell<MemState>>,
}

impl MemStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage holding one file per `(path, contents)` pair.
    pub fn with_files<'a, I: IntoIterator<Item = (&'a str, &'a [u8])>>(files: I) -> Self {
        let storage = Self::new();
        for (path, data) in files {
            storage.add_file(path, data);
        }
        storage
    }

    /// Add a file at an absolute path.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        self.inner.borrow_mut().nodes.push(MemNode {
            path: path.to_owned(),
            data: Some(Rc::new(data.to_vec())),
        });
    }

    /// Add a directory entry at an absolute path.
    pub fn add_dir(&self, path: &str) {
        self.inner.borrow_mut().nodes.push(MemNode {
            path: path.to_owned(),
            data: None,
        });
    }

    /// Make opening `path` fail.
    pub fn fail_open(&self, path: &str) {
        self.inner.borrow_mut().fail_open.insert(path.to_owned());
    }

    /// Make reads of `path` fail once the position reaches `offset`.
    pub fn fail_read_at(&self, path: &str, offset: usize) {
        self.inner
            .borrow_mut()
            .fail_read_at
            .insert(path.to_owned(), offset);
    }

    /// Make every enumeration fail.
    pub fn fail_listing(&self, fail: bool) {
        self.inner.borrow_mut().fail_listing = fail;
    }

    /// Paths passed to `open_file`, in order.
    pub fn opened(&self) -> Vec<String> {
        self.inner.borrow().opened.clone()
    }

    /// Number of enumeration calls.
    pub fn listings(&self) -> u32 {
        self.inner.borrow().listings
    }
}

/// Open file of a [`MemStorage`].
#[derive(Debug)]
pub struct MemFile {
    data: Rc<Vec<u8>>,
    pos: usize,
    fail_at: Option<usize>,
}

impl File for MemFile {
    type Error = MemStorageError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_at.is_some_and(|at| self.pos >= at) {
            return Err(MemStorageError::Injected);
        }
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, pos: u64) -> Result<u64, Self::Error> {
        self.pos = usize::try_from(pos).unwrap_or(usize::MAX);
        Ok(pos)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl Storage for MemStorage {
    type Error = MemStorageError;
    type File = MemFile;

    fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        let mut s = self.inner.borrow_mut();
        s.opened.push(path.to_owned());
        if s.fail_open.contains(path) {
            return Err(MemStorageError::Injected);
        }
        let data = s
            .nodes
            .iter()
            .find(|n| n.path == path)
            .and_then(|n| n.data.clone())
            .ok_or(MemStorageError::NotFound)?;
        Ok(MemFile {
            data,
            pos: 0,
            fail_at: s.fail_read_at.get(path).copied(),
        })
    }

    fn list_audio_files(&mut self, dir: &str) -> Result<TrackList, Self::Error> {
        let mut s = self.inner.borrow_mut();
        s.listings += 1;
        if s.fail_listing {
            return Err(MemStorageError::Injected);
        }
        let wanted = if dir.len() > 1 {
            dir.trim_end_matches('/')
        } else {
            dir
        };
        let known = wanted == "/"
            || s.nodes
                .iter()
                .any(|n| n.path == wanted || parent_of(&n.path) == wanted);
        let dir = if known { wanted } else { "/" };

        let mut list = TrackList::new();
        for node in s.nodes.iter().filter(|n| parent_of(&n.path) == dir) {
            let name = name_of(&node.path);
            if name.starts_with('.') {
                continue;
            }
            let size = node.data.as_ref().map_or(0, |d| d.len() as u64);
            let Some(entry) = TrackEntry::new(dir, name, size, node.data.is_none()) else {
                continue;
            };
            if (entry.is_audio || entry.is_directory) && list.push(entry).is_err() {
                break;
            }
        }
        debug_assert!(list.len() <= MAX_DIR_ENTRIES);
        Ok(list)
    }
}

// ── ScriptedInput ────────────────────────────────────────────────────────────

/// Input device replaying a queue; `None` entries are idle polls.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: VecDeque<Option<InputEvent>>,
}

impl ScriptedInput {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: InputEvent) -> &mut Self {
        self.events.push_back(Some(event));
        self
    }

    /// Queue `polls` polls that return nothing.
    pub fn idle(&mut self, polls: usize) -> &mut Self {
        self.events.extend(std::iter::repeat(None).take(polls));
        self
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputDevice for ScriptedInput {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front().flatten()
    }
}

// ── FakeDelay ────────────────────────────────────────────────────────────────

/// `DelayNs` that returns immediately and accumulates virtual time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeDelay {
    elapsed_ns: u64,
    calls: u64,
}

impl FakeDelay {
    /// Fresh clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual milliseconds spent in delays.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }

    /// Number of delay calls.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
        self.calls += 1;
    }
}

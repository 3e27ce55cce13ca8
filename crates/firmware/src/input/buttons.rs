//! Debounced GPIO buttons, sampled from the main loop.
//!
//! Buttons are active-low with pull-ups. [`ButtonScanner::scan`] samples
//! every line once; a level must hold for [`DEBOUNCE_MS`] before it counts.
//! A press held for [`LONG_PRESS_MS`] also yields one `ButtonLongPress`.
//!
//! Events queue in a fixed ring of [`CHANNEL_DEPTH`]. When the consumer falls
//! behind, new events are dropped instead of stalling the scan.

use embedded_hal::digital::InputPin;
use heapless::{Deque, Vec};
use platform::{Button, InputDevice, InputEvent};

/// Queued events before drops begin.
pub const CHANNEL_DEPTH: usize = 16;

/// A level must be stable this long to register.
pub const DEBOUNCE_MS: u64 = 20;

/// Hold time for a long press.
pub const LONG_PRESS_MS: u64 = 1000;

struct Line<P> {
    pin: P,
    button: Button,
    pressed: bool,
    candidate: bool,
    candidate_since: u64,
    pressed_at: u64,
    long_sent: bool,
}

/// Scanner over up to `N` button lines.
pub struct ButtonScanner<P, const N: usize> {
    lines: Vec<Line<P>, N>,
    queue: Deque<InputEvent, CHANNEL_DEPTH>,
    dropped: u32,
}

impl<P: InputPin, const N: usize> ButtonScanner<P, N> {
    /// Scanner with no lines attached.
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            queue: Deque::new(),
            dropped: 0,
        }
    }

    /// Attach `pin` as `button`. Hands the pin back when all `N` slots are taken.
    pub fn add(&mut self, pin: P, button: Button) -> Result<(), P> {
        let line = Line {
            pin,
            button,
            pressed: false,
            candidate: false,
            candidate_since: 0,
            pressed_at: 0,
            long_sent: false,
        };
        self.lines.push(line).map_err(|line| line.pin)
    }

    /// Sample every line at `now_ms`.
    pub fn scan(&mut self, now_ms: u64) {
        for i in 0..self.lines.len() {
            let Some(line) = self.lines.get_mut(i) else {
                continue;
            };
            // A pin that cannot be read counts as released.
            let level = line.pin.is_low().unwrap_or(false);
            if level != line.candidate {
                line.candidate = level;
                line.candidate_since = now_ms;
            }

            let mut event = None;
            if line.candidate != line.pressed
                && now_ms.saturating_sub(line.candidate_since) >= DEBOUNCE_MS
            {
                line.pressed = line.candidate;
                if line.pressed {
                    line.pressed_at = now_ms;
                    line.long_sent = false;
                    event = Some(InputEvent::ButtonPress(line.button));
                } else {
                    event = Some(InputEvent::ButtonRelease(line.button));
                }
            } else if line.pressed
                && !line.long_sent
                && now_ms.saturating_sub(line.pressed_at) >= LONG_PRESS_MS
            {
                line.long_sent = true;
                event = Some(InputEvent::ButtonLongPress(line.button));
            }

            if let Some(event) = event {
                self.enqueue(event);
            }
        }
    }

    /// Events lost to a full queue.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Give the pins back.
    pub fn release(self) -> impl Iterator<Item = P> {
        self.lines.into_iter().map(|line| line.pin)
    }

    fn enqueue(&mut self, event: InputEvent) {
        tracing::debug!(?event, "button");
        if self.queue.push_back(event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            tracing::warn!(?event, "input queue full, event dropped");
        }
    }
}

impl<P: InputPin, const N: usize> Default for ButtonScanner<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: InputPin, const N: usize> InputDevice for ButtonScanner<P, N> {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.queue.pop_front()
    }
}

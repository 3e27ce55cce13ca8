//! Stuck-decoder recovery bookkeeping.
//!
//! Aborting a stream escalates through three tiers until the chip is clean:
//!
//! 1. **Cooperative**: set `SM_CANCEL`, feed zeros until the chip clears it,
//!    then pad with the end-fill byte.
//! 2. **SoftReset**: the chip never acknowledged the cancel within the byte
//!    budget.
//! 3. **HardReset**: decoded-sample counters (`HDAT0`/`HDAT1`) were still
//!    nonzero after the lower tiers; pulse the reset line and soft-reset.
//!
//! [`RecoveryLog`] keeps saturating counters per tier so a caller can spot a
//! chip that keeps needing the heavy tiers.

use core::fmt;

/// Deepest recovery tier one cancel needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryTier {
    /// The chip acknowledged the cancel request.
    Cooperative,
    /// Fell back to a soft reset.
    SoftReset,
    /// Escalated to a hardware reset pulse.
    HardReset,
}

impl RecoveryTier {
    /// The next heavier tier (saturates at [`RecoveryTier::HardReset`]).
    pub fn escalate(self) -> Self {
        match self {
            Self::Cooperative => Self::SoftReset,
            Self::SoftReset | Self::HardReset => Self::HardReset,
        }
    }
}

impl fmt::Display for RecoveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cooperative => "cooperative cancel",
            Self::SoftReset => "soft reset",
            Self::HardReset => "hard reset",
        })
    }
}

/// Per-tier recovery counters.
///
/// Counters saturate at [`u16::MAX`] instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryLog {
    cooperative: u16,
    soft: u16,
    hard: u16,
    last: Option<RecoveryTier>,
}

impl RecoveryLog {
    /// Empty log.
    pub const fn new() -> Self {
        Self {
            cooperative: 0,
            soft: 0,
            hard: 0,
            last: None,
        }
    }

    /// Record the outcome of one cancel.
    pub fn record(&mut self, tier: RecoveryTier) {
        let slot = match tier {
            RecoveryTier::Cooperative => &mut self.cooperative,
            RecoveryTier::SoftReset => &mut self.soft,
            RecoveryTier::HardReset => &mut self.hard,
        };
        *slot = slot.saturating_add(1);
        self.last = Some(tier);
    }

    /// How many cancels ended at `tier`.
    pub fn count(&self, tier: RecoveryTier) -> u16 {
        match tier {
            RecoveryTier::Cooperative => self.cooperative,
            RecoveryTier::SoftReset => self.soft,
            RecoveryTier::HardReset => self.hard,
        }
    }

    /// Tier of the most recent cancel.
    pub fn last(&self) -> Option<RecoveryTier> {
        self.last
    }

    /// `true` once any cancel needed more than the cooperative tier.
    pub fn has_escalated(&self) -> bool {
        self.soft > 0 || self.hard > 0
    }
}

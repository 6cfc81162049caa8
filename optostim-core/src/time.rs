//! Time types for the dual-clock scheduler
//!
//! Burst-level timing runs on the coarse millisecond clock and pulse-level
//! timing on the fine microsecond clock. Both counters are 32-bit and wrap.
//! Deadlines are compared by wrapping subtraction ("time elapsed since the
//! deadline"), never by absolute ordering, so a counter wrap between
//! scheduling and expiry is harmless.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Microseconds per millisecond
pub const MICROS_PER_MILLI: u32 = 1_000;

/// Largest interval that can be scheduled ahead on the fine clock
///
/// Anything further away than half the counter range would be read back
/// as already elapsed.
pub const MAX_DEADLINE_US: u32 = i32::MAX as u32;

/// Largest interval that can be scheduled ahead on the coarse clock
pub const MAX_DEADLINE_MS: u32 = i32::MAX as u32;

/// Duration on the coarse clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Self = Self(0);

    /// Raw millisecond count
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Convert to the fine unit
    ///
    /// This is the only coarse-to-fine crossing in the scheduler. Returns
    /// `None` if the value does not fit a 32-bit microsecond count.
    pub const fn to_micros(self) -> Option<Micros> {
        match self.0.checked_mul(MICROS_PER_MILLI) {
            Some(us) => Some(Micros(us)),
            None => None,
        }
    }
}

/// Duration on the fine clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Micros(pub u32);

impl Micros {
    pub const ZERO: Self = Self(0);

    /// Raw microsecond count
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Point on the coarse clock (milliseconds since boot, wrapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MsInstant(pub u32);

impl MsInstant {
    /// Instant `d` after this one
    pub const fn after(self, d: Millis) -> Self {
        Self(self.0.wrapping_add(d.0))
    }

    /// True once `self` (now) is at or past `deadline`
    pub const fn has_reached(self, deadline: Self) -> bool {
        (self.0.wrapping_sub(deadline.0) as i32) >= 0
    }

    /// Time elapsed from `earlier` to `self`
    pub const fn since(self, earlier: Self) -> Millis {
        Millis(self.0.wrapping_sub(earlier.0))
    }
}

/// Point on the fine clock (microseconds since boot, wrapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsInstant(pub u32);

impl UsInstant {
    /// Instant `d` after this one
    pub const fn after(self, d: Micros) -> Self {
        Self(self.0.wrapping_add(d.0))
    }

    /// True once `self` (now) is at or past `deadline`
    pub const fn has_reached(self, deadline: Self) -> bool {
        (self.0.wrapping_sub(deadline.0) as i32) >= 0
    }

    /// Time elapsed from `earlier` to `self`
    pub const fn since(self, earlier: Self) -> Micros {
        Micros(self.0.wrapping_sub(earlier.0))
    }
}

/// One reading of both clocks
///
/// The poll path takes a single snapshot per tick and hands it to every
/// check, so all channels see the same "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    /// Millisecond reading, used for burst and block timing
    pub coarse: MsInstant,
    /// Microsecond reading, used for pulse timing
    pub fine: UsInstant,
}

impl Timestamp {
    /// Build both readings from a 64-bit microsecond uptime
    ///
    /// Each reading is truncated to 32 bits, matching how the hardware
    /// counters wrap.
    pub const fn from_micros(uptime_us: u64) -> Self {
        Self {
            coarse: MsInstant((uptime_us / MICROS_PER_MILLI as u64) as u32),
            fine: UsInstant(uptime_us as u32),
        }
    }
}

//! Master clock and tick counts.

/// A count of master clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// Master crystal of a board.
///
/// Every CPU on the board runs from a divided copy of this frequency. The
/// external scheduler uses it to decide how many CPU cycles fit between two
/// vblank interrupts.
#[derive(Debug, Clone, Copy)]
pub struct MasterClock {
    /// Crystal frequency in Hz.
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Ticks per frame at the given frame rate (integer division).
    #[must_use]
    pub const fn ticks_per_frame(&self, frames_per_second: u64) -> Ticks {
        Ticks::new(self.frequency_hz / frames_per_second)
    }

    /// Cycles per frame for a CPU clocked at `frequency_hz / divider`.
    #[must_use]
    pub const fn cpu_cycles_per_frame(&self, divider: u64, frames_per_second: u64) -> Ticks {
        Ticks::new(self.frequency_hz / divider / frames_per_second)
    }
}

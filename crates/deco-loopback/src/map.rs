//! Per-game read address tables.
//!
//! The protection chip answers reads at scattered addresses that have no
//! arithmetic relation to where the CPU wrote the value. The only way to
//! know them is from the game's firmware, so each game gets a fixed table.
//! Offsets are byte offsets inside the read window.

use std::collections::HashMap;

/// Where a mapped read gets its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A word of the loopback register file.
    Loopback(u8),
    /// Player 1 in the low byte, player 2 in the high byte.
    Players,
    /// Coin and service inputs.
    Coins,
    /// DSW1 in the low byte, DSW2 in the high byte.
    DipSwitches,
    /// The firmware waits here for the next video interrupt.
    SpinUntilInterrupt,
}

/// Immutable lookup from read offset to data source.
#[derive(Debug, Clone)]
pub struct AddressMap {
    name: &'static str,
    entries: HashMap<u16, Source>,
}

impl AddressMap {
    fn from_table(name: &'static str, table: &[(u16, Source)]) -> Self {
        let entries = table.iter().copied().collect::<HashMap<_, _>>();
        debug_assert_eq!(entries.len(), table.len(), "duplicate offset in {name} table");
        Self { name, entries }
    }

    /// Caveman Ninja (and its Stone Age bootleg).
    #[must_use]
    pub fn cninja() -> Self {
        Self::from_table("cninja", CNINJA)
    }

    /// Edward Randy.
    #[must_use]
    pub fn edrandy() -> Self {
        Self::from_table("edrandy", EDRANDY)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a read offset. `None` means the chip does not drive the bus.
    #[must_use]
    pub fn lookup(&self, offset: u16) -> Option<Source> {
        self.entries.get(&(offset & !1)).copied()
    }

    /// Every mapped offset, in ascending order.
    #[must_use]
    pub fn offsets(&self) -> Vec<u16> {
        let mut offsets: Vec<u16> = self.entries.keys().copied().collect();
        offsets.sort_unstable();
        offsets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use Source::{Coins, DipSwitches, Loopback, Players, SpinUntilInterrupt};

const CNINJA: &[(u16, Source)] = &[
    (0x080, Loopback(0x00)), // master level control
    (0x0DE, Loopback(0x01)), // restart position
    (0x0E6, Loopback(0x02)), // credits in the system
    (0x086, Loopback(0x03)), // end of game check
    // Video registers, copied to the control blocks in the interrupt.
    (0x05A, Loopback(0x08)), // -> 0x140000
    (0x084, Loopback(0x09)), // -> 0x14000A
    (0x020, Loopback(0x0A)), // -> 0x14000C
    (0x072, Loopback(0x0B)), // -> 0x14000E
    (0x0DC, Loopback(0x0C)), // -> 0x150000
    (0x06E, Loopback(0x0D)), // -> 0x15000A, unused by the bootleg
    (0x06C, Loopback(0x0E)), // -> 0x15000C
    (0x008, Loopback(0x0F)), // -> 0x15000E
    (0x036, DipSwitches),
    (0x1C8, Coins),
    (0x22C, Players),
];

const EDRANDY: &[(u16, Source)] = &[
    // Video registers, copied to the control blocks in the interrupt.
    (0x32A, Loopback(0x40)), // -> 0x140006
    (0x380, Loopback(0x42)), // -> 0x140008
    (0x63A, Loopback(0x44)), // -> 0x150002
    (0x42A, Loopback(0x46)), // -> 0x150004
    (0x030, Loopback(0x48)), // -> 0x150006
    (0x6B2, Loopback(0x4A)), // -> 0x150008
    // DMA enable: bit 7 set, then bit 5.
    (0x6C4, Loopback(0x16)),
    (0x33E, Loopback(0x16)),
    // memcpy selectors, the transfer runs in the interrupt.
    (0x32E, Loopback(0x04)), // source msb
    (0x6D8, Loopback(0x05)), // source lsb
    (0x010, Loopback(0x06)), // destination msb
    (0x07A, Loopback(0x07)), // destination lsb
    (0x37C, Loopback(0x08)),
    (0x250, Loopback(0x09)),
    (0x04E, Loopback(0x0A)),
    (0x5BA, Loopback(0x0B)),
    (0x5F4, Loopback(0x0C)), // length
    (0x38C, Loopback(0x0D)),
    (0x02C, Loopback(0x0E)),
    (0x1E6, Loopback(0x0F)),
    (0x3E4, Loopback(0x10)),
    (0x174, Loopback(0x11)), // length
    // Inputs are read in the interrupt and written back through the chip.
    (0x050, Players),
    (0x6F8, Loopback(0x4F)),
    (0x7D6, Loopback(0x3B)),
    (0x6BC, Loopback(0x2C)),
    (0x5D0, DipSwitches),
    (0x0C2, Coins),
    (0x2A6, SpinUntilInterrupt),
];

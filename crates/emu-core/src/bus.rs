//! 68000 word bus with byte lane masks.
//!
//! The 68000 drives a 16-bit data bus. Byte writes only strobe one lane
//! (UDS or LDS), so every write carries a mask telling the device which
//! half of the word is being replaced. Devices merge the masked bits into
//! their stored word with [`combine_word`].

/// Both byte lanes (word access).
pub const MASK_WORD: u16 = 0xFFFF;
/// Upper data strobe only (even byte address).
pub const MASK_HIGH_BYTE: u16 = 0xFF00;
/// Lower data strobe only (odd byte address).
pub const MASK_LOW_BYTE: u16 = 0x00FF;

/// Merge `data` into `old`, replacing only the bits selected by `mask`.
#[inline]
#[must_use]
pub const fn combine_word(old: u16, data: u16, mask: u16) -> u16 {
    (old & !mask) | (data & mask)
}

/// Result of a bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusResult {
    /// Data read from the bus. For writes, this is 0.
    pub data: u16,
    /// The device asked the scheduler to stop the CPU until its next
    /// interrupt. The data value is meaningless when this is set.
    pub spin_until_interrupt: bool,
}

impl BusResult {
    /// A plain read result.
    #[must_use]
    pub const fn new(data: u16) -> Self {
        Self {
            data,
            spin_until_interrupt: false,
        }
    }

    /// A write result (no data returned).
    #[must_use]
    pub const fn write_ok() -> Self {
        Self::new(0)
    }

    /// A read that suspends the CPU until the next interrupt.
    #[must_use]
    pub const fn spin() -> Self {
        Self {
            data: 0,
            spin_until_interrupt: true,
        }
    }
}

/// Bus seen by a 68000-family host CPU.
///
/// Addresses are byte addresses; word accesses are even. The CPU core is
/// not part of this workspace, so this is the whole contract between it
/// and the emulated board.
pub trait WordBus {
    /// Read a word from the bus.
    fn read_word(&mut self, addr: u32) -> BusResult;

    /// Write the bits of `value` selected by `mask`.
    fn write_word(&mut self, addr: u32, value: u16, mask: u16) -> BusResult;

    /// Read a byte; even addresses use the high lane.
    fn read_byte(&mut self, addr: u32) -> BusResult {
        let word = self.read_word(addr & !1);
        let data = if addr & 1 == 0 {
            word.data >> 8
        } else {
            word.data & 0x00FF
        };
        BusResult { data, ..word }
    }

    /// Write a byte on the lane selected by the address.
    fn write_byte(&mut self, addr: u32, value: u8) -> BusResult {
        let value = u16::from(value);
        if addr & 1 == 0 {
            self.write_word(addr & !1, value << 8, MASK_HIGH_BYTE)
        } else {
            self.write_word(addr & !1, value, MASK_LOW_BYTE)
        }
    }
}

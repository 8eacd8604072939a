//! Data East protection loopback device.
//!
//! Caveman Ninja and Edward Randy talk to a custom protection chip through
//! two memory windows. Writes land linearly in a 256-word register file.
//! Reads come back from the same file, but at per-game addresses that the
//! firmware was written against, so the read side is a fixed lookup table.
//! Some read addresses mirror the input ports instead of the file.

mod map;

pub use map::{AddressMap, Source};

use emu_core::{BusResult, Observable, Value, combine_word, parse_index};

/// Number of 16-bit registers in the loopback file.
pub const LOOPBACK_WORDS: usize = 0x100;

/// 256 × 16-bit registers written by the CPU and read back remapped.
pub struct LoopbackRegisterFile {
    words: [u16; LOOPBACK_WORDS],
}

impl LoopbackRegisterFile {
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: [0; LOOPBACK_WORDS],
        }
    }

    pub fn reset(&mut self) {
        self.words = [0; LOOPBACK_WORDS];
    }

    /// Combine-write into register `index`. Only bits in `mask` change.
    pub fn write(&mut self, index: usize, data: u16, mask: u16) {
        let slot = &mut self.words[index % LOOPBACK_WORDS];
        *slot = combine_word(*slot, data, mask);
    }

    #[must_use]
    pub fn word(&self, index: usize) -> u16 {
        self.words[index % LOOPBACK_WORDS]
    }
}

impl Default for LoopbackRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Input pins the chip mirrors into its read window (active low on the
/// real board, passed through unchanged here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPorts {
    pub player1: u8,
    pub player2: u8,
    pub coins: u8,
    pub dsw1: u8,
    pub dsw2: u8,
}

impl Default for InputPorts {
    fn default() -> Self {
        Self {
            player1: 0xFF,
            player2: 0xFF,
            coins: 0xFF,
            dsw1: 0xFF,
            dsw2: 0xFF,
        }
    }
}

/// The protection chip: register file plus the game's read table.
pub struct ProtectionDevice {
    registers: LoopbackRegisterFile,
    map: AddressMap,
    unmapped_reads: u64,
}

impl ProtectionDevice {
    #[must_use]
    pub fn new(map: AddressMap) -> Self {
        Self {
            registers: LoopbackRegisterFile::new(),
            map,
            unmapped_reads: 0,
        }
    }

    pub fn reset(&mut self) {
        self.registers.reset();
        self.unmapped_reads = 0;
    }

    /// Write to the linear write window. `offset` is a byte offset.
    pub fn write(&mut self, offset: u32, data: u16, mask: u16) {
        self.registers.write((offset / 2) as usize, data, mask);
    }

    /// Read from the remapped read window. `offset` is a byte offset.
    ///
    /// Offsets the game never uses read as 0.
    pub fn read(&mut self, offset: u32, inputs: &InputPorts) -> BusResult {
        let Some(source) = u16::try_from(offset).ok().and_then(|o| self.map.lookup(o)) else {
            self.unmapped_reads += 1;
            if cfg!(debug_assertions) {
                log::warn!(
                    "{} protection: read unmapped offset {offset:#05X}",
                    self.map.name()
                );
            }
            return BusResult::new(0);
        };
        match source {
            Source::Loopback(index) => BusResult::new(self.registers.word(usize::from(index))),
            Source::Players => {
                BusResult::new(u16::from(inputs.player1) | (u16::from(inputs.player2) << 8))
            }
            Source::Coins => BusResult::new(u16::from(inputs.coins)),
            Source::DipSwitches => {
                BusResult::new(u16::from(inputs.dsw1) | (u16::from(inputs.dsw2) << 8))
            }
            Source::SpinUntilInterrupt => BusResult::spin(),
        }
    }

    #[must_use]
    pub fn registers(&self) -> &LoopbackRegisterFile {
        &self.registers
    }

    #[must_use]
    pub fn map(&self) -> &AddressMap {
        &self.map
    }

    /// Reads that missed the table since reset.
    #[must_use]
    pub fn unmapped_reads(&self) -> u64 {
        self.unmapped_reads
    }
}

impl Observable for ProtectionDevice {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(index) = path.strip_prefix("reg.") {
            let index = parse_index(index)?;
            return (index < LOOPBACK_WORDS).then(|| self.registers.word(index).into());
        }
        match path {
            "table" => Some(self.map.name().into()),
            "unmapped_reads" => Some(self.unmapped_reads.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["reg.<index>", "table", "unmapped_reads"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::{MASK_HIGH_BYTE, MASK_LOW_BYTE, MASK_WORD};

    fn inputs() -> InputPorts {
        InputPorts {
            player1: 0x12,
            player2: 0x34,
            coins: 0xF7,
            dsw1: 0x56,
            dsw2: 0x78,
        }
    }

    #[test]
    fn repeated_write_is_idempotent() {
        let masks = [MASK_WORD, MASK_HIGH_BYTE, MASK_LOW_BYTE];
        for index in [0, 0x2C, 0xFF] {
            for mask in masks {
                let mut once = LoopbackRegisterFile::new();
                once.write(index, 0xBEEF, MASK_WORD);
                let mut twice = LoopbackRegisterFile::new();
                twice.write(index, 0xBEEF, MASK_WORD);

                once.write(index, 0x1234, mask);
                twice.write(index, 0x1234, mask);
                twice.write(index, 0x1234, mask);
                assert_eq!(once.word(index), twice.word(index));
            }
        }
    }

    #[test]
    fn low_byte_write_keeps_high_byte() {
        let mut regs = LoopbackRegisterFile::new();
        for index in 0..LOOPBACK_WORDS {
            regs.write(index, 0xA500 | index as u16, MASK_WORD);
            regs.write(index, 0x5A3C, MASK_LOW_BYTE);
            assert_eq!(regs.word(index) >> 8, 0xA5);
            assert_eq!(regs.word(index) & 0xFF, 0x3C);
        }
    }

    #[test]
    fn reset_clears_registers() {
        let mut prot = ProtectionDevice::new(AddressMap::cninja());
        prot.write(0, 0xFFFF, MASK_WORD);
        prot.reset();
        assert_eq!(prot.registers().word(0), 0);
    }

    #[test]
    fn cninja_reads_are_remapped() {
        let mut prot = ProtectionDevice::new(AddressMap::cninja());
        // Write window is linear: byte offset 0x10 is register 8.
        prot.write(0x00, 0x0003, MASK_WORD);
        prot.write(0x10, 0x8040, MASK_WORD);
        assert_eq!(prot.read(0x080, &inputs()).data, 0x0003);
        assert_eq!(prot.read(0x05A, &inputs()).data, 0x8040);
        // The write offset itself is not a read address.
        assert_eq!(prot.read(0x010, &inputs()).data, 0);
    }

    #[test]
    fn input_mirrors() {
        let mut prot = ProtectionDevice::new(AddressMap::cninja());
        assert_eq!(prot.read(0x22C, &inputs()).data, 0x3412);
        assert_eq!(prot.read(0x036, &inputs()).data, 0x7856);
        assert_eq!(prot.read(0x1C8, &inputs()).data, 0x00F7);

        let mut prot = ProtectionDevice::new(AddressMap::edrandy());
        assert_eq!(prot.read(0x050, &inputs()).data, 0x3412);
        assert_eq!(prot.read(0x5D0, &inputs()).data, 0x7856);
        assert_eq!(prot.read(0x0C2, &inputs()).data, 0x00F7);
    }

    #[test]
    fn every_unmapped_offset_reads_zero() {
        for map in [AddressMap::cninja(), AddressMap::edrandy()] {
            let mapped = map.offsets();
            let mut prot = ProtectionDevice::new(map);
            for index in 0..LOOPBACK_WORDS {
                prot.write((index * 2) as u32, 0xFFFF, MASK_WORD);
            }
            let mut misses = 0;
            for offset in (0..0x1000u32).step_by(2) {
                if mapped.contains(&(offset as u16)) {
                    continue;
                }
                let result = prot.read(offset, &inputs());
                assert_eq!(result, BusResult::new(0), "offset {offset:#X}");
                misses += 1;
            }
            assert_eq!(prot.unmapped_reads(), misses);
        }
    }

    #[test]
    fn edrandy_spin_read_requests_yield() {
        let mut prot = ProtectionDevice::new(AddressMap::edrandy());
        let result = prot.read(0x2A6, &inputs());
        assert!(result.spin_until_interrupt);
        assert!(!prot.read(0x32A, &inputs()).spin_until_interrupt);
    }

    #[test]
    fn edrandy_shares_registers_across_aliases() {
        let mut prot = ProtectionDevice::new(AddressMap::edrandy());
        prot.write(0x2C, 0x00A0, MASK_WORD);
        assert_eq!(prot.read(0x6C4, &inputs()).data, 0x00A0);
        assert_eq!(prot.read(0x33E, &inputs()).data, 0x00A0);
    }

    #[test]
    fn observable_registers() {
        let mut prot = ProtectionDevice::new(AddressMap::edrandy());
        prot.write(0x9E, 0x1234, MASK_WORD);
        assert_eq!(prot.query("reg.0x4F"), Some(Value::U16(0x1234)));
        assert_eq!(prot.query("table"), Some(Value::from("edrandy")));
        assert_eq!(prot.query("reg.0x100"), None);
    }
}

//! Game variants and board presets.
//!
//! The three games share the video block at $140000-$15FFFF. Everything
//! else moves: ROM size, RAM, palette, protection window, sprite RAM and
//! the sprite DMA flag.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use deco_loopback::AddressMap;
use deco_video::{GfxSet, VideoConfig};

use crate::error::MachineError;
use crate::sound::SoundIrq;

/// Supported games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameVariant {
    /// Caveman Ninja.
    Cninja,
    /// Stone Age, a Caveman Ninja bootleg with a Z80 sound board.
    Stoneage,
    /// Edward Randy.
    Edrandy,
}

impl GameVariant {
    pub const ALL: [Self; 3] = [Self::Cninja, Self::Stoneage, Self::Edrandy];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cninja => "cninja",
            Self::Stoneage => "stoneage",
            Self::Edrandy => "edrandy",
        }
    }

    /// Board preset for this game.
    #[must_use]
    pub fn config(self) -> GameVariantConfig {
        match self {
            Self::Cninja => GameVariantConfig {
                variant: self,
                memory_map: MemoryMap::cninja(),
                protection: AddressMap::cninja(),
                sprite_mask: 0x3FFF,
                bootleg_scroll_offsets: false,
                sound_irq: SoundIrq::Irq1,
                patch_self_test: false,
            },
            Self::Stoneage => GameVariantConfig {
                variant: self,
                memory_map: MemoryMap {
                    ignored_writes: Some(0x30_8000..0x30_9000),
                    ..MemoryMap::cninja()
                },
                protection: AddressMap::cninja(),
                sprite_mask: 0x3FFF,
                bootleg_scroll_offsets: true,
                sound_irq: SoundIrq::Nmi,
                patch_self_test: true,
            },
            Self::Edrandy => GameVariantConfig {
                variant: self,
                memory_map: MemoryMap::edrandy(),
                protection: AddressMap::edrandy(),
                sprite_mask: 0x7FFF,
                bootleg_scroll_offsets: false,
                sound_irq: SoundIrq::Irq1,
                patch_self_test: false,
            },
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameVariant {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MachineError::UnknownVariant(s.to_string()))
    }
}

/// Address ranges that differ between boards. Ranges are byte addresses,
/// end exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap {
    pub rom: Range<u32>,
    pub work_ram: Range<u32>,
    /// Interrupt acknowledge: reads 0, writes ignored.
    pub irq_ack: Range<u32>,
    pub palette: Range<u32>,
    pub sprites: Range<u32>,
    pub sprite_dma: Range<u32>,
    pub protection_write: Range<u32>,
    pub protection_read: Range<u32>,
    pub sound_latch: u32,
    /// Writes the board decodes but discards.
    pub ignored_writes: Option<Range<u32>>,
}

impl MemoryMap {
    #[must_use]
    pub fn cninja() -> Self {
        Self {
            rom: 0x00_0000..0x0C_0000,
            work_ram: 0x18_4000..0x18_8000,
            irq_ack: 0x19_0000..0x19_0008,
            palette: 0x19_C000..0x19_E000,
            sprites: 0x1A_4000..0x1A_4800,
            sprite_dma: 0x1B_4000..0x1B_4002,
            protection_write: 0x1B_C000..0x1B_C200,
            protection_read: 0x1B_C000..0x1B_D000,
            sound_latch: 0x1B_C0A8,
            ignored_writes: None,
        }
    }

    #[must_use]
    pub fn edrandy() -> Self {
        Self {
            rom: 0x00_0000..0x10_0000,
            work_ram: 0x19_4000..0x19_8000,
            irq_ack: 0x1A_0000..0x1A_0008,
            palette: 0x18_8000..0x18_A000,
            sprites: 0x1B_C000..0x1B_C800,
            sprite_dma: 0x1A_4000..0x1A_4002,
            protection_write: 0x19_8000..0x19_8200,
            protection_read: 0x19_8000..0x19_8800,
            sound_latch: 0x19_80A8,
            ignored_writes: None,
        }
    }

    /// Bytes of program ROM the board decodes.
    #[must_use]
    pub fn rom_size(&self) -> usize {
        (self.rom.end - self.rom.start) as usize
    }
}

/// Everything that differs between the supported games, selected once.
#[derive(Debug, Clone)]
pub struct GameVariantConfig {
    pub variant: GameVariant,
    pub memory_map: MemoryMap,
    /// Read table of the protection chip.
    pub protection: AddressMap,
    /// Mask applied to sprite codes.
    pub sprite_mask: u16,
    /// The bootleg's scroll latches add fixed offsets.
    pub bootleg_scroll_offsets: bool,
    pub sound_irq: SoundIrq,
    /// NOP out the protection checks left in the program ROM.
    pub patch_self_test: bool,
}

impl GameVariantConfig {
    #[must_use]
    pub fn video(&self) -> VideoConfig {
        VideoConfig {
            sprite_mask: self.sprite_mask,
            bootleg_scroll_offsets: self.bootleg_scroll_offsets,
        }
    }
}

/// Machine configuration.
pub struct CninjaConfig {
    pub variant: GameVariant,
    /// Program ROM, big-endian 68000 words.
    pub program_rom: Vec<u8>,
    /// Decoded character, tile and sprite graphics for the built-in renderer.
    pub gfx: GfxSet,
}

impl CninjaConfig {
    /// A configuration with no graphics ROMs.
    #[must_use]
    pub fn new(variant: GameVariant, program_rom: Vec<u8>) -> Self {
        Self {
            variant,
            program_rom,
            gfx: GfxSet::empty(),
        }
    }
}

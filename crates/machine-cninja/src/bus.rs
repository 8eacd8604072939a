//! Main CPU bus.
//!
//! Video block, common to every board (byte addresses):
//! - $140000-$14000F: control_1 (pf1/pf4 scroll, flip)
//! - $144000-$144FFF: pf1 tiles, $146000-$146FFF: pf4 tiles
//! - $14C000-$14C7FF: pf1 rowscroll, $14E000-$14E7FF: pf4 rowscroll
//! - $150000-$15000F: control_0 (pf2/pf3 scroll, gfx banks)
//! - $154000-$154FFF: pf3 tiles, $156000-$156FFF: pf2 tiles
//! - $15C000-$15C7FF: pf3 rowscroll, $15E000-$15E7FF: pf2 rowscroll
//!
//! The rest comes from the variant's [`MemoryMap`].

use std::ops::Range;

use deco_loopback::{InputPorts, ProtectionDevice};
use deco_video::{ControlId, Layer, VideoCompositor};
use emu_core::{BusResult, WordBus, combine_word};

use crate::config::{GameVariantConfig, MemoryMap};
use crate::palette::PaletteRam;
use crate::sound::SoundLatch;

const OPEN_BUS: u16 = 0xFFFF;

const CONTROL_BLOCKS: [(ControlId, Range<u32>); 2] = [
    (ControlId::Control1, 0x14_0000..0x14_0010),
    (ControlId::Control0, 0x15_0000..0x15_0010),
];

const TILE_WINDOWS: [(Layer, Range<u32>); 4] = [
    (Layer::Pf1, 0x14_4000..0x14_5000),
    (Layer::Pf4, 0x14_6000..0x14_7000),
    (Layer::Pf3, 0x15_4000..0x15_5000),
    (Layer::Pf2, 0x15_6000..0x15_7000),
];

const ROWSCROLL_WINDOWS: [(Layer, Range<u32>); 4] = [
    (Layer::Pf1, 0x14_C000..0x14_C800),
    (Layer::Pf4, 0x14_E000..0x14_E800),
    (Layer::Pf3, 0x15_C000..0x15_C800),
    (Layer::Pf2, 0x15_E000..0x15_E800),
];

/// A decoded bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Rom(u32),
    Control(ControlId, u32),
    Tiles(Layer, u32),
    Rowscroll(Layer, u32),
    WorkRam(u32),
    IrqAck,
    Palette(u32),
    Sprites(u32),
    SpriteDma,
    /// Offset into the protection read window.
    Protection(u32),
    Ignored,
    Unmapped,
}

fn offset_in(range: &Range<u32>, addr: u32) -> Option<u32> {
    range.contains(&addr).then(|| addr - range.start)
}

/// Everything the main 68000 can reach.
pub struct CninjaBus {
    map: MemoryMap,
    rom: Box<[u8]>,
    work_ram: Box<[u16]>,
    pub protection: ProtectionDevice,
    pub video: VideoCompositor,
    pub palette: PaletteRam,
    pub sound: SoundLatch,
    pub inputs: InputPorts,
    /// Set when a read asked the CPU to wait for the next interrupt.
    cpu_suspended: bool,
}

impl CninjaBus {
    /// Build the bus for a variant. `rom` must cover the variant's ROM window.
    #[must_use]
    pub fn new(config: &GameVariantConfig, rom: Vec<u8>) -> Self {
        let map = config.memory_map.clone();
        let ram_words = (map.work_ram.end - map.work_ram.start) as usize / 2;
        Self {
            protection: ProtectionDevice::new(config.protection.clone()),
            video: VideoCompositor::new(config.video()),
            palette: PaletteRam::new(),
            sound: SoundLatch::new(config.sound_irq),
            inputs: InputPorts::default(),
            work_ram: vec![0; ram_words].into_boxed_slice(),
            rom: rom.into_boxed_slice(),
            map,
            cpu_suspended: false,
        }
    }

    #[must_use]
    pub fn memory_map(&self) -> &MemoryMap {
        &self.map
    }

    #[must_use]
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    #[must_use]
    pub fn is_cpu_suspended(&self) -> bool {
        self.cpu_suspended
    }

    /// Wake a CPU stopped by a spin read. Called on interrupt delivery.
    pub fn release_cpu(&mut self) {
        self.cpu_suspended = false;
    }

    /// Read a work RAM word without side effects.
    #[must_use]
    pub fn peek_ram(&self, offset: u32) -> u16 {
        self.work_ram[(offset as usize >> 1) % self.work_ram.len()]
    }

    fn decode(&self, addr: u32) -> Region {
        for (id, range) in &CONTROL_BLOCKS {
            if let Some(offset) = offset_in(range, addr) {
                return Region::Control(*id, offset);
            }
        }
        for (layer, range) in &TILE_WINDOWS {
            if let Some(offset) = offset_in(range, addr) {
                return Region::Tiles(*layer, offset);
            }
        }
        for (layer, range) in &ROWSCROLL_WINDOWS {
            if let Some(offset) = offset_in(range, addr) {
                return Region::Rowscroll(*layer, offset);
            }
        }

        let map = &self.map;
        if let Some(offset) = offset_in(&map.rom, addr) {
            Region::Rom(offset)
        } else if let Some(offset) = offset_in(&map.work_ram, addr) {
            Region::WorkRam(offset)
        } else if map.irq_ack.contains(&addr) {
            Region::IrqAck
        } else if let Some(offset) = offset_in(&map.palette, addr) {
            Region::Palette(offset)
        } else if let Some(offset) = offset_in(&map.sprites, addr) {
            Region::Sprites(offset)
        } else if map.sprite_dma.contains(&addr) {
            Region::SpriteDma
        } else if let Some(offset) = offset_in(&map.protection_read, addr) {
            Region::Protection(offset)
        } else if map.ignored_writes.as_ref().is_some_and(|r| r.contains(&addr)) {
            Region::Ignored
        } else {
            Region::Unmapped
        }
    }

    fn write_protection(&mut self, addr: u32, offset: u32, data: u16, mask: u16) {
        if !self.map.protection_write.contains(&addr) {
            log::trace!("write {data:#06X} past protection window at {addr:#08X}");
            return;
        }
        if addr == self.map.sound_latch {
            self.sound.write(data as u8);
            return;
        }
        self.protection.write(offset, data, mask);
    }
}

impl WordBus for CninjaBus {
    fn read_word(&mut self, addr: u32) -> BusResult {
        let addr = addr & 0x00FF_FFFE;
        match self.decode(addr) {
            Region::Rom(offset) => {
                let offset = offset as usize;
                match self.rom.get(offset..offset + 2) {
                    Some(&[hi, lo]) => BusResult::new(u16::from_be_bytes([hi, lo])),
                    _ => BusResult::new(OPEN_BUS),
                }
            }
            Region::Tiles(layer, offset) => BusResult::new(self.video.read_tiles(layer, offset)),
            Region::Rowscroll(layer, offset) => {
                BusResult::new(self.video.read_rowscroll(layer, offset))
            }
            Region::WorkRam(offset) => BusResult::new(self.peek_ram(offset)),
            Region::IrqAck => BusResult::new(0),
            Region::Palette(offset) => BusResult::new(self.palette.read(offset)),
            Region::Sprites(offset) => BusResult::new(self.video.read_sprites(offset)),
            Region::Protection(offset) => {
                let result = self.protection.read(offset, &self.inputs);
                if result.spin_until_interrupt {
                    log::trace!("cpu suspended by protection read at {addr:#08X}");
                    self.cpu_suspended = true;
                }
                result
            }
            Region::Control(..) | Region::SpriteDma | Region::Ignored | Region::Unmapped => {
                log::trace!("open bus read at {addr:#08X}");
                BusResult::new(OPEN_BUS)
            }
        }
    }

    fn write_word(&mut self, addr: u32, value: u16, mask: u16) -> BusResult {
        let addr = addr & 0x00FF_FFFE;
        match self.decode(addr) {
            Region::Control(id, offset) => self.video.write_control(id, offset, value, mask),
            Region::Tiles(layer, offset) => self.video.write_tiles(layer, offset, value, mask),
            Region::Rowscroll(layer, offset) => {
                self.video.write_rowscroll(layer, offset, value, mask);
            }
            Region::WorkRam(offset) => {
                let index = offset as usize >> 1;
                self.work_ram[index] = combine_word(self.work_ram[index], value, mask);
            }
            Region::Palette(offset) => self.palette.write(offset, value, mask),
            Region::Sprites(offset) => self.video.write_sprites(offset, value, mask),
            Region::SpriteDma => self.video.buffer_sprites(),
            Region::Protection(offset) => self.write_protection(addr, offset, value, mask),
            Region::IrqAck | Region::Ignored => {}
            Region::Rom(_) | Region::Unmapped => {
                log::trace!("dropped write {value:#06X} at {addr:#08X}");
            }
        }
        BusResult::write_ok()
    }
}

//! Top-level board.
//!
//! A 24 MHz crystal drives the 68000 at 12 MHz. The board runs at 58
//! frames per second; at vblank the video block composes the frame and
//! the 68000 takes a level 5 interrupt.
//!
//! CPU instruction execution lives outside this crate. The host CPU drives
//! [`CninjaBus`] through [`emu_core::WordBus`], checks
//! [`Cninja::is_cpu_suspended`] after each access, and calls
//! [`Cninja::vblank`] once per frame.

use deco_loopback::InputPorts;
use deco_video::{Renderer, SCREEN_HEIGHT, SCREEN_WIDTH, SoftRenderer};
use emu_core::{MasterClock, Observable, Ticks, Value, parse_index};

use crate::bus::CninjaBus;
use crate::config::{CninjaConfig, GameVariant, GameVariantConfig};
use crate::error::MachineError;
use crate::patch::patch_self_test_compares;
use crate::sound::SoundIrq;

pub const MASTER_CLOCK: MasterClock = MasterClock::new(24_000_000);
/// 68000 clock = crystal / 2.
pub const CPU_DIVIDER: u64 = 2;
pub const FRAMES_PER_SECOND: u64 = 58;
/// Interrupt level raised at vblank.
pub const VBLANK_IRQ_LEVEL: u8 = 5;

pub struct Cninja {
    config: GameVariantConfig,
    bus: CninjaBus,
    renderer: SoftRenderer,
    /// ARGB32, 256×256.
    framebuffer: Vec<u32>,
    main_irq: Option<u8>,
    frame_count: u64,
    patched_checks: usize,
}

impl Cninja {
    /// Build a board from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::RomTooSmall`] if the program ROM does not
    /// cover the variant's ROM window.
    pub fn new(config: CninjaConfig) -> Result<Self, MachineError> {
        let CninjaConfig {
            variant,
            mut program_rom,
            gfx,
        } = config;
        let board = variant.config();

        let expected = board.memory_map.rom_size();
        if program_rom.len() < expected {
            return Err(MachineError::RomTooSmall {
                variant,
                expected,
                actual: program_rom.len(),
            });
        }

        let patched_checks = if board.patch_self_test {
            patch_self_test_compares(&mut program_rom)
        } else {
            0
        };

        log::debug!(
            "{variant}: {:#X} byte program ROM, protection table {}",
            program_rom.len(),
            board.protection.name()
        );

        Ok(Self {
            bus: CninjaBus::new(&board, program_rom),
            config: board,
            renderer: SoftRenderer::new(gfx),
            framebuffer: vec![0xFF00_0000; SCREEN_WIDTH * SCREEN_HEIGHT],
            main_irq: None,
            frame_count: 0,
            patched_checks,
        })
    }

    #[must_use]
    pub fn variant(&self) -> GameVariant {
        self.config.variant
    }

    #[must_use]
    pub fn config(&self) -> &GameVariantConfig {
        &self.config
    }

    #[must_use]
    pub fn bus(&self) -> &CninjaBus {
        &self.bus
    }

    /// The main CPU's view of the board.
    pub fn bus_mut(&mut self) -> &mut CninjaBus {
        &mut self.bus
    }

    pub fn set_inputs(&mut self, inputs: InputPorts) {
        self.bus.inputs = inputs;
    }

    /// 68000 cycles between two vblanks.
    #[must_use]
    pub fn cpu_cycles_per_frame(&self) -> Ticks {
        MASTER_CLOCK.cpu_cycles_per_frame(CPU_DIVIDER, FRAMES_PER_SECOND)
    }

    /// Compose the frame with the built-in renderer and raise vblank.
    pub fn vblank(&mut self) {
        self.bus.video.render(&mut self.renderer);
        let bitmap = self.renderer.bitmap();
        for (pixel, &pen) in self.framebuffer.iter_mut().zip(bitmap.pens()) {
            *pixel = self.bus.palette.argb(pen);
        }
        self.end_frame();
    }

    /// Compose the frame through another backend and raise vblank. The
    /// built-in framebuffer is left untouched.
    pub fn vblank_with<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        self.bus.video.render(renderer);
        self.end_frame();
    }

    fn end_frame(&mut self) {
        self.main_irq = Some(VBLANK_IRQ_LEVEL);
        if self.bus.is_cpu_suspended() {
            log::trace!("vblank releases suspended cpu");
        }
        self.bus.release_cpu();
        self.frame_count += 1;
    }

    /// Reference to the framebuffer (ARGB32, 256×256).
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        SCREEN_WIDTH as u32
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        SCREEN_HEIGHT as u32
    }

    #[must_use]
    pub fn renderer(&self) -> &SoftRenderer {
        &self.renderer
    }

    /// Pending main CPU interrupt level, cleared on read.
    pub fn take_main_irq(&mut self) -> Option<u8> {
        self.main_irq.take()
    }

    /// A protection read stopped the CPU until the next interrupt.
    #[must_use]
    pub fn is_cpu_suspended(&self) -> bool {
        self.bus.is_cpu_suspended()
    }

    /// Interrupt for the audio CPU raised by a sound latch write.
    pub fn take_sound_interrupt(&mut self) -> Option<SoundIrq> {
        self.bus.sound.take_interrupt()
    }

    #[must_use]
    pub fn sound_latch(&self) -> u8 {
        self.bus.sound.value()
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Self-test sequences removed from the program ROM at construction.
    #[must_use]
    pub fn patched_checks(&self) -> usize {
        self.patched_checks
    }
}

impl Observable for Cninja {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("protection.") {
            self.bus.protection.query(rest)
        } else if let Some(rest) = path.strip_prefix("video.") {
            self.bus.video.query(rest)
        } else if let Some(rest) = path.strip_prefix("palette.") {
            let index = u16::try_from(parse_index(rest)?).ok()?;
            Some(self.bus.palette.argb(index).into())
        } else if let Some(rest) = path.strip_prefix("ram.") {
            let offset = u32::try_from(parse_index(rest)?).ok()?;
            Some(self.bus.peek_ram(offset).into())
        } else {
            match path {
                "variant" => Some(self.variant().name().into()),
                "frame_count" => Some(self.frame_count.into()),
                "cpu_suspended" => Some(self.is_cpu_suspended().into()),
                "irq_pending" => Some(self.main_irq.is_some().into()),
                "sound_latch" => Some(self.sound_latch().into()),
                "sound_pending" => Some(self.bus.sound.is_pending().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "protection.<device_paths>",
            "video.<compositor_paths>",
            "palette.<index>",
            "ram.<offset>",
            "variant",
            "frame_count",
            "cpu_suspended",
            "irq_pending",
            "sound_latch",
            "sound_pending",
        ]
    }
}

//! Data East Caveman Ninja / Edward Randy board.
//!
//! Glues the protection loopback chip and the video compositor to a 68000
//! word bus, with palette RAM, the sound latch and vblank interrupt
//! signalling. Three games run on it:
//!
//! - `cninja`: Caveman Ninja (68000 + HuC6280 sound)
//! - `stoneage`: Stone Age, a bootleg with a Z80 sound board
//! - `edrandy`: Edward Randy (larger ROM, moved RAM and protection windows)

mod bus;
mod cninja;
mod config;
mod error;
mod palette;
mod patch;
mod sound;

pub use bus::CninjaBus;
pub use cninja::{CPU_DIVIDER, Cninja, FRAMES_PER_SECOND, MASTER_CLOCK, VBLANK_IRQ_LEVEL};
pub use config::{CninjaConfig, GameVariant, GameVariantConfig, MemoryMap};
pub use error::MachineError;
pub use palette::{PALETTE_ENTRIES, PaletteRam};
pub use patch::patch_self_test_compares;
pub use sound::{SoundIrq, SoundLatch};

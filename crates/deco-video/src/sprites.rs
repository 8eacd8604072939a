//! Buffered sprite RAM and the sprite draw list.
//!
//! Each entry is four words:
//!
//! ```text
//! 0: -FYF hhyy yyyy yyyy   flip-y, flip-x, flash, height, y
//! 1: cccc cccc cccc cccc   sprite code
//! 2: -Ppp pppx xxxx xxxx   priority, colour, x
//! 3: unused
//! ```
//!
//! The CPU fills the live copy; a write to the DMA flag copies it into the
//! buffered copy, which is the only one the compositor reads.

use emu_core::combine_word;

/// Words of sprite RAM (0x800 bytes).
pub const SPRITE_RAM_WORDS: usize = 0x400;
/// Entries in the sprite table.
pub const SPRITE_COUNT: usize = SPRITE_RAM_WORDS / 4;
/// Sprite colours.
pub const SPRITE_COLORS: usize = 32;
/// First palette entry of sprite colour 0.
pub const SPRITE_PALETTE_BASE: u16 = 0x300;

/// Which side of pf4's front half a sprite is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpritePriority {
    /// Priority bit clear: drawn before pf4's front half.
    BelowPf4Front,
    /// Priority bit set: drawn above every playfield except pf1.
    AbovePf4Front,
}

/// One raw sprite table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpriteEntry {
    pub attr: u16,
    pub code: u16,
    pub pos: u16,
}

impl SpriteEntry {
    #[must_use]
    pub const fn flip_y(self) -> bool {
        self.attr & 0x4000 != 0
    }

    #[must_use]
    pub const fn flip_x(self) -> bool {
        self.attr & 0x2000 != 0
    }

    #[must_use]
    pub const fn flash(self) -> bool {
        self.attr & 0x1000 != 0
    }

    /// Extra cells stacked on top of the first: 0, 1, 3 or 7.
    #[must_use]
    pub const fn multi(self) -> i32 {
        (1 << ((self.attr & 0x0600) >> 9)) - 1
    }

    #[must_use]
    pub const fn priority(self) -> SpritePriority {
        if self.pos & 0x4000 != 0 {
            SpritePriority::AbovePf4Front
        } else {
            SpritePriority::BelowPf4Front
        }
    }

    #[must_use]
    pub const fn color(self) -> u8 {
        ((self.pos >> 9) & 0x1F) as u8
    }

    /// Screen X after sign extension and the `240 - x` origin flip.
    #[must_use]
    pub const fn screen_x(self) -> i32 {
        240 - sign_extend_9(self.pos)
    }

    /// Screen Y after sign extension and the `240 - y` origin flip.
    #[must_use]
    pub const fn screen_y(self) -> i32 {
        240 - sign_extend_9(self.attr)
    }

    /// Sprites this far right are never drawn.
    #[must_use]
    pub const fn off_screen(self) -> bool {
        self.screen_x() > 256
    }
}

const fn sign_extend_9(word: u16) -> i32 {
    let value = (word & 0x01FF) as i32;
    if value >= 256 { value - 512 } else { value }
}

/// One 16×16 cell handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteCell {
    pub code: u32,
    pub color: u8,
    pub flip_x: bool,
    pub flip_y: bool,
    pub x: i32,
    pub y: i32,
}

/// Live and buffered sprite tables.
pub struct SpriteRam {
    live: Box<[u16]>,
    buffered: Box<[u16]>,
}

impl SpriteRam {
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: vec![0; SPRITE_RAM_WORDS].into_boxed_slice(),
            buffered: vec![0; SPRITE_RAM_WORDS].into_boxed_slice(),
        }
    }

    pub fn write(&mut self, offset: u32, data: u16, mask: u16) {
        let index = (offset as usize >> 1) % SPRITE_RAM_WORDS;
        self.live[index] = combine_word(self.live[index], data, mask);
    }

    #[must_use]
    pub fn read(&self, offset: u32) -> u16 {
        self.live[(offset as usize >> 1) % SPRITE_RAM_WORDS]
    }

    /// Copy the live table into the buffered one in a single step.
    pub fn buffer(&mut self) {
        self.buffered.copy_from_slice(&self.live);
    }

    /// Entries of the buffered table in index order.
    pub fn entries(&self) -> impl Iterator<Item = SpriteEntry> + '_ {
        self.buffered.chunks_exact(4).map(|words| SpriteEntry {
            attr: words[0],
            code: words[1],
            pos: words[2],
        })
    }
}

impl Default for SpriteRam {
    fn default() -> Self {
        Self::new()
    }
}

/// Cells for one priority group, in table order.
///
/// `frame` is the emulated frame counter; flashing sprites are hidden on
/// odd frames.
#[must_use]
pub fn sprite_cells(
    entries: impl Iterator<Item = SpriteEntry>,
    group: SpritePriority,
    frame: u64,
    flip_screen: bool,
    code_mask: u16,
) -> Vec<SpriteCell> {
    let mut cells = Vec::new();
    for entry in entries {
        let code = entry.code & code_mask;
        if code == 0 || entry.priority() != group {
            continue;
        }
        if entry.flash() && frame & 1 == 1 {
            continue;
        }
        if entry.off_screen() {
            continue;
        }

        let mut x = entry.screen_x();
        let mut y = entry.screen_y();
        let mut flip_x = entry.flip_x();
        let mut flip_y = entry.flip_y();
        let mut multi = entry.multi();

        let mut code = i32::from(code) & !multi;
        let inc = if flip_y {
            -1
        } else {
            code += multi;
            1
        };

        let step = if flip_screen {
            x = 240 - x;
            y = 240 - y;
            flip_x = !flip_x;
            flip_y = !flip_y;
            16
        } else {
            -16
        };

        while multi >= 0 {
            cells.push(SpriteCell {
                code: (code - multi * inc) as u32,
                color: entry.color(),
                flip_x,
                flip_y,
                x,
                y: y + step * multi,
            });
            multi -= 1;
        }
    }
    cells
}

/// Pens used by each sprite colour in the buffered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpritePaletteUsage {
    masks: [u16; SPRITE_COLORS],
}

impl SpritePaletteUsage {
    /// Scan the buffered table. `pen_usage` returns the pen bitmask of a
    /// sprite graphics code.
    pub fn scan(
        entries: impl Iterator<Item = SpriteEntry>,
        code_mask: u16,
        pen_usage: impl Fn(u32) -> u16,
    ) -> Self {
        let mut masks = [0u16; SPRITE_COLORS];
        for entry in entries {
            let code = entry.code & code_mask;
            if code == 0 || entry.off_screen() {
                continue;
            }
            let multi = entry.multi();
            let base = i32::from(code) & !multi;
            for cell in 0..=multi {
                masks[usize::from(entry.color())] |= pen_usage((base + cell) as u32);
            }
        }
        Self { masks }
    }

    #[must_use]
    pub fn pens(&self, color: u8) -> u16 {
        self.masks[usize::from(color) % SPRITE_COLORS]
    }

    #[must_use]
    pub fn is_used(&self, color: u8) -> bool {
        self.pens(color) != 0
    }

    /// Palette entries in use, ascending.
    #[must_use]
    pub fn palette_entries(&self) -> Vec<u16> {
        let mut used = Vec::new();
        for (color, &mask) in self.masks.iter().enumerate() {
            for pen in 0..16u16 {
                if mask & (1 << pen) != 0 {
                    used.push(SPRITE_PALETTE_BASE + color as u16 * 16 + pen);
                }
            }
        }
        used
    }
}

impl Default for SpritePaletteUsage {
    fn default() -> Self {
        Self {
            masks: [0; SPRITE_COLORS],
        }
    }
}

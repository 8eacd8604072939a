//! Palette RAM with 24-bit colour decode.
//!
//! Each of the 2048 entries is two words. The even word carries blue in
//! its low byte; the odd word carries green in the high byte and red in
//! the low byte.

use emu_core::combine_word;

pub const PALETTE_ENTRIES: usize = 2048;
const PALETTE_WORDS: usize = PALETTE_ENTRIES * 2;

pub struct PaletteRam {
    words: Box<[u16]>,
    argb: Box<[u32]>,
}

impl PaletteRam {
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: vec![0; PALETTE_WORDS].into_boxed_slice(),
            argb: vec![0xFF00_0000; PALETTE_ENTRIES].into_boxed_slice(),
        }
    }

    /// Write at a byte offset and recompute the entry it belongs to.
    pub fn write(&mut self, offset: u32, data: u16, mask: u16) {
        let index = (offset as usize >> 1) % PALETTE_WORDS;
        self.words[index] = combine_word(self.words[index], data, mask);
        self.decode(index / 2);
    }

    #[must_use]
    pub fn read(&self, offset: u32) -> u16 {
        self.words[(offset as usize >> 1) % PALETTE_WORDS]
    }

    fn decode(&mut self, entry: usize) {
        let blue = u32::from(self.words[entry * 2] & 0xFF);
        let green_red = self.words[entry * 2 + 1];
        let green = u32::from(green_red >> 8);
        let red = u32::from(green_red & 0xFF);
        self.argb[entry] = 0xFF00_0000 | (red << 16) | (green << 8) | blue;
    }

    /// Colour of `index` as `0xFFRRGGBB`. Indices wrap at 2048.
    #[must_use]
    pub fn argb(&self, index: u16) -> u32 {
        self.argb[usize::from(index) % PALETTE_ENTRIES]
    }

    #[must_use]
    pub fn colors(&self) -> &[u32] {
        &self.argb
    }
}

impl Default for PaletteRam {
    fn default() -> Self {
        Self::new()
    }
}

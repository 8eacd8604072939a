//! Playfield control blocks.
//!
//! Two blocks of eight words. `control_0` drives pf2 (layer A) and pf3
//! (layer B); `control_1` drives pf1 (layer A) and pf4 (layer B).
//!
//! | word | meaning |
//! |------|---------|
//! | 0 | bit 7 of `control_1`: flip screen |
//! | 1, 2 | layer A scroll X, Y |
//! | 3, 4 | layer B scroll X, Y |
//! | 5 | scroll style: A in bits 11-13, B in bits 3-5 |
//! | 6 | enables: A rowscroll 0x4000, B rowscroll 0x0040, B colscroll 0x0020 |
//! | 7 | `control_0` only: gfx bank, pf2 in the low byte, pf3 in the high byte |
//!
//! Bits with no known meaning are stored and returned untouched.

use emu_core::combine_word;

pub const CONTROL_WORDS: usize = 8;

pub const WORD_FLAGS: usize = 0;
pub const WORD_A_SCROLL_X: usize = 1;
pub const WORD_A_SCROLL_Y: usize = 2;
pub const WORD_B_SCROLL_X: usize = 3;
pub const WORD_B_SCROLL_Y: usize = 4;
pub const WORD_STYLE: usize = 5;
pub const WORD_ENABLE: usize = 6;
pub const WORD_BANK: usize = 7;

/// Flip-screen bit in word 0 of `control_1`.
pub const FLIP_SCREEN: u16 = 0x0080;

/// Which of the two control blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlId {
    Control0,
    Control1,
}

impl ControlId {
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Control0 => 0,
            Self::Control1 => 1,
        }
    }
}

/// Fixed additive offsets the bootleg board's scroll latches are wired
/// with, as (block, word, delta).
pub const BOOTLEG_SCROLL_OFFSETS: [(ControlId, usize, i16); 3] = [
    (ControlId::Control0, WORD_B_SCROLL_X, 0x0A),
    (ControlId::Control1, WORD_A_SCROLL_X, -2),
    (ControlId::Control1, WORD_B_SCROLL_X, 0x0A),
];

/// Bootleg offset for a word of a block, if it has one.
#[must_use]
pub fn bootleg_offset(id: ControlId, word: usize) -> Option<i16> {
    BOOTLEG_SCROLL_OFFSETS
        .iter()
        .find(|&&(block, w, _)| block == id && w == word)
        .map(|&(_, _, delta)| delta)
}

/// Sixteen bytes of write-only playfield control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlBlock {
    words: [u16; CONTROL_WORDS],
}

impl ControlBlock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Masked write at a byte offset inside the block.
    pub fn write(&mut self, offset: u32, data: u16, mask: u16) {
        let word = Self::word_index(offset);
        self.words[word] = combine_word(self.words[word], data, mask);
    }

    #[must_use]
    pub fn word(&self, word: usize) -> u16 {
        self.words[word % CONTROL_WORDS]
    }

    #[must_use]
    pub fn words(&self) -> &[u16; CONTROL_WORDS] {
        &self.words
    }

    #[must_use]
    pub fn flip_screen(&self) -> bool {
        self.words[WORD_FLAGS] & FLIP_SCREEN != 0
    }

    #[must_use]
    pub const fn word_index(offset: u32) -> usize {
        ((offset >> 1) as usize) % CONTROL_WORDS
    }
}

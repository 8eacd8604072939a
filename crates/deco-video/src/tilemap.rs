//! Playfield tilemaps.

use emu_core::combine_word;

use crate::control::{
    ControlBlock, ControlId, WORD_A_SCROLL_X, WORD_A_SCROLL_Y, WORD_B_SCROLL_X, WORD_B_SCROLL_Y,
};
use crate::scroll::{COLSCROLL_COLUMNS, ROWS_8X8, ROWS_16X16, ScrollLayout, ScrollState};

/// Tilemap width in cells.
pub const TILEMAP_COLS: usize = 64;
/// Tilemap height in cells.
pub const TILEMAP_ROWS: usize = 32;
/// Words of tile data per playfield (0x1000 bytes).
pub const TILE_WORDS: usize = TILEMAP_COLS * TILEMAP_ROWS;
/// Words of rowscroll per playfield (0x800 bytes).
pub const ROWSCROLL_WORDS: usize = 0x400;

/// The four playfields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// 8×8 text layer, topmost.
    Pf1,
    /// Opaque background.
    Pf2,
    Pf3,
    /// Split into back and front halves around the low-priority sprites.
    Pf4,
}

/// Which of the two 16×16 tile ROM regions a playfield reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxBank {
    Bank0,
    #[default]
    Bank1,
}

impl GfxBank {
    /// Decode an 8-bit selector from `control_0` word 7.
    #[must_use]
    pub const fn from_selector(selector: u8) -> Self {
        if (selector >> 4) & 0x0F != 0 {
            Self::Bank0
        } else {
            Self::Bank1
        }
    }
}

/// Graphics a playfield is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfxSource {
    Chars,
    Tiles(GfxBank),
}

/// How pens of a playfield combine with what is already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    Opaque,
    /// Pen 0 is see-through.
    Pen0,
    /// Pens 1-7 are the back half, pens 8-15 the front half.
    Split,
}

/// Decoded tile data word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    pub code: u16,
    pub color: u8,
}

impl TileInfo {
    #[must_use]
    pub const fn decode(word: u16) -> Self {
        Self {
            code: word & 0x0FFF,
            color: (word >> 12) as u8,
        }
    }
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Pf1, Layer::Pf2, Layer::Pf3, Layer::Pf4];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Pf1 => 0,
            Self::Pf2 => 1,
            Self::Pf3 => 2,
            Self::Pf4 => 3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pf1 => "pf1",
            Self::Pf2 => "pf2",
            Self::Pf3 => "pf3",
            Self::Pf4 => "pf4",
        }
    }

    /// Control block holding this playfield's scroll registers.
    #[must_use]
    pub const fn control(self) -> ControlId {
        match self {
            Self::Pf2 | Self::Pf3 => ControlId::Control0,
            Self::Pf1 | Self::Pf4 => ControlId::Control1,
        }
    }

    /// Cell size in pixels.
    #[must_use]
    pub const fn tile_size(self) -> usize {
        match self {
            Self::Pf1 => 8,
            _ => 16,
        }
    }

    #[must_use]
    pub const fn pixel_width(self) -> usize {
        TILEMAP_COLS * self.tile_size()
    }

    #[must_use]
    pub const fn pixel_height(self) -> usize {
        TILEMAP_ROWS * self.tile_size()
    }

    #[must_use]
    pub const fn transparency(self) -> Transparency {
        match self {
            Self::Pf2 => Transparency::Opaque,
            Self::Pf1 | Self::Pf3 => Transparency::Pen0,
            Self::Pf4 => Transparency::Split,
        }
    }

    /// First palette entry used by colour 0 of this playfield.
    #[must_use]
    pub const fn palette_base(self) -> u16 {
        match self {
            Self::Pf1 => 0x000,
            Self::Pf4 => 0x500,
            Self::Pf3 => 0x600,
            Self::Pf2 => 0x700,
        }
    }

    /// Tile data index of a cell. The 16×16 playfields are two 32×32
    /// pages side by side.
    #[must_use]
    pub const fn tile_index(self, col: usize, row: usize) -> usize {
        match self {
            Self::Pf1 => row * TILEMAP_COLS + col,
            _ => (col & 0x1F) + ((row & 0x1F) << 5) + ((col & 0x20) << 5),
        }
    }

    /// Inverse of [`Layer::tile_index`].
    #[must_use]
    pub const fn cell(self, index: usize) -> (usize, usize) {
        match self {
            Self::Pf1 => (index % TILEMAP_COLS, index / TILEMAP_COLS),
            _ => ((index & 0x1F) | ((index >> 5) & 0x20), (index >> 5) & 0x1F),
        }
    }

    #[must_use]
    pub fn scroll_layout(self) -> ScrollLayout {
        match self {
            Self::Pf1 => ScrollLayout {
                x_word: WORD_A_SCROLL_X,
                y_word: WORD_A_SCROLL_Y,
                style_shift: 11,
                rowscroll_enable: 0x4000,
                colscroll_enable: 0,
                row_counts: &ROWS_8X8,
                colscroll_deltas: 0..0,
            },
            Self::Pf2 => ScrollLayout {
                x_word: WORD_A_SCROLL_X,
                y_word: WORD_A_SCROLL_Y,
                style_shift: 11,
                rowscroll_enable: 0x4000,
                colscroll_enable: 0,
                row_counts: &ROWS_16X16,
                colscroll_deltas: 0..0,
            },
            // pf3 only offsets the right half of its columns; pf4 offsets
            // all of them. Both match the boards.
            Self::Pf3 => ScrollLayout {
                x_word: WORD_B_SCROLL_X,
                y_word: WORD_B_SCROLL_Y,
                style_shift: 3,
                rowscroll_enable: 0x0040,
                colscroll_enable: 0x0020,
                row_counts: &ROWS_16X16,
                colscroll_deltas: COLSCROLL_COLUMNS / 2..COLSCROLL_COLUMNS,
            },
            Self::Pf4 => ScrollLayout {
                x_word: WORD_B_SCROLL_X,
                y_word: WORD_B_SCROLL_Y,
                style_shift: 3,
                rowscroll_enable: 0x0040,
                colscroll_enable: 0x0020,
                row_counts: &ROWS_16X16,
                colscroll_deltas: 0..COLSCROLL_COLUMNS,
            },
        }
    }
}

/// One playfield: tile data, rowscroll buffer and per-frame state.
pub struct Tilemap {
    layer: Layer,
    data: Vec<u16>,
    rowscroll: Vec<u16>,
    dirty: Vec<bool>,
    bank: GfxBank,
    scroll: ScrollState,
    flip: bool,
}

impl Tilemap {
    #[must_use]
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            data: vec![0; TILE_WORDS],
            rowscroll: vec![0; ROWSCROLL_WORDS],
            dirty: vec![true; TILE_WORDS],
            bank: GfxBank::default(),
            scroll: ScrollState::default(),
            flip: false,
        }
    }

    #[must_use]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Masked write to tile data at a byte offset. Marks the cell dirty.
    pub fn write_data(&mut self, offset: u32, data: u16, mask: u16) {
        let index = (offset as usize >> 1) % TILE_WORDS;
        self.data[index] = combine_word(self.data[index], data, mask);
        self.dirty[index] = true;
    }

    #[must_use]
    pub fn read_data(&self, offset: u32) -> u16 {
        self.data[(offset as usize >> 1) % TILE_WORDS]
    }

    /// Masked write to the rowscroll buffer. Consumed at frame time only.
    pub fn write_rowscroll(&mut self, offset: u32, data: u16, mask: u16) {
        let index = (offset as usize >> 1) % ROWSCROLL_WORDS;
        self.rowscroll[index] = combine_word(self.rowscroll[index], data, mask);
    }

    #[must_use]
    pub fn read_rowscroll(&self, offset: u32) -> u16 {
        self.rowscroll[(offset as usize >> 1) % ROWSCROLL_WORDS]
    }

    #[must_use]
    pub fn rowscroll(&self) -> &[u16] {
        &self.rowscroll
    }

    #[must_use]
    pub fn tile(&self, index: usize) -> TileInfo {
        TileInfo::decode(self.data[index % TILE_WORDS])
    }

    #[must_use]
    pub fn gfx(&self) -> GfxSource {
        match self.layer {
            Layer::Pf1 => GfxSource::Chars,
            _ => GfxSource::Tiles(self.bank),
        }
    }

    #[must_use]
    pub fn bank(&self) -> GfxBank {
        self.bank
    }

    /// Switch tile ROM bank. Returns true if it changed, in which case every
    /// cell is dirty.
    pub fn set_bank(&mut self, bank: GfxBank) -> bool {
        if bank == self.bank {
            return false;
        }
        self.bank = bank;
        self.mark_all_dirty();
        true
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    #[must_use]
    pub fn is_dirty(&self, index: usize) -> bool {
        self.dirty[index % TILE_WORDS]
    }

    pub fn dirty_tiles(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty
            .iter()
            .enumerate()
            .filter_map(|(index, &dirty)| dirty.then_some(index))
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.fill(false);
    }

    /// Recompute this frame's scroll from the owning control block.
    pub fn resolve_scroll(&mut self, control: &ControlBlock) {
        self.scroll = self.layer.scroll_layout().resolve(control, &self.rowscroll);
    }

    #[must_use]
    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn set_flip(&mut self, flip: bool) {
        self.flip = flip;
    }

    #[must_use]
    pub fn flip(&self) -> bool {
        self.flip
    }
}

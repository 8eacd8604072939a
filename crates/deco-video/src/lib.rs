//! Data East playfield and sprite compositor.
//!
//! The video block of Caveman Ninja and Edward Randy is four tilemap
//! playfields driven by two 16-byte control blocks, plus a sprite table
//! that the CPU fills and then latches with a DMA write. Each frame the
//! compositor resolves flip, graphics banks and scroll modes from the
//! control words, then drives a [`Renderer`] in a fixed layer order.
//!
//! Playfield | tiles | control block | palette base
//! ----------|-------|---------------|-------------
//! pf1       | 8×8   | control_1 A   | 0x000
//! pf2       | 16×16 | control_0 A   | 0x700
//! pf3       | 16×16 | control_0 B   | 0x600
//! pf4       | 16×16 | control_1 B   | 0x500
//!
//! Sprites use palette entries from 0x300.

mod compositor;
mod control;
mod render;
mod scroll;
mod soft;
mod sprites;
mod tilemap;

pub use compositor::{VideoCompositor, VideoConfig};
pub use control::{
    BOOTLEG_SCROLL_OFFSETS, CONTROL_WORDS, ControlBlock, ControlId, FLIP_SCREEN, WORD_A_SCROLL_X,
    WORD_A_SCROLL_Y, WORD_B_SCROLL_X, WORD_B_SCROLL_Y, WORD_BANK, WORD_ENABLE, WORD_FLAGS,
    WORD_STYLE,
};
pub use render::{DrawPass, Renderer};
pub use scroll::{ROWS_8X8, ROWS_16X16, ScrollLayout, ScrollMode, ScrollState};
pub use soft::{Bitmap, GfxElement, GfxSet, SCREEN_HEIGHT, SCREEN_WIDTH, SoftRenderer};
pub use sprites::{
    SPRITE_COLORS, SPRITE_COUNT, SPRITE_PALETTE_BASE, SPRITE_RAM_WORDS, SpriteCell, SpriteEntry,
    SpritePaletteUsage, SpritePriority,
};
pub use tilemap::{
    GfxBank, GfxSource, Layer, ROWSCROLL_WORDS, TILE_WORDS, TILEMAP_COLS, TILEMAP_ROWS, TileInfo,
    Tilemap, Transparency,
};

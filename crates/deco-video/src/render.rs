//! The drawing seam between the compositor and a pixel backend.
//!
//! The compositor owns every decision about what is drawn and in which
//! order. A `Renderer` only turns tilemaps and sprite cells into pixels.

use crate::sprites::SpriteCell;
use crate::tilemap::Tilemap;

/// Which pens of a tilemap a draw call puts on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPass {
    /// Every pen, including 0.
    Opaque,
    /// Pens 1-15.
    Transparent,
    /// Back half of a split playfield: pens 1-7.
    Back,
    /// Front half of a split playfield: pens 8-15.
    Front,
}

impl DrawPass {
    /// Whether a 4-bit pen is drawn by this pass.
    #[must_use]
    pub const fn accepts(self, pen: u8) -> bool {
        match self {
            Self::Opaque => true,
            Self::Transparent => pen != 0,
            Self::Back => pen != 0 && pen < 8,
            Self::Front => pen >= 8,
        }
    }
}

/// Pixel backend driven once per frame by the compositor.
pub trait Renderer {
    /// Bring cached tile pixels up to date with the tilemap's dirty cells.
    fn update_tilemap(&mut self, tilemap: &Tilemap);

    /// Draw a tilemap with its resolved scroll and flip state.
    fn draw_tilemap(&mut self, tilemap: &Tilemap, pass: DrawPass);

    /// Draw one 16×16 sprite cell with pen 0 transparent.
    fn draw_sprite(&mut self, cell: &SpriteCell);

    /// Bitmask of the pens used by a sprite graphic.
    fn sprite_pen_usage(&self, _code: u32) -> u16 {
        0xFFFF
    }
}

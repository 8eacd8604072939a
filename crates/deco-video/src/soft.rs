//! Software renderer: decoded graphics, cached playfields and a pen bitmap.

use crate::render::{DrawPass, Renderer};
use crate::sprites::{SPRITE_PALETTE_BASE, SpriteCell};
use crate::tilemap::{GfxBank, GfxSource, Layer, Tilemap};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 256;

/// Decoded graphics: one byte per pixel holding a 4-bit pen.
#[derive(Debug, Clone)]
pub struct GfxElement {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    pen_usage: Vec<u16>,
}

impl GfxElement {
    /// Build from `count × width × height` pen bytes. Only the low nibble
    /// of each byte is used.
    #[must_use]
    pub fn new(width: usize, height: usize, mut pixels: Vec<u8>) -> Self {
        let size = width * height;
        pixels.truncate(pixels.len() - pixels.len() % size.max(1));
        for pixel in &mut pixels {
            *pixel &= 0x0F;
        }
        let pen_usage = pixels
            .chunks_exact(size.max(1))
            .map(|tile| tile.iter().fold(0u16, |mask, &pen| mask | (1 << pen)))
            .collect();
        Self {
            width,
            height,
            pixels,
            pen_usage,
        }
    }

    /// An element with no graphics; every pixel reads as pen 0.
    #[must_use]
    pub fn empty(width: usize, height: usize) -> Self {
        Self::new(width, height, Vec::new())
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.pen_usage.len()
    }

    /// Pen at `(x, y)` of graphic `code`. Codes past the end wrap.
    #[must_use]
    pub fn pixel(&self, code: u32, x: usize, y: usize) -> u8 {
        if self.pen_usage.is_empty() {
            return 0;
        }
        let code = code as usize % self.count();
        self.pixels[(code * self.height + y) * self.width + x]
    }

    #[must_use]
    pub fn pen_usage(&self, code: u32) -> u16 {
        if self.pen_usage.is_empty() {
            return 0;
        }
        self.pen_usage[code as usize % self.count()]
    }
}

/// Every graphics region of the board.
#[derive(Debug, Clone)]
pub struct GfxSet {
    /// 8×8 characters for pf1.
    pub chars: GfxElement,
    /// 16×16 tiles, two banks.
    pub tiles: [GfxElement; 2],
    /// 16×16 sprites.
    pub sprites: GfxElement,
}

impl GfxSet {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            chars: GfxElement::empty(8, 8),
            tiles: [GfxElement::empty(16, 16), GfxElement::empty(16, 16)],
            sprites: GfxElement::empty(16, 16),
        }
    }

    #[must_use]
    pub fn element(&self, source: GfxSource) -> &GfxElement {
        match source {
            GfxSource::Chars => &self.chars,
            GfxSource::Tiles(GfxBank::Bank0) => &self.tiles[0],
            GfxSource::Tiles(GfxBank::Bank1) => &self.tiles[1],
        }
    }
}

/// A bitmap of palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pens: Vec<u16>,
}

impl Bitmap {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pens: vec![0; width * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.pens[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, pen: u16) {
        self.pens[y * self.width + x] = pen;
    }

    #[must_use]
    pub fn pens(&self) -> &[u16] {
        &self.pens
    }

    /// The bitmap rotated by 180 degrees.
    #[must_use]
    pub fn flipped(&self) -> Self {
        let mut pens = self.pens.clone();
        pens.reverse();
        Self {
            width: self.width,
            height: self.height,
            pens,
        }
    }
}

/// A playfield pre-drawn at full tilemap size.
struct LayerCache {
    width: usize,
    pens: Vec<u16>,
}

/// Renders into a 256×256 pen bitmap.
pub struct SoftRenderer {
    gfx: GfxSet,
    bitmap: Bitmap,
    caches: [Option<LayerCache>; 4],
}

impl SoftRenderer {
    #[must_use]
    pub fn new(gfx: GfxSet) -> Self {
        Self {
            gfx,
            bitmap: Bitmap::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            caches: [None, None, None, None],
        }
    }

    #[must_use]
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    #[must_use]
    pub fn gfx(&self) -> &GfxSet {
        &self.gfx
    }

    fn draw_tile(gfx: &GfxSet, tilemap: &Tilemap, cache: &mut LayerCache, index: usize) {
        let layer = tilemap.layer();
        let size = layer.tile_size();
        let (col, row) = layer.cell(index);
        let tile = tilemap.tile(index);
        let element = gfx.element(tilemap.gfx());
        let color_base = layer.palette_base() + u16::from(tile.color) * 16;
        for y in 0..size {
            let line = (row * size + y) * cache.width + col * size;
            for x in 0..size {
                let pen = element.pixel(u32::from(tile.code), x, y);
                cache.pens[line + x] = color_base + u16::from(pen);
            }
        }
    }
}

impl Renderer for SoftRenderer {
    fn update_tilemap(&mut self, tilemap: &Tilemap) {
        let layer = tilemap.layer();
        let slot = &mut self.caches[layer.index()];
        let cache = slot.get_or_insert_with(|| LayerCache {
            width: layer.pixel_width(),
            pens: vec![0; layer.pixel_width() * layer.pixel_height()],
        });
        for index in tilemap.dirty_tiles() {
            Self::draw_tile(&self.gfx, tilemap, cache, index);
        }
    }

    fn draw_tilemap(&mut self, tilemap: &Tilemap, pass: DrawPass) {
        let layer = tilemap.layer();
        let Some(cache) = &self.caches[layer.index()] else {
            return;
        };
        let (width, height) = (layer.pixel_width(), layer.pixel_height());
        let (screen_w, screen_h) = (self.bitmap.width(), self.bitmap.height());
        let scroll = tilemap.scroll();
        for sy in 0..screen_h {
            for sx in 0..screen_w {
                let (ux, uy) = if tilemap.flip() {
                    (screen_w - 1 - sx, screen_h - 1 - sy)
                } else {
                    (sx, sy)
                };
                let (tx, ty) = scroll.source(ux, uy, width, height);
                let pen = cache.pens[ty * width + tx];
                if pass.accepts((pen & 0x0F) as u8) {
                    self.bitmap.set(sx, sy, pen);
                }
            }
        }
    }

    fn draw_sprite(&mut self, cell: &SpriteCell) {
        let color_base = SPRITE_PALETTE_BASE + u16::from(cell.color) * 16;
        for py in 0..16usize {
            let sy = cell.y + py as i32;
            if sy < 0 || sy >= self.bitmap.height() as i32 {
                continue;
            }
            let src_y = if cell.flip_y { 15 - py } else { py };
            for px in 0..16usize {
                let sx = cell.x + px as i32;
                if sx < 0 || sx >= self.bitmap.width() as i32 {
                    continue;
                }
                let src_x = if cell.flip_x { 15 - px } else { px };
                let pen = self.gfx.sprites.pixel(cell.code, src_x, src_y);
                if pen != 0 {
                    self.bitmap.set(sx as usize, sy as usize, color_base + u16::from(pen));
                }
            }
        }
    }

    fn sprite_pen_usage(&self, code: u32) -> u16 {
        self.gfx.sprites.pen_usage(code)
    }
}

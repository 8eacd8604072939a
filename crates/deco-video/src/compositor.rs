//! The per-frame compositor.

use emu_core::{Observable, Value, parse_index};

use crate::control::{ControlBlock, ControlId, WORD_BANK, bootleg_offset};
use crate::render::{DrawPass, Renderer};
use crate::scroll::ScrollMode;
use crate::sprites::{SpriteCell, SpritePaletteUsage, SpritePriority, SpriteRam, sprite_cells};
use crate::tilemap::{GfxBank, Layer, Tilemap};

/// Board-specific behaviour of the video hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConfig {
    /// Mask applied to sprite codes (sized to the sprite ROMs).
    pub sprite_mask: u16,
    /// Apply the bootleg's scroll latch offsets on control writes.
    pub bootleg_scroll_offsets: bool,
}

/// Two control blocks, four playfields and the sprite table.
pub struct VideoCompositor {
    config: VideoConfig,
    control: [ControlBlock; 2],
    tilemaps: [Tilemap; 4],
    sprites: SpriteRam,
    flip: bool,
    frame: u64,
    palette_usage: SpritePaletteUsage,
}

impl VideoCompositor {
    #[must_use]
    pub fn new(config: VideoConfig) -> Self {
        Self {
            config,
            control: [ControlBlock::new(), ControlBlock::new()],
            tilemaps: Layer::ALL.map(Tilemap::new),
            sprites: SpriteRam::new(),
            flip: false,
            frame: 0,
            palette_usage: SpritePaletteUsage::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    /// CPU write to a control block at a byte offset.
    ///
    /// On the bootleg three scroll latches add a fixed offset to the
    /// written value before the masked combine.
    pub fn write_control(&mut self, id: ControlId, offset: u32, data: u16, mask: u16) {
        let word = ControlBlock::word_index(offset);
        let data = match bootleg_offset(id, word) {
            Some(delta) if self.config.bootleg_scroll_offsets => data.wrapping_add_signed(delta),
            _ => data,
        };
        self.control[id.index()].write(offset, data, mask);
    }

    #[must_use]
    pub fn control(&self, id: ControlId) -> &ControlBlock {
        &self.control[id.index()]
    }

    pub fn write_tiles(&mut self, layer: Layer, offset: u32, data: u16, mask: u16) {
        self.tilemaps[layer.index()].write_data(offset, data, mask);
    }

    #[must_use]
    pub fn read_tiles(&self, layer: Layer, offset: u32) -> u16 {
        self.tilemaps[layer.index()].read_data(offset)
    }

    pub fn write_rowscroll(&mut self, layer: Layer, offset: u32, data: u16, mask: u16) {
        self.tilemaps[layer.index()].write_rowscroll(offset, data, mask);
    }

    #[must_use]
    pub fn read_rowscroll(&self, layer: Layer, offset: u32) -> u16 {
        self.tilemaps[layer.index()].read_rowscroll(offset)
    }

    pub fn write_sprites(&mut self, offset: u32, data: u16, mask: u16) {
        self.sprites.write(offset, data, mask);
    }

    #[must_use]
    pub fn read_sprites(&self, offset: u32) -> u16 {
        self.sprites.read(offset)
    }

    /// DMA flag: snapshot the live sprite table for the next render.
    pub fn buffer_sprites(&mut self) {
        self.sprites.buffer();
        log::debug!("sprite table buffered at frame {}", self.frame);
    }

    #[must_use]
    pub fn tilemap(&self, layer: Layer) -> &Tilemap {
        &self.tilemaps[layer.index()]
    }

    /// Flip state used by the last render.
    #[must_use]
    pub fn flip_screen(&self) -> bool {
        self.flip
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sprite palette usage computed by the last render.
    #[must_use]
    pub fn palette_usage(&self) -> &SpritePaletteUsage {
        &self.palette_usage
    }

    /// Cells `render` would draw for one priority group this frame.
    #[must_use]
    pub fn sprite_cells(&self, group: SpritePriority) -> Vec<SpriteCell> {
        sprite_cells(
            self.sprites.entries(),
            group,
            self.frame,
            self.flip,
            self.config.sprite_mask,
        )
    }

    fn resolve_banks(&mut self) {
        let selectors = self.control[ControlId::Control0.index()].word(WORD_BANK);
        let banks = [
            (Layer::Pf2, GfxBank::from_selector((selectors & 0xFF) as u8)),
            (Layer::Pf3, GfxBank::from_selector((selectors >> 8) as u8)),
        ];
        for (layer, bank) in banks {
            if self.tilemaps[layer.index()].set_bank(bank) {
                log::debug!("{} switched to {bank:?}", layer.name());
            }
        }
    }

    fn draw_sprites<R: Renderer + ?Sized>(&self, renderer: &mut R, group: SpritePriority) {
        for cell in self.sprite_cells(group) {
            renderer.draw_sprite(&cell);
        }
    }

    /// Render one frame.
    pub fn render<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        self.flip = self.control[ControlId::Control1.index()].flip_screen();
        self.resolve_banks();

        for tilemap in &mut self.tilemaps {
            let control = &self.control[tilemap.layer().control().index()];
            tilemap.set_flip(self.flip);
            tilemap.resolve_scroll(control);
        }

        for tilemap in &mut self.tilemaps {
            renderer.update_tilemap(tilemap);
            tilemap.clear_dirty();
        }

        self.palette_usage = SpritePaletteUsage::scan(
            self.sprites.entries(),
            self.config.sprite_mask,
            |code| renderer.sprite_pen_usage(code),
        );

        renderer.draw_tilemap(self.tilemap(Layer::Pf2), DrawPass::Opaque);
        renderer.draw_tilemap(self.tilemap(Layer::Pf3), DrawPass::Transparent);
        renderer.draw_tilemap(self.tilemap(Layer::Pf4), DrawPass::Back);
        self.draw_sprites(renderer, SpritePriority::BelowPf4Front);
        renderer.draw_tilemap(self.tilemap(Layer::Pf4), DrawPass::Front);
        self.draw_sprites(renderer, SpritePriority::AbovePf4Front);
        renderer.draw_tilemap(self.tilemap(Layer::Pf1), DrawPass::Transparent);

        self.frame += 1;
    }
}

fn layer_by_name(name: &str) -> Option<Layer> {
    Layer::ALL.into_iter().find(|layer| layer.name() == name)
}

impl Observable for VideoCompositor {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "flip" => return Some(self.flip.into()),
            "frame" => return Some(self.frame.into()),
            _ => {}
        }
        let (head, tail) = path.split_once('.')?;
        let control = match head {
            "control_0" => Some(ControlId::Control0),
            "control_1" => Some(ControlId::Control1),
            _ => None,
        };
        if let Some(id) = control {
            let word = parse_index(tail)?;
            return (word < 8).then(|| self.control(id).word(word).into());
        }
        let tilemap = self.tilemap(layer_by_name(head)?);
        let scroll = tilemap.scroll();
        match tail {
            "mode" => Some(
                match scroll.mode {
                    ScrollMode::Fixed => "fixed",
                    ScrollMode::Rows => "rows",
                    ScrollMode::Columns => "columns",
                }
                .into(),
            ),
            "rows" => Some((scroll.rows() as u32).into()),
            "cols" => Some((scroll.cols() as u32).into()),
            "scroll_x" => Some(scroll.scroll_x.clone().into()),
            "scroll_y" => Some(scroll.scroll_y.clone().into()),
            "bank" => Some(format!("{:?}", tilemap.bank()).as_str().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "flip",
            "frame",
            "control_0.<word>",
            "control_1.<word>",
            "pf<n>.mode",
            "pf<n>.rows",
            "pf<n>.cols",
            "pf<n>.scroll_x",
            "pf<n>.scroll_y",
            "pf<n>.bank",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soft::{GfxElement, GfxSet, SoftRenderer};
    use crate::tilemap::TILE_WORDS;
    use emu_core::{MASK_HIGH_BYTE, MASK_LOW_BYTE, MASK_WORD};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        Tilemap(Layer, DrawPass),
        Sprite(SpriteCell),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        dirty_counts: Vec<(Layer, usize)>,
    }

    impl Renderer for Recorder {
        fn update_tilemap(&mut self, tilemap: &Tilemap) {
            self.dirty_counts
                .push((tilemap.layer(), tilemap.dirty_tiles().count()));
        }

        fn draw_tilemap(&mut self, tilemap: &Tilemap, pass: DrawPass) {
            self.calls.push(Call::Tilemap(tilemap.layer(), pass));
        }

        fn draw_sprite(&mut self, cell: &SpriteCell) {
            self.calls.push(Call::Sprite(*cell));
        }
    }

    impl Recorder {
        fn sprite_calls(&self) -> Vec<SpriteCell> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Sprite(cell) => Some(*cell),
                    Call::Tilemap(..) => None,
                })
                .collect()
        }
    }

    fn compositor(bootleg: bool) -> VideoCompositor {
        VideoCompositor::new(VideoConfig {
            sprite_mask: 0x3FFF,
            bootleg_scroll_offsets: bootleg,
        })
    }

    fn write_sprite(video: &mut VideoCompositor, slot: u32, attr: u16, code: u16, pos: u16) {
        video.write_sprites(slot * 8, attr, MASK_WORD);
        video.write_sprites(slot * 8 + 2, code, MASK_WORD);
        video.write_sprites(slot * 8 + 4, pos, MASK_WORD);
    }

    #[test]
    fn draw_order_is_fixed() {
        let mut video = compositor(false);
        write_sprite(&mut video, 0, 0, 1, 0x4000);
        write_sprite(&mut video, 1, 0, 2, 0x0000);
        video.buffer_sprites();
        let mut recorder = Recorder::default();
        video.render(&mut recorder);

        let order: Vec<_> = recorder
            .calls
            .iter()
            .map(|call| match call {
                Call::Tilemap(layer, pass) => format!("{}:{pass:?}", layer.name()),
                Call::Sprite(cell) => format!("sprite:{}", cell.code),
            })
            .collect();
        assert_eq!(
            order,
            [
                "pf2:Opaque",
                "pf3:Transparent",
                "pf4:Back",
                "sprite:2",
                "pf4:Front",
                "sprite:1",
                "pf1:Transparent",
            ]
        );
    }

    #[test]
    fn rowscroll_with_256_rows_on_pf2() {
        let mut video = compositor(false);
        video.write_control(ControlId::Control0, 0xC, 0x4000, MASK_WORD);
        video.write_control(ControlId::Control0, 0xA, 1 << 11, MASK_WORD);
        video.write_control(ControlId::Control0, 0x2, 0x0100, MASK_WORD);
        for row in 0..256u16 {
            video.write_rowscroll(Layer::Pf2, u32::from(row) * 2, row * 3 + 7, MASK_WORD);
        }
        video.render(&mut Recorder::default());

        let scroll = video.tilemap(Layer::Pf2).scroll();
        assert_eq!(scroll.mode, ScrollMode::Rows);
        assert_eq!(scroll.rows(), 256);
        assert_eq!(scroll.cols(), 1);
        for (row, &x) in scroll.scroll_x.iter().enumerate() {
            assert_eq!(x, 0x0100 + row as u16 * 3 + 7);
        }
        assert_eq!(video.query("pf2.rows"), Some(Value::U32(256)));
        assert_eq!(video.query("pf3.mode"), Some(Value::from("fixed")));
    }

    #[test]
    fn scroll_mode_is_recomputed_every_frame() {
        let mut video = compositor(false);
        video.write_control(ControlId::Control1, 0xC, 0x0040, MASK_WORD);
        video.render(&mut Recorder::default());
        assert_eq!(video.tilemap(Layer::Pf4).scroll().rows(), 512);
        video.write_control(ControlId::Control1, 0xC, 0x0000, MASK_WORD);
        video.render(&mut Recorder::default());
        assert_eq!(video.tilemap(Layer::Pf4).scroll().mode, ScrollMode::Fixed);
        assert_eq!(video.tilemap(Layer::Pf4).scroll().rows(), 1);
    }

    #[test]
    fn double_height_sprite_draws_in_priority_clear_pass_only() {
        let mut video = compositor(false);
        // y = 140 -> screen 100, x = 140 -> screen 100, height 2x.
        write_sprite(&mut video, 0, 0x0200 | 140, 5, 140);
        video.buffer_sprites();
        let mut recorder = Recorder::default();
        video.render(&mut recorder);

        let back = recorder
            .calls
            .iter()
            .position(|c| *c == Call::Tilemap(Layer::Pf4, DrawPass::Back))
            .expect("pf4 back pass");
        let front = recorder
            .calls
            .iter()
            .position(|c| *c == Call::Tilemap(Layer::Pf4, DrawPass::Front))
            .expect("pf4 front pass");
        assert_eq!(front - back, 3);
        let placed: Vec<_> = recorder
            .sprite_calls()
            .iter()
            .map(|c| (c.code, c.x, c.y))
            .collect();
        assert_eq!(placed, vec![(4, 100, 84), (5, 100, 100)]);
    }

    #[test]
    fn bootleg_scroll_latch_offsets() {
        const V: u16 = 0x1234;
        let mut bootleg = compositor(true);
        let mut original = compositor(false);
        for video in [&mut bootleg, &mut original] {
            video.write_control(ControlId::Control0, 0x2, V, MASK_WORD);
            video.write_control(ControlId::Control0, 0x6, V, MASK_WORD);
            video.write_control(ControlId::Control1, 0x2, V, MASK_WORD);
            video.write_control(ControlId::Control1, 0x6, V, MASK_WORD);
        }

        let c0 = bootleg.control(ControlId::Control0);
        let c1 = bootleg.control(ControlId::Control1);
        assert_eq!(c0.word(1), V);
        assert_eq!(c0.word(3), V + 0xA);
        assert_eq!(c1.word(1), V - 2);
        assert_eq!(c1.word(3), V + 0xA);

        for id in [ControlId::Control0, ControlId::Control1] {
            assert_eq!(original.control(id).word(1), V);
            assert_eq!(original.control(id).word(3), V);
        }

        bootleg.write_control(ControlId::Control1, 0x2, 0x0000, MASK_WORD);
        assert_eq!(bootleg.control(ControlId::Control1).word(1), 0xFFFE);
    }

    #[test]
    fn bootleg_byte_writes_keep_the_other_lane() {
        let mut video = compositor(true);
        video.write_control(ControlId::Control0, 0x6, 0x1200, MASK_WORD);
        assert_eq!(video.control(ControlId::Control0).word(3), 0x120A);

        video.write_control(ControlId::Control0, 0x7, 0x0034, MASK_LOW_BYTE);
        assert_eq!(video.control(ControlId::Control0).word(3), 0x123E);

        video.write_control(ControlId::Control0, 0x6, 0x5600, MASK_HIGH_BYTE);
        assert_eq!(video.control(ControlId::Control0).word(3), 0x563E);

        video.write_control(ControlId::Control1, 0x2, 0x0000, MASK_WORD);
        video.write_control(ControlId::Control1, 0x3, 0x0010, MASK_LOW_BYTE);
        assert_eq!(video.control(ControlId::Control1).word(1), 0xFF0E);
    }

    #[test]
    fn bank_switch_repaints_only_that_layer() {
        let mut video = compositor(false);
        let mut recorder = Recorder::default();
        video.render(&mut recorder);
        assert!(recorder.dirty_counts.iter().all(|&(_, n)| n == TILE_WORDS));

        video.write_control(ControlId::Control0, 0xF, 0x0010, MASK_LOW_BYTE);
        let mut recorder = Recorder::default();
        video.render(&mut recorder);
        assert_eq!(video.tilemap(Layer::Pf2).bank(), GfxBank::Bank0);
        assert_eq!(video.tilemap(Layer::Pf3).bank(), GfxBank::Bank1);
        assert_eq!(
            recorder.dirty_counts,
            vec![
                (Layer::Pf1, 0),
                (Layer::Pf2, TILE_WORDS),
                (Layer::Pf3, 0),
                (Layer::Pf4, 0),
            ]
        );
    }

    #[test]
    fn flash_follows_frame_parity() {
        let mut video = compositor(false);
        write_sprite(&mut video, 0, 0x1000, 1, 0);
        video.buffer_sprites();
        let mut counts = Vec::new();
        for _ in 0..4 {
            let mut recorder = Recorder::default();
            video.render(&mut recorder);
            counts.push(recorder.sprite_calls().len());
        }
        assert_eq!(counts, vec![1, 0, 1, 0]);
        assert_eq!(video.frame(), 4);
    }

    #[test]
    fn undocumented_control_bits_read_back() {
        let mut video = compositor(true);
        video.write_control(ControlId::Control1, 0xE, 0xFFFF, MASK_WORD);
        video.write_control(ControlId::Control0, 0x0, 0x7F7F, MASK_WORD);
        assert_eq!(video.query("control_1.7"), Some(Value::U16(0xFFFF)));
        assert_eq!(video.query("control_0.0"), Some(Value::U16(0x7F7F)));
    }

    fn patterned(width: usize, height: usize, count: usize, seed: usize) -> GfxElement {
        let mut pixels = Vec::with_capacity(width * height * count);
        for code in 0..count {
            for y in 0..height {
                for x in 0..width {
                    pixels.push(((code * 7 + x * 3 + y * 5 + seed) % 16) as u8);
                }
            }
        }
        GfxElement::new(width, height, pixels)
    }

    fn patterned_gfx() -> GfxSet {
        GfxSet {
            chars: patterned(8, 8, 16, 1),
            tiles: [patterned(16, 16, 16, 2), patterned(16, 16, 16, 3)],
            sprites: patterned(16, 16, 32, 4),
        }
    }

    fn busy_frame(flip: bool) -> SoftRenderer {
        let mut video = compositor(false);
        for layer in Layer::ALL {
            for cell in 0..TILE_WORDS as u32 {
                let word = ((cell * 13 + layer.index() as u32) & 0xF00F) as u16;
                video.write_tiles(layer, cell * 2, word, MASK_WORD);
            }
            for row in 0..0x400u32 {
                video.write_rowscroll(layer, row * 2, (row * 5 % 97) as u16, MASK_WORD);
            }
        }
        // pf2 rowscroll, pf3 colscroll, pf4 and pf1 fixed with offsets.
        video.write_control(ControlId::Control0, 0xC, 0x4020, MASK_WORD);
        video.write_control(ControlId::Control0, 0xA, 3 << 11, MASK_WORD);
        video.write_control(ControlId::Control0, 0x2, 0x0011, MASK_WORD);
        video.write_control(ControlId::Control0, 0x8, 0x0123, MASK_WORD);
        video.write_control(ControlId::Control1, 0x2, 0x0033, MASK_WORD);
        video.write_control(ControlId::Control1, 0x8, 0x0077, MASK_WORD);
        if flip {
            video.write_control(ControlId::Control1, 0x0, 0x0080, MASK_WORD);
        }

        write_sprite(&mut video, 0, 0x0200 | 140, 5, 140);
        write_sprite(&mut video, 1, 0x6400 | 30, 9, 0x4000 | (2 << 9) | 20);
        write_sprite(&mut video, 2, 0x2000 | 0x01F8, 17, 0x01FC);
        write_sprite(&mut video, 3, 0x0600 | 200, 3, (7 << 9) | 250);
        video.buffer_sprites();

        let mut renderer = SoftRenderer::new(patterned_gfx());
        video.render(&mut renderer);
        renderer
    }

    #[test]
    fn flip_screen_is_a_half_turn() {
        let normal = busy_frame(false);
        let flipped = busy_frame(true);
        assert_ne!(normal.bitmap().pens(), flipped.bitmap().pens());
        assert_eq!(flipped.bitmap(), &normal.bitmap().flipped());
    }

    #[test]
    fn palette_usage_ignores_absent_and_off_screen_sprites() {
        let mut video = compositor(false);
        write_sprite(&mut video, 0, 0, 0, 5 << 9);
        write_sprite(&mut video, 1, 0, 3, 2 << 9);
        write_sprite(&mut video, 2, 0, 1, (7 << 9) | 0x01EC);
        video.buffer_sprites();
        let mut renderer = SoftRenderer::new(patterned_gfx());
        video.render(&mut renderer);

        let usage = video.palette_usage();
        assert_eq!(usage.pens(2), renderer.gfx().sprites.pen_usage(3));
        assert!(!usage.is_used(5));
        assert!(!usage.is_used(7));
    }
}

//! Per-frame scroll mode decoding.
//!
//! Each playfield runs in exactly one of three modes per frame: a single
//! fixed offset, N-way rowscroll, or 64-way colscroll. The mode is decoded
//! from the control block every frame, never carried over.

use std::ops::Range;

use crate::control::{ControlBlock, WORD_ENABLE, WORD_STYLE};

/// Rowscroll row counts for 16×16 playfields, indexed by style.
pub const ROWS_16X16: [usize; 8] = [512, 256, 128, 64, 32, 16, 8, 4];
/// Rowscroll row counts for the 8×8 playfield, indexed by style.
pub const ROWS_8X8: [usize; 8] = [256, 128, 64, 32, 16, 8, 4, 2];

/// Colscroll column count.
pub const COLSCROLL_COLUMNS: usize = 64;
/// Word offset of the column deltas inside a rowscroll buffer.
pub const COLSCROLL_BASE: usize = 0x200;

/// Row count for a style value; anything outside the table is one row.
#[must_use]
pub fn row_count(table: &[usize; 8], style: u16) -> usize {
    table.get(usize::from(style)).copied().unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    Fixed,
    Rows,
    Columns,
}

/// Where one playfield finds its scroll parameters.
#[derive(Debug, Clone)]
pub struct ScrollLayout {
    pub x_word: usize,
    pub y_word: usize,
    pub style_shift: u32,
    pub rowscroll_enable: u16,
    /// Zero when the playfield has no colscroll mode.
    pub colscroll_enable: u16,
    pub row_counts: &'static [usize; 8],
    /// Columns that take a delta from the buffer in colscroll mode. The
    /// others keep the base Y.
    pub colscroll_deltas: Range<usize>,
}

/// Resolved scroll for one frame.
///
/// `scroll_x` has one entry per scroll row and `scroll_y` one per scroll
/// column; at least one of them has length 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollState {
    pub mode: ScrollMode,
    pub scroll_x: Vec<u16>,
    pub scroll_y: Vec<u16>,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            mode: ScrollMode::Fixed,
            scroll_x: vec![0],
            scroll_y: vec![0],
        }
    }
}

impl ScrollState {
    #[must_use]
    pub fn rows(&self) -> usize {
        self.scroll_x.len()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.scroll_y.len()
    }

    /// Map an unflipped screen pixel to a pixel of a `width`×`height`
    /// tilemap. Rows are chosen by source Y, columns by source X.
    #[must_use]
    pub fn source(&self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        if self.cols() > 1 {
            let sx = (x + usize::from(self.scroll_x[0])) % width;
            let col = sx * self.cols() / width;
            let sy = (y + usize::from(self.scroll_y[col])) % height;
            (sx, sy)
        } else {
            let sy = (y + usize::from(self.scroll_y[0])) % height;
            let row = sy * self.rows() / height;
            let sx = (x + usize::from(self.scroll_x[row])) % width;
            (sx, sy)
        }
    }
}

impl ScrollLayout {
    /// Decode this frame's scroll from the control block and the
    /// playfield's rowscroll buffer.
    #[must_use]
    pub fn resolve(&self, control: &ControlBlock, rowscroll: &[u16]) -> ScrollState {
        let enable = control.word(WORD_ENABLE);
        let base_x = control.word(self.x_word);
        let base_y = control.word(self.y_word);

        if enable & self.rowscroll_enable != 0 {
            let style = (control.word(WORD_STYLE) >> self.style_shift) & 7;
            let rows = row_count(self.row_counts, style);
            let scroll_x = (0..rows)
                .map(|row| base_x.wrapping_add(rowscroll[row]))
                .collect();
            return ScrollState {
                mode: ScrollMode::Rows,
                scroll_x,
                scroll_y: vec![base_y],
            };
        }

        if self.colscroll_enable != 0 && enable & self.colscroll_enable != 0 {
            let scroll_y = (0..COLSCROLL_COLUMNS)
                .map(|col| {
                    if self.colscroll_deltas.contains(&col) {
                        base_y.wrapping_add(rowscroll[COLSCROLL_BASE + col])
                    } else {
                        base_y
                    }
                })
                .collect();
            return ScrollState {
                mode: ScrollMode::Columns,
                scroll_x: vec![base_x],
                scroll_y,
            };
        }

        ScrollState {
            mode: ScrollMode::Fixed,
            scroll_x: vec![base_x],
            scroll_y: vec![base_y],
        }
    }
}

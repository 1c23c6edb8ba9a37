// ── Dialogue box layout & drawing ────────────────────────────────────────────
//
// Nine-slice tiling over the 4×3 dialogue atlas: a fixed small atlas renders
// boxes of any size, and rounding the content area up to whole tiles keeps
// every border seam on the tile grid with no partial-tile artifacts.

use crate::engine::Color;
use crate::error::EngineError;
use crate::renderer::atlas::DialogAtlas;
use crate::renderer::pipeline::OverlayVertex;
use crate::renderer::text::{TextImage, TextSource};

// ── Atlas cell roles ─────────────────────────────────────────────────────────
//
// Row-major indices into the 4×3 dialogue atlas.

pub const TILE_CORNER_TL: u32 = 0;
pub const TILE_BORDER_TOP: u32 = 1;
pub const TILE_CORNER_TR: u32 = 2;
pub const TILE_BORDER_LEFT: u32 = 4;
pub const TILE_FILL: u32 = 5;
pub const TILE_BORDER_RIGHT: u32 = 6;
pub const TILE_CORNER_BL: u32 = 8;
pub const TILE_BORDER_BOTTOM: u32 = 9;
pub const TILE_CORNER_BR: u32 = 10;
pub const TILE_INDICATOR: u32 = 11;

/// Tint applied to the rasterized dialogue text.
pub const TEXT_TINT: Color = Color::BLACK;

// ── Layout math (pure) ───────────────────────────────────────────────────────

/// Interior content area width: the measured text width rounded up to a
/// whole tile column, capped at `max_text_width`. The result doubles as
/// the wrap width for rasterization.
///
/// The cap wins even when it is not itself tile-aligned (the default
/// 200 px cap on 16 px tiles gives a 13-column box).
pub fn content_width(measured: f32, tile_w: u32, max_text_width: u32) -> u32 {
    let rounded = (measured / tile_w as f32).ceil() as u32 * tile_w;
    rounded.min(max_text_width)
}

/// Tile-grid dimensions of one dialogue box, derived per draw call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DialogLayout {
    /// Interior width in pixels (already rounded/clamped).
    pub content_w: u32,
    /// Interior height in pixels, rounded up to a whole tile row.
    pub content_h: u32,
    /// Interior columns.
    pub tiles_wide: u32,
    /// Interior rows.
    pub tiles_high: u32,
}

impl DialogLayout {
    pub fn compute(content_w: u32, image_h: u32, tile_w: u32, tile_h: u32) -> Self {
        let content_h = image_h.div_ceil(tile_h) * tile_h;
        Self {
            content_w,
            content_h,
            tiles_wide: content_w.div_ceil(tile_w),
            tiles_high: content_h / tile_h,
        }
    }
}

// ── Tile placement (pure) ────────────────────────────────────────────────────

/// One atlas cell positioned on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TilePlacement {
    pub index: u32,
    pub x: f32,
    pub y: f32,
}

/// Lay out every tile of one dialogue box anchored at `(x, y)`.
///
/// The bordered box extends one tile beyond the content area on each
/// side. Emission order: corners, top border, bottom border, left border,
/// right border, fill (row-major), indicator. The indicator sits one tile
/// right of the box origin and one pixel above the line two tile rows
/// below the content — it marks the box as pointing at its target.
pub fn dialog_tiles(x: f32, y: f32, layout: &DialogLayout, tile_w: u32, tile_h: u32) -> Vec<TilePlacement> {
    let tw = tile_w as f32;
    let th = tile_h as f32;
    let w = layout.content_w as f32;
    let h = layout.content_h as f32;

    let mut tiles = Vec::with_capacity(
        (5 + 2 * layout.tiles_wide + 2 * layout.tiles_high
            + layout.tiles_wide * layout.tiles_high) as usize,
    );

    tiles.push(TilePlacement { index: TILE_CORNER_TL, x, y });
    tiles.push(TilePlacement { index: TILE_CORNER_TR, x: x + tw + w, y });
    tiles.push(TilePlacement { index: TILE_CORNER_BL, x, y: y + h + th });
    tiles.push(TilePlacement { index: TILE_CORNER_BR, x: x + tw + w, y: y + h + th });

    for col in 0..layout.tiles_wide {
        tiles.push(TilePlacement {
            index: TILE_BORDER_TOP,
            x: x + (1 + col) as f32 * tw,
            y,
        });
    }
    for col in 0..layout.tiles_wide {
        tiles.push(TilePlacement {
            index: TILE_BORDER_BOTTOM,
            x: x + (1 + col) as f32 * tw,
            y: y + th + h,
        });
    }
    for row in 0..layout.tiles_high {
        tiles.push(TilePlacement {
            index: TILE_BORDER_LEFT,
            x,
            y: y + (1 + row) as f32 * th,
        });
    }
    for row in 0..layout.tiles_high {
        tiles.push(TilePlacement {
            index: TILE_BORDER_RIGHT,
            x: x + tw + w,
            y: y + (1 + row) as f32 * th,
        });
    }

    for col in 0..layout.tiles_wide {
        for row in 0..layout.tiles_high {
            tiles.push(TilePlacement {
                index: TILE_FILL,
                x: x + (1 + col) as f32 * tw,
                y: y + (1 + row) as f32 * th,
            });
        }
    }

    tiles.push(TilePlacement {
        index: TILE_INDICATOR,
        x: x + tw,
        y: y + h + 2.0 * th - 1.0,
    });

    tiles
}

// ── OverlayFrame ─────────────────────────────────────────────────────────────

/// Plain-data draw target for the screen-space overlay pass: atlas-textured
/// tile quads and glyph-textured text quads, accumulated during
/// `Game::render` and uploaded once per frame. No GPU state — fully
/// testable.
#[derive(Default)]
pub struct OverlayFrame {
    pub tile_vertices: Vec<OverlayVertex>,
    pub text_vertices: Vec<OverlayVertex>,
}

impl OverlayFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear accumulated geometry. Called once per frame before drawing.
    pub fn clear(&mut self) {
        self.tile_vertices.clear();
        self.text_vertices.clear();
    }

    fn push_quad(
        buf: &mut Vec<OverlayVertex>,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        uv_min: [f32; 2],
        uv_max: [f32; 2],
        color: Color,
    ) {
        let c = color.0;
        let tl = OverlayVertex { position: [x,     y    ], uv: uv_min,                  color: c };
        let tr = OverlayVertex { position: [x + w, y    ], uv: [uv_max[0], uv_min[1]], color: c };
        let bl = OverlayVertex { position: [x,     y + h], uv: [uv_min[0], uv_max[1]], color: c };
        let br = OverlayVertex { position: [x + w, y + h], uv: uv_max,                  color: c };
        buf.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
    }
}

// ── Dialog ───────────────────────────────────────────────────────────────────

struct CachedText {
    text: String,
    wrap_width: u32,
    image: TextImage,
}

/// The dialogue box renderer.
///
/// Owns the atlas slicing, the text service, and a single-slot rendered-
/// text cache keyed by `(text, wrap_width)`: drawing the same text twice
/// rasterizes once, drawing different text replaces the slot. Callers that
/// mutate external text state can force a refresh with [`Dialog::invalidate`].
pub struct Dialog<S: TextSource> {
    atlas: DialogAtlas,
    text: S,
    max_text_width: u32,
    cache: Option<CachedText>,
    /// Bumped whenever the cached image is replaced; the renderer uses it
    /// to skip redundant glyph-texture uploads.
    generation: u64,
}

impl<S: TextSource> Dialog<S> {
    pub fn new(atlas: DialogAtlas, text: S, max_text_width: u32) -> Self {
        Self {
            atlas,
            text,
            max_text_width,
            cache: None,
            generation: 0,
        }
    }

    pub fn atlas(&self) -> &DialogAtlas {
        &self.atlas
    }

    pub fn text_source(&self) -> &S {
        &self.text
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The glyph image the last `draw_text` call used, if any.
    pub fn cached_image(&self) -> Option<&TextImage> {
        self.cache.as_ref().map(|c| &c.image)
    }

    /// Drop the cached glyph image; the next draw re-rasterizes.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Draw one dialogue box with `text` anchored at `(x, y)` top-left.
    ///
    /// No bounds checking on the anchor — a box near the screen edge may
    /// overflow the visible area; clipping is the caller's concern.
    pub fn draw_text(
        &mut self,
        frame: &mut OverlayFrame,
        text: &str,
        x: f32,
        y: f32,
    ) -> Result<(), EngineError> {
        let measured = self.text.measure(text);
        let wrap_width = content_width(measured, self.atlas.tile_w, self.max_text_width);

        let hit = self
            .cache
            .as_ref()
            .is_some_and(|c| c.text == text && c.wrap_width == wrap_width);
        if !hit {
            let image = self.text.rasterize(text, wrap_width);
            self.cache = Some(CachedText {
                text: text.to_owned(),
                wrap_width,
                image,
            });
            self.generation += 1;
        }
        let cached = self.cache.as_ref().expect("cache populated above");

        let layout = DialogLayout::compute(
            wrap_width,
            cached.image.height,
            self.atlas.tile_w,
            self.atlas.tile_h,
        );

        let tw = self.atlas.tile_w as f32;
        let th = self.atlas.tile_h as f32;
        for tile in dialog_tiles(x, y, &layout, self.atlas.tile_w, self.atlas.tile_h) {
            let uv = self.atlas.tile_at(tile.index)?;
            OverlayFrame::push_quad(
                &mut frame.tile_vertices,
                tile.x,
                tile.y,
                tw,
                th,
                uv.uv_min,
                uv.uv_max,
                Color::WHITE,
            );
        }

        if !cached.image.is_empty() {
            OverlayFrame::push_quad(
                &mut frame.text_vertices,
                x + tw,
                y + th,
                cached.image.width as f32,
                cached.image.height as f32,
                [0.0, 0.0],
                [1.0, 1.0],
                TEXT_TINT,
            );
        }

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_width_rounds_up_to_tile() {
        assert_eq!(content_width(1.0, 16, 200), 16);
        assert_eq!(content_width(16.0, 16, 200), 16);
        assert_eq!(content_width(17.0, 16, 200), 32);
    }

    #[test]
    fn content_width_of_zero_is_zero() {
        assert_eq!(content_width(0.0, 16, 200), 0);
    }

    #[test]
    fn content_width_clamps_at_max() {
        assert_eq!(content_width(199.0, 16, 200), 200);
        assert_eq!(content_width(1000.0, 16, 200), 200);
    }

    #[test]
    fn layout_rounds_height_to_tile_rows() {
        let l = DialogLayout::compute(64, 13, 16, 8);
        assert_eq!(l.content_h, 16);
        assert_eq!(l.tiles_high, 2);
        assert_eq!(l.tiles_wide, 4);
    }

    #[test]
    fn clamped_width_gives_thirteen_columns() {
        // 200 px cap on 16 px tiles: 200/16 rounds up to 13.
        let l = DialogLayout::compute(200, 8, 16, 8);
        assert_eq!(l.tiles_wide, 13);
    }

    #[test]
    fn empty_image_gives_zero_rows() {
        let l = DialogLayout::compute(0, 0, 16, 8);
        assert_eq!(l.tiles_wide, 0);
        assert_eq!(l.tiles_high, 0);
        assert_eq!(l.content_h, 0);
    }

    #[test]
    fn tile_counts_match_grid_dimensions() {
        let l = DialogLayout::compute(48, 24, 16, 8);
        let tiles = dialog_tiles(0.0, 0.0, &l, 16, 8);
        let count = |idx: u32| tiles.iter().filter(|t| t.index == idx).count() as u32;

        assert_eq!(count(TILE_BORDER_TOP) + count(TILE_BORDER_BOTTOM), 2 * l.tiles_wide);
        assert_eq!(count(TILE_BORDER_LEFT) + count(TILE_BORDER_RIGHT), 2 * l.tiles_high);
        assert_eq!(count(TILE_FILL), l.tiles_wide * l.tiles_high);
        assert_eq!(count(TILE_INDICATOR), 1);
        let corners = [TILE_CORNER_TL, TILE_CORNER_TR, TILE_CORNER_BL, TILE_CORNER_BR];
        assert!(corners.iter().all(|&c| count(c) == 1));
    }

    #[test]
    fn one_by_one_grid_still_has_full_border() {
        let l = DialogLayout::compute(16, 8, 16, 8);
        assert_eq!((l.tiles_wide, l.tiles_high), (1, 1));
        let tiles = dialog_tiles(0.0, 0.0, &l, 16, 8);
        // 4 corners + 2 borders horizontal + 2 vertical + 1 fill + 1 indicator.
        assert_eq!(tiles.len(), 10);
    }

    #[test]
    fn corner_positions_frame_the_content() {
        let l = DialogLayout::compute(32, 16, 16, 8);
        let tiles = dialog_tiles(100.0, 50.0, &l, 16, 8);
        let at = |idx: u32| tiles.iter().find(|t| t.index == idx).unwrap();

        assert_eq!((at(TILE_CORNER_TL).x, at(TILE_CORNER_TL).y), (100.0, 50.0));
        // Right edge: origin + one border tile + content width.
        assert_eq!((at(TILE_CORNER_TR).x, at(TILE_CORNER_TR).y), (100.0 + 16.0 + 32.0, 50.0));
        // Bottom edge: origin + content height + one border tile.
        assert_eq!((at(TILE_CORNER_BL).x, at(TILE_CORNER_BL).y), (100.0, 50.0 + 16.0 + 8.0));
        assert_eq!(
            (at(TILE_CORNER_BR).x, at(TILE_CORNER_BR).y),
            (100.0 + 48.0, 50.0 + 24.0)
        );
    }

    #[test]
    fn indicator_sits_below_the_bottom_left() {
        let l = DialogLayout::compute(32, 16, 16, 8);
        let tiles = dialog_tiles(10.0, 20.0, &l, 16, 8);
        let arrow = tiles.iter().find(|t| t.index == TILE_INDICATOR).unwrap();
        assert_eq!(arrow.x, 10.0 + 16.0);
        assert_eq!(arrow.y, 20.0 + 16.0 + 2.0 * 8.0 - 1.0);
    }
}

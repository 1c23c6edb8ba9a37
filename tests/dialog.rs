use std::cell::Cell;

use bulle::dialog::{Dialog, DialogLayout, OverlayFrame, content_width, dialog_tiles};
use bulle::renderer::atlas::DialogAtlas;
use bulle::renderer::text::{TextImage, TextSource};
use image::RgbaImage;

// ── Fixtures ─────────────────────────────────────────────────────────────────

const TILE_W: u32 = 16;
const TILE_H: u32 = 8;
const MAX_TEXT_WIDTH: u32 = 200;

fn atlas() -> DialogAtlas {
    DialogAtlas::from_image(RgbaImage::new(4 * TILE_W, 3 * TILE_H), TILE_W, TILE_H).unwrap()
}

/// Deterministic text service: every character advances 8 px, every line
/// is 10 px tall, and wrapped line count is the naive width ratio. Counts
/// rasterize calls so cache behaviour is observable.
struct MonoSource {
    rasterized: Cell<usize>,
}

impl MonoSource {
    fn new() -> Self {
        Self { rasterized: Cell::new(0) }
    }
}

impl TextSource for MonoSource {
    fn measure(&self, text: &str) -> f32 {
        text.chars().count() as f32 * 8.0
    }

    fn rasterize(&self, text: &str, wrap_width: u32) -> TextImage {
        self.rasterized.set(self.rasterized.get() + 1);
        if wrap_width == 0 || text.split_whitespace().next().is_none() {
            return TextImage::empty();
        }
        let lines = (self.measure(text) / wrap_width as f32).ceil().max(1.0) as u32;
        let height = lines * 10;
        TextImage {
            width: wrap_width,
            height,
            data: vec![0; (wrap_width * height) as usize],
        }
    }
}

fn dialog() -> Dialog<MonoSource> {
    Dialog::new(atlas(), MonoSource::new(), MAX_TEXT_WIDTH)
}

fn quad_count(layout: &DialogLayout) -> usize {
    (4 + 2 * layout.tiles_wide + 2 * layout.tiles_high + layout.tiles_wide * layout.tiles_high + 1)
        as usize
}

// ── Width computation ────────────────────────────────────────────────────────

#[test]
fn narrow_text_rounds_up_to_tile_multiple() {
    // "hello" at 8 px/char = 40 px → next tile multiple is 48.
    assert_eq!(content_width(40.0, TILE_W, MAX_TEXT_WIDTH), 48);
}

#[test]
fn width_under_cap_never_exceeds_cap() {
    for chars in 0..25 {
        let w = content_width(chars as f32 * 8.0, TILE_W, MAX_TEXT_WIDTH);
        assert!(w <= MAX_TEXT_WIDTH);
        assert!(w % TILE_W == 0 || w == MAX_TEXT_WIDTH);
    }
}

#[test]
fn wide_text_clamps_exactly_to_cap() {
    assert_eq!(content_width(201.0, TILE_W, MAX_TEXT_WIDTH), 200);
    assert_eq!(content_width(10_000.0, TILE_W, MAX_TEXT_WIDTH), 200);
}

// ── Tile emission counts ─────────────────────────────────────────────────────

#[test]
fn border_and_fill_counts_follow_grid_size() {
    for (content_w, image_h) in [(16, 8), (48, 24), (200, 40), (16, 40)] {
        let layout = DialogLayout::compute(content_w, image_h, TILE_W, TILE_H);
        let tiles = dialog_tiles(0.0, 0.0, &layout, TILE_W, TILE_H);
        assert_eq!(
            tiles.len(),
            quad_count(&layout),
            "layout {layout:?} emitted wrong tile count"
        );
    }
}

#[test]
fn short_text_box_emits_expected_quads() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    // "hi" → 16 px → 1 column; one 10 px line → 16 px → 2 rows.
    d.draw_text(&mut frame, "hi", 0.0, 0.0).unwrap();

    let layout = DialogLayout::compute(16, 10, TILE_W, TILE_H);
    assert_eq!((layout.tiles_wide, layout.tiles_high), (1, 2));
    assert_eq!(frame.tile_vertices.len(), quad_count(&layout) * 6);
    assert_eq!(frame.text_vertices.len(), 6);
}

#[test]
fn long_text_wraps_at_thirteen_columns() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    // 100 chars → 800 px unwrapped → clamped to 200 → 13 columns; the fake
    // rasterizer folds it into 4 lines of 10 px → 40 px → 5 rows.
    let text = "a".repeat(100);
    d.draw_text(&mut frame, &text, 0.0, 0.0).unwrap();

    let layout = DialogLayout::compute(200, 40, TILE_W, TILE_H);
    assert_eq!((layout.tiles_wide, layout.tiles_high), (13, 5));
    assert_eq!(frame.tile_vertices.len(), quad_count(&layout) * 6);
}

#[test]
fn empty_text_draws_corners_and_indicator_only() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    d.draw_text(&mut frame, "", 0.0, 0.0).unwrap();

    // 4 corners + 1 indicator, no borders, no fill, no text quad.
    assert_eq!(frame.tile_vertices.len(), 5 * 6);
    assert!(frame.text_vertices.is_empty());
}

// ── Quad placement ───────────────────────────────────────────────────────────

#[test]
fn text_quad_sits_one_tile_in_from_the_origin() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    d.draw_text(&mut frame, "hi", 100.0, 50.0).unwrap();

    let top_left = frame.text_vertices[0];
    assert_eq!(top_left.position, [100.0 + TILE_W as f32, 50.0 + TILE_H as f32]);
}

#[test]
fn text_quads_are_tinted_and_tiles_are_not() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    d.draw_text(&mut frame, "hi", 0.0, 0.0).unwrap();

    assert!(frame.text_vertices.iter().all(|v| v.color == [0.0, 0.0, 0.0, 1.0]));
    assert!(frame.tile_vertices.iter().all(|v| v.color == [1.0, 1.0, 1.0, 1.0]));
}

#[test]
fn moving_the_anchor_translates_every_quad() {
    let mut d = dialog();
    let mut at_origin = OverlayFrame::new();
    d.draw_text(&mut at_origin, "hi", 0.0, 0.0).unwrap();
    let mut shifted = OverlayFrame::new();
    d.draw_text(&mut shifted, "hi", 5.0, 7.0).unwrap();

    assert_eq!(at_origin.tile_vertices.len(), shifted.tile_vertices.len());
    for (a, b) in at_origin.tile_vertices.iter().zip(&shifted.tile_vertices) {
        assert_eq!([a.position[0] + 5.0, a.position[1] + 7.0], b.position);
        assert_eq!(a.uv, b.uv);
    }
}

// ── Cache behaviour ──────────────────────────────────────────────────────────

#[test]
fn identical_draws_rasterize_once_and_emit_identically() {
    let mut d = dialog();
    let mut first = OverlayFrame::new();
    d.draw_text(&mut first, "same words", 10.0, 10.0).unwrap();
    let mut second = OverlayFrame::new();
    d.draw_text(&mut second, "same words", 10.0, 10.0).unwrap();

    assert_eq!(d.text_source().rasterized.get(), 1, "second draw must hit the cache");
    assert_eq!(first.tile_vertices, second.tile_vertices);
    assert_eq!(first.text_vertices, second.text_vertices);
}

#[test]
fn changed_text_replaces_the_cache_slot() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    d.draw_text(&mut frame, "first", 0.0, 0.0).unwrap();
    let g1 = d.generation();
    d.draw_text(&mut frame, "second text entirely", 0.0, 0.0).unwrap();

    assert_eq!(d.text_source().rasterized.get(), 2);
    assert!(d.generation() > g1, "generation must move with the image");
}

#[test]
fn invalidate_forces_a_rerasterize_of_identical_text() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    d.draw_text(&mut frame, "stable", 0.0, 0.0).unwrap();
    d.invalidate();
    d.draw_text(&mut frame, "stable", 0.0, 0.0).unwrap();

    assert_eq!(d.text_source().rasterized.get(), 2);
}

#[test]
fn cache_hit_does_not_bump_the_generation() {
    let mut d = dialog();
    let mut frame = OverlayFrame::new();
    d.draw_text(&mut frame, "words", 0.0, 0.0).unwrap();
    let g = d.generation();
    d.draw_text(&mut frame, "words", 0.0, 0.0).unwrap();
    assert_eq!(d.generation(), g);
}

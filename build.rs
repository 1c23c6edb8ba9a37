// Generates placeholder art under resources/ so a bare checkout runs:
// the dialogue tile atlas (4×3 grid of 16×8 cells) and an avatar sprite.
// Existing files are never overwritten — drop in real art to replace them.
// The font face cannot be generated; a cargo warning points at the gap.

use image::{Rgba, RgbaImage};
use std::path::Path;

const TILE_W: u32 = 16;
const TILE_H: u32 = 8;

const FRAME: Rgba<u8> = Rgba([0x2B, 0x26, 0x1E, 0xFF]); // dark frame line
const PAPER: Rgba<u8> = Rgba([0xEF, 0xE4, 0xC8, 0xFF]); // parchment fill

/// Edges of a cell that carry the frame line.
#[derive(Copy, Clone, Default)]
struct Edges {
    top: bool,
    bottom: bool,
    left: bool,
    right: bool,
}

fn paint_cell(img: &mut RgbaImage, col: u32, row: u32, edges: Edges) {
    let x0 = col * TILE_W;
    let y0 = row * TILE_H;
    for dy in 0..TILE_H {
        for dx in 0..TILE_W {
            let on_edge = (edges.top && dy == 0)
                || (edges.bottom && dy == TILE_H - 1)
                || (edges.left && dx == 0)
                || (edges.right && dx == TILE_W - 1);
            let color = if on_edge { FRAME } else { PAPER };
            img.put_pixel(x0 + dx, y0 + dy, color);
        }
    }
}

fn paint_indicator(img: &mut RgbaImage, col: u32, row: u32) {
    let x0 = col * TILE_W;
    let y0 = row * TILE_H;
    // Downward wedge, widest at the top, centred in the cell.
    for dy in 0..TILE_H {
        let half = (TILE_H - dy) as i32;
        for dx in 0..TILE_W {
            let centered = dx as i32 - TILE_W as i32 / 2;
            let color = if centered.abs() < half { FRAME } else { Rgba([0, 0, 0, 0]) };
            img.put_pixel(x0 + dx, y0 + dy, color);
        }
    }
}

fn draw_dialog_atlas() -> RgbaImage {
    let mut img = RgbaImage::new(4 * TILE_W, 3 * TILE_H);

    // Row 0: TL corner, top border, TR corner, (unused).
    paint_cell(&mut img, 0, 0, Edges { top: true, left: true, ..Default::default() });
    paint_cell(&mut img, 1, 0, Edges { top: true, ..Default::default() });
    paint_cell(&mut img, 2, 0, Edges { top: true, right: true, ..Default::default() });

    // Row 1: left border, fill, right border, (unused).
    paint_cell(&mut img, 0, 1, Edges { left: true, ..Default::default() });
    paint_cell(&mut img, 1, 1, Edges::default());
    paint_cell(&mut img, 2, 1, Edges { right: true, ..Default::default() });

    // Row 2: BL corner, bottom border, BR corner, indicator.
    paint_cell(&mut img, 0, 2, Edges { bottom: true, left: true, ..Default::default() });
    paint_cell(&mut img, 1, 2, Edges { bottom: true, ..Default::default() });
    paint_cell(&mut img, 2, 2, Edges { bottom: true, right: true, ..Default::default() });
    paint_indicator(&mut img, 3, 2);

    img
}

fn draw_avatar(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let body = Rgba([0xF5, 0xD0, 0x30, 0xFF]);
    let dark = Rgba([0x80, 0x60, 0x00, 0xFF]);
    let eye = Rgba([0x10, 0x10, 0x10, 0xFF]);

    for y in 0..height {
        for x in 0..width {
            img.put_pixel(x, y, body);
        }
    }
    // Thin dark border
    for x in 0..width { img.put_pixel(x, 0, dark); img.put_pixel(x, height - 1, dark); }
    for y in 0..height { img.put_pixel(0, y, dark); img.put_pixel(width - 1, y, dark); }
    // Two pixel eyes at ~1/3 height
    let ey = height / 3;
    let ex1 = width / 4;
    let ex2 = 3 * width / 4;
    if ex1 < width && ey < height { img.put_pixel(ex1, ey, eye); }
    if ex2 < width && ey < height { img.put_pixel(ex2, ey, eye); }
    img
}

fn save_if_missing(path: &str, img: RgbaImage) {
    if !Path::new(path).exists() {
        img.save(path)
            .unwrap_or_else(|e| eprintln!("build: could not save {path}: {e}"));
    }
}

fn main() {
    std::fs::create_dir_all("resources").expect("build: failed to create resources/");

    save_if_missing("resources/dialog.png", draw_dialog_atlas());
    save_if_missing("resources/avatar.png", draw_avatar(16, 24));

    if !Path::new("resources/retro.ttf").exists() {
        println!(
            "cargo:warning=resources/retro.ttf is missing; the demo binary \
             needs a TTF face there (any pixel font works)"
        );
    }

    println!("cargo:rerun-if-changed=build.rs");
}

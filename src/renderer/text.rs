use std::ops::Range;

use fontdue::{Font, FontSettings};

use crate::error::EngineError;

// ── TextImage ────────────────────────────────────────────────────────────────

/// A rasterized block of text: 8-bit coverage, row-major, y-down.
/// The renderer tints it at draw time, so no colour is stored here.
#[derive(Clone, Debug, PartialEq)]
pub struct TextImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TextImage {
    pub fn empty() -> Self {
        Self { width: 0, height: 0, data: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ── TextSource ───────────────────────────────────────────────────────────────

/// Measurement + rasterization boundary consumed by the dialogue box.
///
/// Rasterization word-wraps at `wrap_width` pixels with justified
/// alignment. Neither operation can fail once the implementation is
/// constructed; font problems surface at load time.
pub trait TextSource {
    /// Unwrapped pixel width of `text` (sum of glyph advances).
    fn measure(&self, text: &str) -> f32;

    /// Rasterize `text` into a `wrap_width`-wide coverage image.
    /// Empty text or a zero wrap width yields a 0×0 image.
    fn rasterize(&self, text: &str, wrap_width: u32) -> TextImage;
}

// ── Line breaking (pure, font-free) ──────────────────────────────────────────

/// Greedy line breaker over pre-measured word widths.
///
/// Returns one index `Range` per line. A word wider than `wrap` is placed
/// alone on its own line (never split mid-word); the rasterizer clips it.
pub fn break_lines(word_widths: &[f32], space: f32, wrap: f32) -> Vec<Range<usize>> {
    let mut lines: Vec<Range<usize>> = Vec::new();
    let mut start = 0usize;
    let mut line_w = 0.0f32;

    for (i, &w) in word_widths.iter().enumerate() {
        if i > start && line_w + space + w > wrap {
            lines.push(start..i);
            start = i;
            line_w = w;
        } else {
            line_w += if i > start { space + w } else { w };
        }
    }
    if start < word_widths.len() {
        lines.push(start..word_widths.len());
    }
    lines
}

/// Inter-word gap for a justified line.
///
/// Every line except the last stretches its gaps so the words span `wrap`
/// exactly; the last line, single-word lines, and over-full lines keep the
/// natural space width.
pub fn justified_gap(natural: f32, gaps: usize, space: f32, wrap: f32, is_last: bool) -> f32 {
    if is_last || gaps == 0 || natural > wrap {
        return space;
    }
    space + (wrap - natural) / gaps as f32
}

// ── FontPainter ──────────────────────────────────────────────────────────────

/// `TextSource` backed by a fontdue face at a fixed pixel size.
pub struct FontPainter {
    font: Font,
    px: f32,
    ascent: f32,
    line_height: f32,
    space_advance: f32,
}

impl FontPainter {
    /// Parse a TTF/OTF face and fix the rasterization size. Fails with
    /// `FontLoad` when the bytes are not a parseable font or the face
    /// carries no horizontal line metrics.
    pub fn new(font_data: Vec<u8>, px: f32) -> Result<Self, EngineError> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| EngineError::FontLoad(e.to_string()))?;
        let metrics = font
            .horizontal_line_metrics(px)
            .ok_or_else(|| EngineError::FontLoad("face has no horizontal metrics".into()))?;
        let space_advance = font.metrics(' ', px).advance_width;
        Ok(Self {
            font,
            px,
            ascent: metrics.ascent,
            line_height: metrics.new_line_size,
            space_advance,
        })
    }

    pub fn from_file(path: &str, px: f32) -> Result<Self, EngineError> {
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::FontLoad(format!("font {path}: {e}")))?;
        Self::new(bytes, px)
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Blit one word's glyphs into `img` starting at pen position `pen_x`
    /// on the given baseline row. Out-of-bounds pixels are clipped.
    fn blit_word(&self, img: &mut TextImage, word: &str, pen_x: f32, baseline: f32) {
        let mut pen = pen_x;
        for ch in word.chars() {
            let (m, bitmap) = self.font.rasterize(ch, self.px);
            let left = (pen + m.xmin as f32).round() as i32;
            let top = (baseline - (m.ymin + m.height as i32) as f32).round() as i32;
            for row in 0..m.height {
                for col in 0..m.width {
                    let x = left + col as i32;
                    let y = top + row as i32;
                    if x < 0 || y < 0 || x >= img.width as i32 || y >= img.height as i32 {
                        continue;
                    }
                    let dst = (y as u32 * img.width + x as u32) as usize;
                    let v = bitmap[row * m.width + col];
                    img.data[dst] = img.data[dst].max(v);
                }
            }
            pen += m.advance_width;
        }
    }
}

impl TextSource for FontPainter {
    fn measure(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, self.px).advance_width)
            .sum()
    }

    fn rasterize(&self, text: &str, wrap_width: u32) -> TextImage {
        if wrap_width == 0 {
            return TextImage::empty();
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return TextImage::empty();
        }

        let widths: Vec<f32> = words.iter().map(|w| self.measure(w)).collect();
        let wrap = wrap_width as f32;
        let lines = break_lines(&widths, self.space_advance, wrap);

        let height = (lines.len() as f32 * self.line_height).ceil() as u32;
        let mut img = TextImage {
            width: wrap_width,
            height,
            data: vec![0; (wrap_width * height) as usize],
        };

        let last = lines.len() - 1;
        for (row, range) in lines.iter().enumerate() {
            let gaps = range.len() - 1;
            let natural: f32 =
                widths[range.clone()].iter().sum::<f32>() + gaps as f32 * self.space_advance;
            let gap = justified_gap(natural, gaps, self.space_advance, wrap, row == last);

            let baseline = row as f32 * self.line_height + self.ascent;
            let mut pen = 0.0f32;
            for i in range.clone() {
                self.blit_word(&mut img, words[i], pen, baseline);
                pen += widths[i] + gap;
            }
        }
        img
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── break_lines ───────────────────────────────────────────────────────

    #[test]
    fn no_words_no_lines() {
        assert!(break_lines(&[], 4.0, 100.0).is_empty());
    }

    #[test]
    fn all_words_fit_on_one_line() {
        // 30 + 4 + 30 + 4 + 30 = 98 ≤ 100.
        let lines = break_lines(&[30.0, 30.0, 30.0], 4.0, 100.0);
        assert_eq!(lines, vec![0..3]);
    }

    #[test]
    fn breaks_when_next_word_would_overflow() {
        // 60 + 4 + 60 = 124 > 100 → two lines.
        let lines = break_lines(&[60.0, 60.0], 4.0, 100.0);
        assert_eq!(lines, vec![0..1, 1..2]);
    }

    #[test]
    fn exact_fit_stays_on_the_line() {
        // 48 + 4 + 48 = 100, not over.
        let lines = break_lines(&[48.0, 48.0], 4.0, 100.0);
        assert_eq!(lines, vec![0..2]);
    }

    #[test]
    fn over_wide_word_gets_its_own_line() {
        let lines = break_lines(&[300.0, 20.0], 4.0, 100.0);
        assert_eq!(lines, vec![0..1, 1..2]);
    }

    #[test]
    fn every_word_lands_in_exactly_one_line() {
        let widths = [40.0, 55.0, 10.0, 90.0, 25.0, 25.0, 60.0];
        let lines = break_lines(&widths, 5.0, 100.0);
        let covered: usize = lines.iter().map(|r| r.len()).sum();
        assert_eq!(covered, widths.len());
        for pair in lines.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "ranges must be contiguous");
        }
    }

    #[test]
    fn no_broken_line_exceeds_wrap_unless_single_word() {
        let widths = [40.0, 55.0, 10.0, 90.0, 25.0, 25.0, 60.0, 130.0];
        let space = 5.0;
        let wrap = 100.0;
        for r in break_lines(&widths, space, wrap) {
            let natural: f32 =
                widths[r.clone()].iter().sum::<f32>() + (r.len() - 1) as f32 * space;
            assert!(
                natural <= wrap || r.len() == 1,
                "line {r:?} is {natural}px wide"
            );
        }
    }

    // ── justified_gap ─────────────────────────────────────────────────────

    #[test]
    fn middle_line_gaps_stretch_to_fill_wrap() {
        // Two gaps, 30px of slack → each gap grows by 15.
        let gap = justified_gap(170.0, 2, 4.0, 200.0, false);
        assert_eq!(gap, 19.0);
    }

    #[test]
    fn last_line_keeps_natural_spacing() {
        assert_eq!(justified_gap(170.0, 2, 4.0, 200.0, true), 4.0);
    }

    #[test]
    fn single_word_line_keeps_natural_spacing() {
        assert_eq!(justified_gap(80.0, 0, 4.0, 200.0, false), 4.0);
    }

    #[test]
    fn over_full_line_never_shrinks_gaps() {
        // An over-wide single-word line measured past wrap must not go negative.
        assert_eq!(justified_gap(250.0, 1, 4.0, 200.0, false), 4.0);
    }

    #[test]
    fn stretched_gap_never_below_natural() {
        for slack in [0.0f32, 1.0, 13.0, 60.0] {
            let gap = justified_gap(200.0 - slack, 3, 4.0, 200.0, false);
            assert!(gap >= 4.0);
        }
    }

    // ── TextImage ─────────────────────────────────────────────────────────

    #[test]
    fn empty_image_is_empty() {
        assert!(TextImage::empty().is_empty());
        assert_eq!(TextImage::empty().width, 0);
    }
}

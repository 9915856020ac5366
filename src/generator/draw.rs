//! Pixel-level helpers shared by the compositor and the placeholder
//! renderer: alpha-blended glyph drawing, advance-based measurement,
//! rectangle fills, image overlay and styled-run word wrapping.

use image::{ImageBuffer, Rgba};
use rusttype::{point, Font, Scale};

use crate::layout::Rect;
use crate::markup::{RunColor, StyledRun};

pub type Canvas = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Advance width of `text` at `px`, including trailing spaces. Used for
/// caret positioning, so glyph bounding boxes are not enough.
pub fn text_advance_width(font: &Font<'_>, px: f32, text: &str, letter_spacing: f32) -> f32 {
    let scale = Scale::uniform(px);
    let mut width = 0.0;
    let mut count = 0usize;
    for ch in text.chars() {
        width += font.glyph(ch).scaled(scale).h_metrics().advance_width;
        count += 1;
    }
    if count > 1 {
        width += letter_spacing * (count - 1) as f32;
    }
    width
}

/// Draw one run at the given baseline and return the caret after it.
pub fn draw_text_run(
    img: &mut Canvas,
    font: &Font<'_>,
    px: f32,
    caret_x: f32,
    baseline_y: f32,
    color: Rgba<u8>,
    text: &str,
    letter_spacing: f32,
) -> f32 {
    let scale = Scale::uniform(px);
    let mut caret = caret_x;

    for ch in text.chars() {
        let glyph = font.glyph(ch).scaled(scale).positioned(point(caret, baseline_y));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let x = gx as i32 + bb.min.x;
                let y = gy as i32 + bb.min.y;
                if x < 0 || y < 0 {
                    return;
                }
                let (x, y) = (x as u32, y as u32);
                if x >= img.width() || y >= img.height() {
                    return;
                }
                let a = (v * 255.0) as u8;
                if a == 0 {
                    return;
                }
                let dst = img.get_pixel_mut(x, y);
                // src over dst
                let sa = a as f32 / 255.0;
                let inv = 1.0 - sa;
                dst.0[0] = (color.0[0] as f32 * sa + dst.0[0] as f32 * inv) as u8;
                dst.0[1] = (color.0[1] as f32 * sa + dst.0[1] as f32 * inv) as u8;
                dst.0[2] = (color.0[2] as f32 * sa + dst.0[2] as f32 * inv) as u8;
                dst.0[3] = 255;
            });
        }
        caret += glyph.unpositioned().h_metrics().advance_width + letter_spacing;
    }

    caret
}

pub fn fill_rect(img: &mut Canvas, rect: Rect, color: Rgba<u8>) {
    let x1 = (rect.x + rect.w).min(img.width());
    let y1 = (rect.y + rect.h).min(img.height());
    for y in rect.y..y1 {
        for x in rect.x..x1 {
            img.put_pixel(x, y, color);
        }
    }
}

pub fn overlay_alpha(base: &mut Canvas, over: &Canvas, x: u32, y: u32) {
    for oy in 0..over.height() {
        for ox in 0..over.width() {
            let p = over.get_pixel(ox, oy);
            let a = p.0[3] as f32 / 255.0;
            if a <= 0.0 {
                continue;
            }
            let bx = x + ox;
            let by = y + oy;
            if bx >= base.width() || by >= base.height() {
                continue;
            }
            let dst = base.get_pixel_mut(bx, by);
            let inv = 1.0 - a;
            dst.0[0] = (p.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
            dst.0[1] = (p.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
            dst.0[2] = (p.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
            dst.0[3] = 255;
        }
    }
}

/// One visual word: colored fragments with no whitespace inside.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Word {
    fragments: Vec<StyledRun>,
}

impl Word {
    fn width(&self, font: &Font<'_>, px: f32, letter_spacing: f32) -> f32 {
        self.fragments
            .iter()
            .map(|f| text_advance_width(font, px, &f.text, letter_spacing))
            .sum()
    }
}

/// Greedy word wrap of a parsed line against `max_width`, measured with
/// real advance widths. Words are never split; a single word wider than
/// the limit still gets its own line. Inter-word whitespace is
/// normalized to single spaces.
pub fn wrap_runs(
    runs: &[StyledRun],
    font: &Font<'_>,
    px: f32,
    max_width: f32,
    letter_spacing: f32,
) -> Vec<Vec<StyledRun>> {
    let words = split_words(runs);
    if words.is_empty() {
        return Vec::new();
    }

    let space_w = text_advance_width(font, px, " ", letter_spacing);
    let mut lines: Vec<Vec<StyledRun>> = Vec::new();
    let mut line: Vec<StyledRun> = Vec::new();
    let mut line_w = 0.0f32;

    for word in words {
        let word_w = word.width(font, px, letter_spacing);
        if line.is_empty() {
            append_word(&mut line, &word, false);
            line_w = word_w;
        } else if line_w + space_w + word_w <= max_width {
            append_word(&mut line, &word, true);
            line_w += space_w + word_w;
        } else {
            lines.push(std::mem::take(&mut line));
            append_word(&mut line, &word, false);
            line_w = word_w;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

fn split_words(runs: &[StyledRun]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Vec<StyledRun> = Vec::new();

    for run in runs {
        let mut fragment = String::new();
        for ch in run.text.chars() {
            if ch.is_whitespace() {
                flush_fragment(&mut current, &mut fragment, run.color);
                if !current.is_empty() {
                    words.push(Word { fragments: std::mem::take(&mut current) });
                }
            } else {
                fragment.push(ch);
            }
        }
        flush_fragment(&mut current, &mut fragment, run.color);
    }
    if !current.is_empty() {
        words.push(Word { fragments: current });
    }

    words
}

fn flush_fragment(current: &mut Vec<StyledRun>, fragment: &mut String, color: RunColor) {
    if fragment.is_empty() {
        return;
    }
    let text = std::mem::take(fragment);
    match current.last_mut() {
        Some(last) if last.color == color => last.text.push_str(&text),
        _ => current.push(StyledRun { text, color }),
    }
}

fn append_word(line: &mut Vec<StyledRun>, word: &Word, leading_space: bool) {
    for (i, frag) in word.fragments.iter().enumerate() {
        let mut text = String::new();
        if leading_space && i == 0 {
            text.push(' ');
        }
        text.push_str(&frag.text);
        match line.last_mut() {
            Some(last) if last.color == frag.color => last.text.push_str(&text),
            _ => line.push(StyledRun { text, color: frag.color }),
        }
    }
}

//! Per-format geometry for the two ad canvases.
//!
//! Everything here is a fixed design constant except the photo crop
//! rectangle, which adapts to the source image so the photo is
//! center-cropped to the target aspect ratio before scaling.

use image::Rgba;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::markup::RunColor;

pub const BRAND_BLUE: Rgba<u8> = Rgba([0x1A, 0x36, 0x5D, 0xFF]);
pub const BRAND_RED: Rgba<u8> = Rgba([0xD3, 0x2F, 0x2F, 0xFF]);
pub const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdFormat {
    Square,
    Story,
}

impl AdFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "square" => Some(AdFormat::Square),
            "story" => Some(AdFormat::Story),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdFormat::Square => f.write_str("square"),
            AdFormat::Story => f.write_str("story"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeStyle {
    /// Fixed-size brand text block, fitted to the badge rect.
    Static,
    /// Later-revision variant: fixed height, width follows the asset's
    /// own aspect ratio.
    Cartouche,
}

impl BadgeStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Some(BadgeStyle::Static),
            "cartouche" => Some(BadgeStyle::Cartouche),
            _ => None,
        }
    }

    pub fn asset_name(self) -> &'static str {
        match self {
            BadgeStyle::Static => "text-block.png",
            BadgeStyle::Cartouche => "cartouche.png",
        }
    }
}

/// Deployment-level rendering choices. The revision history disagreed on
/// these, so they are parameters of a single engine rather than forks.
#[derive(Clone, Copy, Debug)]
pub struct StyleConfig {
    /// Default color of the third square-format line.
    pub square_line3: RunColor,
    pub badge: BadgeStyle,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            square_line3: RunColor::Red,
            badge: BadgeStyle::Static,
        }
    }
}

impl StyleConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(c) = std::env::var("SQUARE_LINE3_COLOR").ok().and_then(|s| RunColor::parse(&s)) {
            cfg.square_line3 = c;
        }
        if let Some(b) = std::env::var("BADGE_STYLE").ok().and_then(|s| BadgeStyle::parse(&s)) {
            cfg.badge = b;
        }
        cfg
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub rect: Rect,
    pub color: Rgba<u8>,
}

/// Geometry and styling constants for one output format. Built fresh per
/// render call; renders never share mutable state.
#[derive(Clone, Debug)]
pub struct FormatSpec {
    pub format: AdFormat,
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
    /// White section reserved for text under the photo.
    pub band: Rect,
    pub photo: Rect,
    pub rules: [Rule; 2],
    pub badge: Rect,
    pub badge_style: BadgeStyle,
    pub qr: Rect,
    pub text_x: u32,
    pub first_baseline: u32,
    pub line_pitch: u32,
    pub text_px: f32,
    pub max_text_width: f32,
    pub line_defaults: [RunColor; 3],
}

pub fn layout_for(format: AdFormat, style: &StyleConfig) -> FormatSpec {
    match format {
        AdFormat::Square => FormatSpec {
            format,
            width: 1080,
            height: 1080,
            background: BRAND_BLUE,
            band: Rect::new(0, 720, 1080, 360),
            photo: Rect::new(0, 0, 1080, 720),
            rules: [
                Rule { rect: Rect::new(0, 720, 1080, 6), color: BRAND_BLUE },
                Rule { rect: Rect::new(60, 756, 160, 10), color: BRAND_RED },
            ],
            badge: Rect::new(800, 930, 220, 110),
            badge_style: style.badge,
            qr: Rect::new(930, 760, 110, 110),
            text_x: 60,
            first_baseline: 840,
            line_pitch: 78,
            text_px: 54.0,
            max_text_width: 840.0,
            line_defaults: [RunColor::Blue, RunColor::Blue, style.square_line3],
        },
        AdFormat::Story => FormatSpec {
            format,
            width: 1080,
            height: 1920,
            background: BRAND_BLUE,
            band: Rect::new(0, 1240, 1080, 680),
            photo: Rect::new(0, 0, 1080, 1240),
            rules: [
                Rule { rect: Rect::new(0, 1240, 1080, 8), color: BRAND_BLUE },
                Rule { rect: Rect::new(60, 1280, 200, 12), color: BRAND_RED },
            ],
            badge: Rect::new(60, 1700, 260, 130),
            badge_style: style.badge,
            qr: Rect::new(880, 1700, 140, 140),
            text_x: 60,
            first_baseline: 1390,
            line_pitch: 96,
            text_px: 64.0,
            max_text_width: 960.0,
            line_defaults: [RunColor::Red, RunColor::Blue, RunColor::Blue],
        },
    }
}

/// Centered crop rectangle bringing `src` to the aspect ratio of `dst`.
///
/// If the source is wider than the target aspect, width is cropped to
/// `src_h * target_aspect`; otherwise height is cropped to
/// `src_w / target_aspect`. The result never distorts aspect ratio.
pub fn center_crop_rect(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Rect {
    if src_w == 0 || src_h == 0 {
        return Rect::new(0, 0, src_w.max(1), src_h.max(1));
    }

    let target_aspect = dst_w as f32 / dst_h as f32;
    let src_aspect = src_w as f32 / src_h as f32;

    let (crop_w, crop_h) = if src_aspect > target_aspect {
        // too wide
        let ch = src_h;
        let cw = (ch as f32 * target_aspect).round().max(1.0) as u32;
        (cw.min(src_w), ch)
    } else {
        // too tall
        let cw = src_w;
        let ch = (cw as f32 / target_aspect).round().max(1.0) as u32;
        (cw, ch.min(src_h))
    };

    let left = (src_w - crop_w) / 2;
    let top = (src_h - crop_h) / 2;
    Rect::new(left, top, crop_w, crop_h)
}

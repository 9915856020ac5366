//! Fixed z-order compositing of one ad format.
//!
//! Draw order: background band + white section, cropped listing photo,
//! decorative rules, badge, QR code, styled text lines. Decorative
//! elements degrade individually (logged skip); only PNG encoding can
//! fail the render.

use image::{imageops, DynamicImage, GenericImageView, ImageEncoder, Rgba};
use rusttype::Font;
use tracing::warn;

use crate::assets::{AssetError, AssetResolver};
use crate::layout::{self, BadgeStyle, FormatSpec};
use crate::markup::{self, RunColor};

use super::draw::{self, Canvas};
use super::{GenError, RenderContext, TextBlock3};

/// Composite one format to encoded PNG bytes. Pure function of its
/// inputs plus the resolved assets and font in `ctx`.
pub fn render(
    photo: &Canvas,
    text: Option<&TextBlock3>,
    spec: &FormatSpec,
    ctx: &RenderContext,
) -> Result<Vec<u8>, GenError> {
    let mut canvas = Canvas::from_pixel(spec.width, spec.height, spec.background);
    draw::fill_rect(&mut canvas, spec.band, layout::WHITE);

    draw_photo(&mut canvas, photo, spec);

    for rule in &spec.rules {
        draw::fill_rect(&mut canvas, rule.rect, rule.color);
    }

    draw_badge(&mut canvas, ctx, spec);
    draw_qr(&mut canvas, ctx, spec);

    if let Some(block) = text {
        draw_text_block(&mut canvas, block, spec, ctx);
    }

    let mut buf = Vec::new();
    let enc = image::codecs::png::PngEncoder::new(&mut buf);
    enc.write_image(
        &canvas,
        canvas.width(),
        canvas.height(),
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|e| GenError::Image(e.to_string()))?;
    Ok(buf)
}

/// Center-crop the photo to the slot's aspect ratio, scale, overlay.
fn draw_photo(canvas: &mut Canvas, photo: &Canvas, spec: &FormatSpec) {
    let crop = layout::center_crop_rect(photo.width(), photo.height(), spec.photo.w, spec.photo.h);
    let cropped = imageops::crop_imm(photo, crop.x, crop.y, crop.w, crop.h).to_image();
    let scaled = imageops::resize(
        &cropped,
        spec.photo.w,
        spec.photo.h,
        imageops::FilterType::Lanczos3,
    );
    draw::overlay_alpha(canvas, &scaled, spec.photo.x, spec.photo.y);
}

fn draw_badge(canvas: &mut Canvas, ctx: &RenderContext, spec: &FormatSpec) {
    let name = spec.badge_style.asset_name();
    let Some(asset) = load_asset_image(&ctx.assets, name) else {
        return;
    };
    let rgba = match spec.badge_style {
        BadgeStyle::Static => imageops::resize(
            &asset.to_rgba8(),
            spec.badge.w,
            spec.badge.h,
            imageops::FilterType::Lanczos3,
        ),
        BadgeStyle::Cartouche => {
            // fixed height, width follows the artwork's own aspect
            let (aw, ah) = (asset.width().max(1), asset.height().max(1));
            let w = ((aw as f32 / ah as f32) * spec.badge.h as f32).round().max(1.0) as u32;
            imageops::resize(&asset.to_rgba8(), w, spec.badge.h, imageops::FilterType::Lanczos3)
        }
    };
    draw::overlay_alpha(canvas, &rgba, spec.badge.x, spec.badge.y);
}

fn draw_qr(canvas: &mut Canvas, ctx: &RenderContext, spec: &FormatSpec) {
    let Some(asset) = load_asset_image(&ctx.assets, "qr-code.png") else {
        return;
    };
    let rgba = imageops::resize(
        &asset.to_rgba8(),
        spec.qr.w,
        spec.qr.h,
        imageops::FilterType::Lanczos3,
    );
    draw::overlay_alpha(canvas, &rgba, spec.qr.x, spec.qr.y);
}

fn load_asset_image(resolver: &AssetResolver, name: &str) -> Option<DynamicImage> {
    match resolver.resolve(name) {
        Ok(bytes) => match image::load_from_memory(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!(asset = name, error = %e, "asset did not decode, skipping");
                None
            }
        },
        Err(AssetError::Missing(_)) => {
            warn!(asset = name, "asset missing, skipping");
            None
        }
        Err(e) => {
            warn!(asset = name, error = %e, "asset unreadable, skipping");
            None
        }
    }
}

/// Draw the operator lines. Each present line owns its fixed baseline
/// slot; wrapped continuations spill into following slots only while
/// those are not owned by a later present line, and anything past the
/// last slot is dropped. Absent lines draw nothing at all.
fn draw_text_block(canvas: &mut Canvas, block: &TextBlock3, spec: &FormatSpec, ctx: &RenderContext) {
    let lines = block.lines();
    if lines.iter().all(Option::is_none) {
        return;
    }

    let Some(font) = ctx.font.as_deref() else {
        warn!("no font registered, skipping text lines");
        return;
    };

    let present = [lines[0].is_some(), lines[1].is_some(), lines[2].is_some()];

    for (i, raw) in lines.iter().enumerate() {
        let Some(raw) = raw else { continue };
        let upper = markup::uppercase_for_display(raw);
        let runs = markup::parse_line(&upper, spec.line_defaults[i]);
        let visual = draw::wrap_runs(&runs, font, spec.text_px, spec.max_text_width, 0.0);

        let mut slot = i;
        for vline in &visual {
            if slot >= present.len() || (slot > i && present[slot]) {
                break;
            }
            let baseline = (spec.first_baseline + slot as u32 * spec.line_pitch) as f32;
            let mut caret = spec.text_x as f32;
            for run in vline {
                caret = draw::draw_text_run(
                    canvas,
                    font,
                    spec.text_px,
                    caret,
                    baseline,
                    color_rgba(run.color),
                    &run.text,
                    0.0,
                );
            }
            slot += 1;
        }
    }
}

fn color_rgba(color: RunColor) -> Rgba<u8> {
    match color {
        RunColor::Blue => layout::BRAND_BLUE,
        RunColor::Red => layout::BRAND_RED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts;
    use crate::layout::{layout_for, AdFormat, StyleConfig};
    use crate::photo::placeholder;
    use std::sync::Arc;

    fn empty_assets() -> AssetResolver {
        AssetResolver::new(vec![std::env::temp_dir().join("adgen-compositor-none")])
    }

    fn ctx() -> RenderContext {
        let assets = empty_assets();
        let font = fonts::ensure_display_font(&assets);
        RenderContext {
            assets,
            font,
            style: StyleConfig::default(),
        }
    }

    fn decode(bytes: &[u8]) -> Canvas {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn renders_full_canvas_without_assets_or_photo() {
        let ctx = ctx();
        let spec = layout_for(AdFormat::Square, &ctx.style);
        let photo = placeholder(None);
        let bytes = render(&photo, None, &spec, &ctx).unwrap();
        let img = decode(&bytes);
        assert_eq!(img.dimensions(), (1080, 1080));
        // photo slot carries the placeholder fill
        assert_eq!(img.get_pixel(540, 300).0[..3], [0xE2, 0xE8, 0xF0]);
    }

    #[test]
    fn story_canvas_is_portrait() {
        let ctx = ctx();
        let spec = layout_for(AdFormat::Story, &ctx.style);
        let photo = placeholder(None);
        let bytes = render(&photo, None, &spec, &ctx).unwrap();
        assert_eq!(decode(&bytes).dimensions(), (1080, 1920));
    }

    #[test]
    fn render_is_deterministic() {
        let ctx = ctx();
        let spec = layout_for(AdFormat::Square, &ctx.style);
        let photo = placeholder(ctx.font.as_deref());
        let block = TextBlock3 {
            line1: Some("sea view [[villa]]".into()),
            line2: None,
            line3: Some("red:now".into()),
        };
        let a = render(&photo, Some(&block), &spec, &ctx).unwrap();
        let b = render(&photo, Some(&block), &spec, &ctx).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_lines_leave_text_band_blank() {
        let ctx = ctx();
        let spec = layout_for(AdFormat::Square, &ctx.style);
        let photo = placeholder(None);
        let block = TextBlock3 {
            line1: Some(String::new()),
            line2: Some("   ".into()),
            line3: None,
        };
        let bytes = render(&photo, Some(&block), &spec, &ctx).unwrap();
        let img = decode(&bytes);
        // sample the text area, below the rules and clear of badge/qr
        for y in (780..1070).step_by(7) {
            for x in (20..780).step_by(11) {
                assert_eq!(img.get_pixel(x, y).0[..3], [0xFF, 0xFF, 0xFF], "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn operator_line_marks_the_band() {
        let ctx = ctx();
        let Some(_) = ctx.font.as_deref() else {
            return; // no usable font on this host
        };
        let spec = layout_for(AdFormat::Square, &ctx.style);
        let photo = placeholder(None);
        let block = TextBlock3 {
            line1: Some("EXCLUSIVE OFFER".into()),
            line2: None,
            line3: None,
        };
        let bytes = render(&photo, Some(&block), &spec, &ctx).unwrap();
        let img = decode(&bytes);
        let touched = (790..1010)
            .flat_map(|y| (60..900).map(move |x| (x, y)))
            .any(|(x, y)| img.get_pixel(x, y).0[..3] != [0xFF, 0xFF, 0xFF]);
        assert!(touched, "expected text pixels in the band");
    }

    #[test]
    fn qr_and_badge_draw_when_assets_exist() {
        let dir = tempfile::tempdir().unwrap();
        // tiny solid markers stand in for the real artwork
        for (name, color) in [("qr-code.png", [0u8, 0, 0]), ("text-block.png", [10, 20, 30])] {
            let img = Canvas::from_pixel(4, 4, Rgba([color[0], color[1], color[2], 255]));
            let mut png = Vec::new();
            image::codecs::png::PngEncoder::new(&mut png)
                .write_image(&img, 4, 4, image::ExtendedColorType::Rgba8)
                .unwrap();
            std::fs::write(dir.path().join(name), png).unwrap();
        }

        let assets = AssetResolver::new(vec![dir.path().to_path_buf()]);
        let ctx = RenderContext {
            font: fonts::ensure_display_font(&assets),
            assets,
            style: StyleConfig::default(),
        };
        let spec = layout_for(AdFormat::Square, &ctx.style);
        let photo = placeholder(None);
        let bytes = render(&photo, None, &spec, &ctx).unwrap();
        let img = decode(&bytes);

        let qr_center = img.get_pixel(spec.qr.x + spec.qr.w / 2, spec.qr.y + spec.qr.h / 2);
        assert_eq!(qr_center.0[..3], [0, 0, 0]);
        let badge_center =
            img.get_pixel(spec.badge.x + spec.badge.w / 2, spec.badge.y + spec.badge.h / 2);
        assert_eq!(badge_center.0[..3], [10, 20, 30]);
    }

    #[test]
    fn wrapped_line_defers_to_owned_slot() {
        let ctx = ctx();
        let Some(font) = ctx.font.as_deref() else {
            return;
        };
        // long first line wraps, but line 2 owns slot 1 so the
        // continuation is dropped rather than overdrawn
        let spec = layout_for(AdFormat::Square, &ctx.style);
        let long = "AAAA ".repeat(12);
        let upper = markup::uppercase_for_display(&long);
        let runs = markup::parse_line(&upper, RunColor::Blue);
        let visual = draw::wrap_runs(&runs, font, spec.text_px, spec.max_text_width, 0.0);
        assert!(visual.len() > 1, "test line must wrap");

        let block = TextBlock3 {
            line1: Some(long),
            line2: Some("SECOND".into()),
            line3: None,
        };
        let photo = placeholder(None);
        // no panic and deterministic output is the contract here
        let a = render(&photo, Some(&block), &spec, &ctx).unwrap();
        let b = render(&photo, Some(&block), &spec, &ctx).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn context_is_shareable_across_threads() {
        let ctx = Arc::new(ctx());
        let spec = layout_for(AdFormat::Story, &ctx.style);
        let photo = Arc::new(placeholder(None));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ctx = Arc::clone(&ctx);
                let spec = spec.clone();
                let photo = Arc::clone(&photo);
                std::thread::spawn(move || render(&photo, None, &spec, &ctx).unwrap())
            })
            .collect();
        let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(outputs[0], outputs[1]);
    }
}

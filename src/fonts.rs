//! Display font registration.
//!
//! The brand ships a bold display face as a static asset. When it cannot
//! be resolved or parsed we fall back to a generic bold sans-serif from
//! the host system; a missing font degrades rendering, it never fails a
//! generation. Registration happens once per process.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use once_cell::sync::OnceCell;
use rusttype::Font;
use tracing::warn;

use crate::assets::AssetResolver;

pub const DISPLAY_FONT_ASSET: &str = "Poppins-Bold.ttf";

/// Generic bold sans-serif faces commonly present on deployment images.
const FALLBACK_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
];

static DISPLAY_FONT: OnceCell<Option<Arc<Font<'static>>>> = OnceCell::new();
static DEGRADED: AtomicBool = AtomicBool::new(false);

/// Idempotent: the resolution chain runs once, every later call returns
/// the same handle.
pub fn ensure_display_font(resolver: &AssetResolver) -> Option<Arc<Font<'static>>> {
    DISPLAY_FONT
        .get_or_init(|| {
            let (font, degraded) = load_display_font(resolver);
            DEGRADED.store(degraded, Ordering::Relaxed);
            font
        })
        .clone()
}

/// Whether the preferred brand font was unavailable and a generic family
/// (or no font at all) is in use.
pub fn is_degraded() -> bool {
    DEGRADED.load(Ordering::Relaxed)
}

fn load_display_font(resolver: &AssetResolver) -> (Option<Arc<Font<'static>>>, bool) {
    match resolver.resolve(DISPLAY_FONT_ASSET) {
        Ok(bytes) => {
            if let Some(font) = Font::try_from_vec(bytes.to_vec()) {
                return (Some(Arc::new(font)), false);
            }
            warn!(asset = DISPLAY_FONT_ASSET, "display font asset did not parse");
        }
        Err(e) => {
            warn!(asset = DISPLAY_FONT_ASSET, error = %e, "display font unavailable, trying fallback family");
        }
    }

    for path in FALLBACK_PATHS {
        if let Ok(bytes) = std::fs::read(path) {
            if let Some(font) = Font::try_from_vec(bytes) {
                warn!(fallback = path, "using generic bold sans-serif");
                return (Some(Arc::new(font)), true);
            }
        }
    }

    warn!("no usable font found, text will be skipped");
    (None, true)
}

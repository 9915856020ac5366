//! Listing photo acquisition.
//!
//! The pipeline must stay total over every `PropertyData`: an absent,
//! malformed or unreachable photo URL yields a generated placeholder
//! instead of an error. The fetch is the only network suspension point
//! and runs under a bounded timeout.

use std::time::Duration;

use image::Rgba;
use rusttype::Font;
use tracing::warn;

use crate::generator::draw::{self, Canvas};
use crate::util;

pub const PLACEHOLDER_W: u32 = 1080;
pub const PLACEHOLDER_H: u32 = 720;

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0xE2, 0xE8, 0xF0, 0xFF]);
const PLACEHOLDER_TEXT: Rgba<u8> = Rgba([0x47, 0x55, 0x69, 0xFF]);
const PLACEHOLDER_CAPTION: &str = "IMAGE UNAVAILABLE";
const PLACEHOLDER_PX: f32 = 48.0;

fn photo_timeout() -> Duration {
    let secs = std::env::var("PHOTO_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(10);
    Duration::from_secs(secs)
}

/// Fetch the listing photo, falling back to the placeholder on any
/// failure. Dropping the returned future cancels an in-flight fetch.
pub async fn fetch_listing_photo(
    http: &reqwest::Client,
    url: &str,
    font: Option<&Font<'static>>,
) -> Canvas {
    let url = url.trim();

    if url.starts_with("data:") {
        // inline photo from the upstream extractor
        match util::b64_decode(url).and_then(|b| image::load_from_memory(&b).ok()) {
            Some(img) => return img.to_rgba8(),
            None => {
                warn!("inline photo did not decode, using placeholder");
                return placeholder(font);
            }
        }
    }

    if url.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
        return placeholder(font);
    }

    match fetch_bytes(http, url).await {
        Ok(bytes) => match image::load_from_memory(&bytes) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!(url, error = %e, "photo did not decode, using placeholder");
                placeholder(font)
            }
        },
        Err(e) => {
            warn!(url, error = %e, "photo fetch failed, using placeholder");
            placeholder(font)
        }
    }
}

async fn fetch_bytes(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, String> {
    let resp = http
        .get(url)
        .timeout(photo_timeout())
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("http {}", resp.status()));
    }
    let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

/// Neutral-fill substitute with a centered caption. The caption is
/// skipped when no font is available; the fill alone still keeps the
/// render total.
pub fn placeholder(font: Option<&Font<'static>>) -> Canvas {
    let mut img = Canvas::from_pixel(PLACEHOLDER_W, PLACEHOLDER_H, PLACEHOLDER_FILL);

    if let Some(font) = font {
        let w = draw::text_advance_width(font, PLACEHOLDER_PX, PLACEHOLDER_CAPTION, 0.0);
        let x = (PLACEHOLDER_W as f32 - w) / 2.0;
        let y = PLACEHOLDER_H as f32 / 2.0 + PLACEHOLDER_PX / 3.0;
        draw::draw_text_run(
            &mut img,
            font,
            PLACEHOLDER_PX,
            x.max(0.0),
            y,
            PLACEHOLDER_TEXT,
            PLACEHOLDER_CAPTION,
            0.0,
        );
    }

    img
}

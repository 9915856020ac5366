//! Ad generation: domain types, error taxonomy and the orchestrator
//! driving photo fetch, layout and per-format compositing.

pub mod compositor;
pub mod draw;

use std::sync::Arc;

use chrono::Utc;
use rusttype::Font;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::assets::{AssetError, AssetResolver};
use crate::fonts;
use crate::layout::{self, AdFormat, StyleConfig};
use crate::photo;
use crate::publish::Publisher;
use crate::util;

use self::draw::Canvas;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("asset missing: {0}")]
    AssetMissing(String),
    #[error("photo fetch failed: {0}")]
    PhotoFetch(String),
    #[error("display font unavailable")]
    FontUnavailable,
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("invalid format requested: {0}")]
    InvalidFormat(String),
    #[error("image: {0}")]
    Image(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<AssetError> for GenError {
    fn from(e: AssetError) -> Self {
        match e {
            AssetError::Missing(name) => GenError::AssetMissing(name),
            AssetError::Io(e) => GenError::Internal(e.to_string()),
        }
    }
}

/// Listing fields as extracted upstream. Every field is pre-normalized
/// display text; the engine never re-parses or re-formats it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub surface: String,
    #[serde(default)]
    pub featured_image_url: String,
}

/// Three optional operator-supplied text lines for one format. Absent or
/// blank lines render nothing; there is no fallback string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock3 {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub line3: Option<String>,
}

impl TextBlock3 {
    /// Lines in slot order, blank entries collapsed to `None`.
    pub fn lines(&self) -> [Option<&str>; 3] {
        fn clean(l: &Option<String>) -> Option<&str> {
            match l.as_deref().map(str::trim) {
                Some("") | None => None,
                Some(s) => Some(s),
            }
        }
        [clean(&self.line1), clean(&self.line2), clean(&self.line3)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Square,
    Story,
    Both,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "square" => OutputFormat::Square,
            "story" => OutputFormat::Story,
            "both" => OutputFormat::Both,
            _ => return None,
        })
    }

    pub fn wants(self, format: AdFormat) -> bool {
        matches!(
            (self, format),
            (OutputFormat::Both, _)
                | (OutputFormat::Square, AdFormat::Square)
                | (OutputFormat::Story, AdFormat::Story)
        )
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub format: OutputFormat,
    #[serde(default)]
    pub square_text: Option<TextBlock3>,
    #[serde(default)]
    pub story_text: Option<TextBlock3>,
}

/// Everything a render needs beyond its typed inputs, resolved once and
/// passed explicitly instead of read from globals.
#[derive(Clone)]
pub struct RenderContext {
    pub assets: AssetResolver,
    pub font: Option<Arc<Font<'static>>>,
    pub style: StyleConfig,
}

impl RenderContext {
    pub fn init() -> Self {
        let assets = AssetResolver::from_env();
        let font = fonts::ensure_display_font(&assets);
        Self {
            assets,
            font,
            style: StyleConfig::from_env(),
        }
    }
}

/// One finished advertisement. Immutable after creation; ownership of
/// the bytes passes to the caller.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAd {
    pub format: AdFormat,
    pub width: u32,
    pub height: u32,
    pub filename: String,
    pub url: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Per-format outcome of one generation call. Unrequested formats stay
/// `None`; a failed publish leaves the error in its slot while the
/// sibling format is unaffected.
#[derive(Debug, Default)]
pub struct AdBundle {
    pub square: Option<Result<GeneratedAd, GenError>>,
    pub story: Option<Result<GeneratedAd, GenError>>,
}

/// Generate every requested format for one listing.
///
/// The photo is fetched once and shared; square and story composite in
/// parallel on blocking tasks, each owning its canvas and constants.
pub async fn generate_ads<P: Publisher>(
    http: &reqwest::Client,
    ctx: &Arc<RenderContext>,
    publisher: &P,
    data: &PropertyData,
    opts: &GenerationOptions,
) -> Result<AdBundle, GenError> {
    let slug = util::slug(&data.title);
    let stamp = Utc::now().timestamp_millis();

    let photo = Arc::new(
        photo::fetch_listing_photo(http, &data.featured_image_url, ctx.font.as_deref()).await,
    );

    let (square, story) = tokio::join!(
        async {
            if opts.format.wants(AdFormat::Square) {
                Some(
                    render_one(
                        ctx,
                        publisher,
                        &photo,
                        AdFormat::Square,
                        opts.square_text.clone(),
                        &slug,
                        stamp,
                    )
                    .await,
                )
            } else {
                None
            }
        },
        async {
            if opts.format.wants(AdFormat::Story) {
                Some(
                    render_one(
                        ctx,
                        publisher,
                        &photo,
                        AdFormat::Story,
                        opts.story_text.clone(),
                        &slug,
                        stamp,
                    )
                    .await,
                )
            } else {
                None
            }
        },
    );

    Ok(AdBundle { square, story })
}

async fn render_one<P: Publisher>(
    ctx: &Arc<RenderContext>,
    publisher: &P,
    photo: &Arc<Canvas>,
    format: AdFormat,
    text: Option<TextBlock3>,
    slug: &str,
    stamp: i64,
) -> Result<GeneratedAd, GenError> {
    let spec = layout::layout_for(format, &ctx.style);
    let (width, height) = (spec.width, spec.height);

    let ctx = Arc::clone(ctx);
    let photo = Arc::clone(photo);
    let bytes =
        tokio::task::spawn_blocking(move || compositor::render(&photo, text.as_ref(), &spec, &ctx))
            .await
            .map_err(|e| GenError::Internal(e.to_string()))??;

    let filename = format!("{slug}-{format}-{stamp}.png");
    match publisher.upload(&bytes, &filename).await {
        Ok(published) => Ok(GeneratedAd {
            format,
            width,
            height,
            filename,
            url: Some(published.url),
            bytes,
        }),
        Err(e) => Err(GenError::Upload(e.to_string())),
    }
}

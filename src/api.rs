use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::generator::{
    self, AdBundle, GenError, GeneratedAd, GenerationOptions, OutputFormat, PropertyData,
    TextBlock3,
};
use crate::layout::AdFormat;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub property: PropertyData,
    /// "square", "story" or "both"; defaults to both.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub square_text: Option<TextBlock3>,
    #[serde(default)]
    pub story_text: Option<TextBlock3>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AdSlot {
    Ready(GeneratedAd),
    Failed { error: String },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdsJson {
    pub square: Option<AdSlot>,
    pub story: Option<AdSlot>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    pub ads: AdsJson,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(get, path = "/health", tag = "adgen", responses((status = 200, body = HealthResponse)))]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok".into() })
}

#[utoipa::path(
    post,
    path = "/generate",
    tag = "adgen",
    request_body = GenerateRequest,
    responses(
        (status = 200, body = GenerateResponse),
        (status = 400, description = "Invalid format requested")
    )
)]
pub async fn generate(
    State(st): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let format = match req.format.as_deref() {
        None => OutputFormat::Both,
        Some(s) => OutputFormat::parse(s).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                GenError::InvalidFormat(s.to_string()).to_string(),
            )
        })?,
    };

    // inline text wins, stored operator overrides fill the gaps
    let opts = GenerationOptions {
        format,
        square_text: req.square_text.or_else(|| st.overrides.get(AdFormat::Square)),
        story_text: req.story_text.or_else(|| st.overrides.get(AdFormat::Story)),
    };

    let bundle =
        generator::generate_ads(&st.http, &st.ctx, st.store.as_ref(), &req.property, &opts)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(bundle_response(bundle)))
}

fn bundle_response(bundle: AdBundle) -> GenerateResponse {
    fn slot(outcome: Option<Result<GeneratedAd, GenError>>) -> Option<AdSlot> {
        match outcome {
            None => None,
            Some(Ok(ad)) => Some(AdSlot::Ready(ad)),
            Some(Err(e)) => Some(AdSlot::Failed { error: e.to_string() }),
        }
    }

    let ads = AdsJson {
        square: slot(bundle.square),
        story: slot(bundle.story),
    };
    let success = matches!(ads.square, Some(AdSlot::Ready(_)))
        || matches!(ads.story, Some(AdSlot::Ready(_)));

    GenerateResponse { success, ads }
}

#[utoipa::path(
    get,
    path = "/text/{format}",
    tag = "adgen",
    params(("format" = String, Path, description = "square or story")),
    responses((status = 200, body = TextBlock3, description = "Current override, null when unset"), (status = 400, description = "Unknown format"))
)]
pub async fn get_text(
    State(st): State<Arc<AppState>>,
    Path(format): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let format = parse_ad_format(&format)?;
    Ok(Json(st.overrides.get(format)))
}

#[utoipa::path(
    post,
    path = "/text/{format}",
    tag = "adgen",
    params(("format" = String, Path, description = "square or story")),
    request_body = TextBlock3,
    responses((status = 200, body = TextBlock3), (status = 400, description = "Unknown format"))
)]
pub async fn set_text(
    State(st): State<Arc<AppState>>,
    Path(format): Path<String>,
    Json(block): Json<TextBlock3>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let format = parse_ad_format(&format)?;
    st.overrides
        .set(format, block.clone())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(block))
}

fn parse_ad_format(s: &str) -> Result<AdFormat, (StatusCode, String)> {
    AdFormat::parse(s).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("unknown format: {s} (expected square or story)"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_response_maps_slots() {
        let bundle = AdBundle {
            square: Some(Ok(GeneratedAd {
                format: AdFormat::Square,
                width: 1080,
                height: 1080,
                filename: "x-square-1.png".into(),
                url: Some("http://localhost/generated/x-square-1.png".into()),
                bytes: vec![1],
            })),
            story: Some(Err(GenError::Upload("cdn down".into()))),
        };
        let resp = bundle_response(bundle);
        assert!(resp.success);
        assert!(matches!(resp.ads.square, Some(AdSlot::Ready(_))));
        match resp.ads.story {
            Some(AdSlot::Failed { error }) => assert!(error.contains("cdn down")),
            other => panic!("expected failed slot, got {other:?}"),
        }
    }

    #[test]
    fn bundle_response_with_no_success() {
        let bundle = AdBundle {
            square: Some(Err(GenError::Upload("nope".into()))),
            story: None,
        };
        let resp = bundle_response(bundle);
        assert!(!resp.success);
        assert!(resp.ads.story.is_none());
    }

    #[test]
    fn request_parses_with_defaults() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"property": {"title": "Villa Marina", "type": "Villa"}}"#)
                .unwrap();
        assert_eq!(req.property.title, "Villa Marina");
        assert_eq!(req.property.property_type, "Villa");
        assert!(req.format.is_none());
        assert!(req.square_text.is_none());
    }
}

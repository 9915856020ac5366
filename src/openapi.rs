use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health,
        api::generate,
        api::get_text,
        api::set_text,
    ),
    components(
        schemas(
            api::GenerateRequest,
            api::GenerateResponse,
            api::AdsJson,
            api::AdSlot,
            api::HealthResponse,
            crate::generator::PropertyData,
            crate::generator::TextBlock3,
            crate::generator::GeneratedAd,
            crate::layout::AdFormat,
        )
    ),
    tags(
        (name = "adgen", description = "Listing ad visual generation API")
    )
)]
pub struct ApiDoc;

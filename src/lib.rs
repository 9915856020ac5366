pub mod api;
pub mod assets;
pub mod fonts;
pub mod generator;
pub mod layout;
pub mod markup;
pub mod openapi;
pub mod overrides;
pub mod photo;
pub mod publish;
pub mod util;

use std::sync::Arc;

use crate::generator::RenderContext;
use crate::overrides::OverrideStore;
use crate::publish::LocalStore;

#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub ctx: Arc<RenderContext>,
    pub overrides: Arc<OverrideStore>,
    pub store: Arc<LocalStore>,
}

//! API information served at `/` when no frontend bundle is served.

use axum::{Json, extract::State};
use serde::Serialize;

use super::{AUTH_PREFIX, CATEGORIES_PREFIX, POSTS_PREFIX};
use crate::state::AppState;

pub const API_VERSION: &str = "1.0.0";
pub const MISSING_BUNDLE_NOTE: &str =
    "Frontend build not found. Deploy frontend separately or build it.";

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub success: bool,
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub posts: &'static str,
    pub categories: &'static str,
    pub auth: &'static str,
}

pub async fn api_info(State(state): State<AppState>) -> Json<ApiInfo> {
    Json(ApiInfo {
        success: true,
        message: "Blog API is running",
        version: API_VERSION,
        endpoints: Endpoints {
            posts: POSTS_PREFIX,
            categories: CATEGORIES_PREFIX,
            auth: AUTH_PREFIX,
        },
        // Only reachable in production when the bundle is missing
        note: state
            .config
            .environment
            .is_production()
            .then_some(MISSING_BUNDLE_NOTE),
    })
}

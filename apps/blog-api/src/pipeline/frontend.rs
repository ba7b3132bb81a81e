//! Static files: the uploads directory and the production SPA bundle.

use axum::{
    extract::{OriginalUri, Request},
    response::{IntoResponse, Response},
};
use axum_helpers::errors::handlers::route_not_found;
use std::io;
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

/// Prefix reserved for API routes; never answered with the SPA document.
pub const API_PREFIX: &str = "/api";

/// A built single-page frontend. Unknown paths resolve to its `index.html`.
#[derive(Clone, Debug)]
pub struct FrontendBundle {
    files: ServeDir<ServeFile>,
}

impl FrontendBundle {
    pub fn new(dist_dir: &Path) -> Self {
        Self {
            files: ServeDir::new(dist_dir).fallback(ServeFile::new(dist_dir.join("index.html"))),
        }
    }
}

/// Router fallback: API paths get a JSON 404; everything else gets the SPA
/// when a bundle is served, or a JSON 404 otherwise.
pub async fn fallback(
    bundle: Option<FrontendBundle>,
    OriginalUri(uri): OriginalUri,
    request: Request,
) -> Response {
    match bundle {
        Some(bundle) if !uri.path().starts_with(API_PREFIX) => {
            bundle.files.oneshot(request).await.into_response()
        }
        _ => route_not_found(&uri),
    }
}

/// Create the uploads directory if it does not exist yet.
pub fn ensure_uploads_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!(path = %path.display(), "Created uploads directory");
    }
    Ok(())
}

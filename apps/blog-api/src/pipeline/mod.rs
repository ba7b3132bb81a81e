//! The request pipeline.
//!
//! Outer to inner, every request passes through:
//! 1. security headers
//! 2. performance monitor (`X-Response-Time`, slow-request warnings)
//! 3. JSON error envelope (terminal error stage on the way out)
//! 4. body size limit (10 MB)
//! 5. origin enforcement and CORS
//! 6. error reporter (server errors only)
//! 7. panic catcher, with the request scope that marks panics as recoverable
//! 8. access log (`http` target)
//! 9. routes: `/health`, `/uploads`, `/`, domain routers, then the fallback
//!
//! The timing layer sits outside CORS and the body limit so rejected requests
//! are timed too.

pub mod frontend;

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{
    errors::{
        envelope::json_error_envelope,
        handlers::{handle_panic, request_scope},
    },
    http::{
        MAX_BODY_BYTES, body_limit_layer, create_cors_layer, enforce_allowed_origin,
        extractor_body_limit, report_server_errors, security_headers,
    },
};
use observability::performance_monitor;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::ResponseBody,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};

use crate::api::{DomainRoutes, health::health_check, info::api_info};
use crate::state::AppState;
use frontend::FrontendBundle;

/// Assemble the full application router.
pub fn build_router(state: AppState, domain_routes: DomainRoutes) -> Router {
    let config = state.config.clone();
    let bundle = config.frontend_bundle().map(FrontendBundle::new);
    if let Some(dist) = config.frontend_bundle() {
        info!(path = %dist.display(), "Serving frontend bundle");
    }

    let mut routes = Router::new()
        .route("/health", get(health_check))
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir));

    if bundle.is_none() {
        routes = routes.route("/", get(api_info));
    }

    let mut app = routes
        .with_state(state.clone())
        .fallback(move |uri: OriginalUri, request: Request| {
            frontend::fallback(bundle.clone(), uri, request)
        });
    for (prefix, router) in domain_routes {
        app = app.nest(prefix, router);
    }

    let cors_policy = config.cors_policy();

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request| {
                info_span!(
                    target: "http",
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_response(|response: &Response, latency: Duration, _span: &Span| {
                info!(
                    target: "http",
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "response"
                );
            }),
    )
    .layer(middleware::from_fn(request_scope))
    .layer(CatchPanicLayer::custom(handle_panic))
    .layer(middleware::from_fn_with_state(
        state.reporter.clone(),
        report_server_errors,
    ))
    .layer(extractor_body_limit(MAX_BODY_BYTES))
    .layer(
        ServiceBuilder::new()
            .map_response(|response: Response<ResponseBody<Body>>| response.into_response())
            .layer(body_limit_layer(MAX_BODY_BYTES)),
    )
    .layer(create_cors_layer(&cors_policy))
    .layer(middleware::from_fn_with_state(
        cors_policy,
        enforce_allowed_origin,
    ))
    .layer(middleware::from_fn(json_error_envelope))
    .layer(middleware::from_fn_with_state(
        config.performance_config(),
        performance_monitor,
    ))
    .layer(middleware::from_fn(security_headers))
}

use axum::{
    extract::Request,
    http::{StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use std::any::Any;

use super::{ErrorCode, ErrorDetail, error_response};

/// JSON 404 naming the unmatched route, including the query string, e.g.
/// `Route /api/nope?x=1 not found`.
pub fn route_not_found(uri: &Uri) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    error_response(StatusCode::NOT_FOUND, route_not_found_message(path))
}

pub fn route_not_found_message(path: &str) -> String {
    format!("Route {} not found", path)
}

tokio::task_local! {
    static HANDLING_REQUEST: ();
}

/// Whether the current task is inside [`request_scope`].
///
/// A panic hook uses this to tell handler panics, which the panic catcher
/// answers with a 500, from process-level faults.
pub fn is_handling_request() -> bool {
    HANDLING_REQUEST.try_with(|_| ()).is_ok()
}

/// Marks the rest of the request as recoverable. Install directly inside
/// `CatchPanicLayer`.
pub async fn request_scope(request: Request, next: Next) -> Response {
    HANDLING_REQUEST.scope((), next.run(request)).await
}

/// Turns a panic inside a request handler into a 500 response.
///
/// Intended for `tower_http::catch_panic::CatchPanicLayer::custom`. The panic
/// payload is kept in [`ErrorDetail`] for the reporter and never sent to the
/// client.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    tracing::error!(
        error_code = ErrorCode::HandlerPanic.code(),
        panic = %message,
        "Request handler panicked"
    );

    let mut response = error_response(StatusCode::INTERNAL_SERVER_ERROR, "");
    response.extensions_mut().insert(ErrorDetail {
        code: ErrorCode::HandlerPanic,
        message: format!("handler panicked: {}", message),
    });
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

//! Terminal error stage.
//!
//! Layers such as the body limit, CORS, or axum's own extractors answer with
//! plain-text errors. This middleware rewrites every error response that is
//! not already JSON into the uniform `{success:false, error}` body, so clients
//! see one error shape regardless of which stage failed.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use super::{ErrorCode, ErrorDetail, error_response};

/// Plain-text error bodies larger than this are not inspected
const MAX_INSPECTED_BODY: usize = 16 * 1024;

pub async fn json_error_envelope(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let code = ErrorCode::from_status(status);

    let message = if status.is_server_error() || code == ErrorCode::PayloadTooLarge {
        code.default_message().to_string()
    } else {
        plain_text_message(body)
            .await
            .unwrap_or_else(|| code.default_message().to_string())
    };

    let mut enveloped = error_response(status, message);

    // Keep headers set by inner layers (CORS, Allow, ...) except the body framing.
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    for (name, value) in parts.headers.iter() {
        enveloped.headers_mut().append(name.clone(), value.clone());
    }
    if let Some(detail) = parts.extensions.remove::<ErrorDetail>() {
        enveloped.extensions_mut().insert(detail);
    }
    enveloped
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

async fn plain_text_message(body: Body) -> Option<String> {
    let bytes = to_bytes(body, MAX_INSPECTED_BODY).await.ok()?;
    let text = std::str::from_utf8(&bytes).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    Some(capitalize(text))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

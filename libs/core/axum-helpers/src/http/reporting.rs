//! Forwards server-class failures to the configured [`ErrorReporter`].
//!
//! Only responses produced from an error (an [`ErrorDetail`] is attached by
//! `AppError` and the panic handler) with a 5xx status produce an event. A
//! handler that deliberately answers 503, like the health check during an
//! outage, is not an error. Every request also gets a performance trace when
//! the reporter samples them.
//!
//! [`ErrorReporter`]: observability::ErrorReporter

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use observability::{ErrorEvent, RequestContext, SharedReporter, should_report};

use crate::errors::ErrorDetail;

pub async fn report_server_errors(
    State(reporter): State<SharedReporter>,
    request: Request,
    next: Next,
) -> Response {
    if !reporter.is_enabled() {
        return next.run(request).await;
    }

    let context = RequestContext::from_request(&request);
    let trace = reporter.start_request_trace(&format!(
        "{} {}",
        context.method,
        request.uri().path()
    ));
    let response = next.run(request).await;

    let status = response.status();
    if let Some(trace) = trace {
        trace.finish(status);
    }

    if !should_report(status) {
        return response;
    }
    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let completed = context.finish(status);
    let mut event = ErrorEvent::new(detail.message)
        .with_tag("http.method", &completed.context.method)
        .with_tag("http.status_code", status.as_u16())
        .with_tag("error_code", detail.code)
        .with_extra("url", completed.context.url.clone())
        .with_extra("elapsed_ms", completed.elapsed_ms() as u64);
    if let Some(ip) = &completed.context.client_ip {
        event = event.with_extra("ip", ip.clone());
    }
    if let Some(user_agent) = &completed.context.user_agent {
        event = event.with_extra("user_agent", user_agent.clone());
    }

    reporter.report(event);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use observability::{ErrorReporter, RequestTrace};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ErrorEvent>>,
        traces: Arc<Mutex<Vec<(String, StatusCode)>>>,
    }

    struct RecordedTrace {
        name: String,
        traces: Arc<Mutex<Vec<(String, StatusCode)>>>,
    }

    impl RequestTrace for RecordedTrace {
        fn finish(self: Box<Self>, status: StatusCode) {
            self.traces.lock().unwrap().push((self.name.clone(), status));
        }
    }

    impl ErrorReporter for Recorder {
        fn report(&self, event: ErrorEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn start_request_trace(&self, name: &str) -> Option<Box<dyn RequestTrace>> {
            Some(Box::new(RecordedTrace {
                name: name.to_string(),
                traces: self.traces.clone(),
            }))
        }
    }

    async fn call(reporter: Arc<Recorder>, uri: &str) -> StatusCode {
        let app = Router::new()
            .route("/unavailable", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route(
                "/failed",
                get(|| async { Err::<(), _>(AppError::InternalServerError("pool exhausted".into())) }),
            )
            .route(
                "/invalid",
                get(|| async { Err::<(), _>(AppError::BadRequest("Title is required".into())) }),
            )
            .layer(middleware::from_fn_with_state(
                reporter as SharedReporter,
                report_server_errors,
            ));

        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_deliberate_503_is_not_reported() {
        let reporter = Arc::new(Recorder::default());
        for _ in 0..3 {
            assert_eq!(
                call(reporter.clone(), "/unavailable").await,
                StatusCode::SERVICE_UNAVAILABLE
            );
        }
        assert!(reporter.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_reported_with_detail() {
        let reporter = Arc::new(Recorder::default());
        call(reporter.clone(), "/failed?page=2").await;

        let events = reporter.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("pool exhausted"));
        assert_eq!(events[0].tags["http.status_code"], "500");
        assert_eq!(events[0].tags["http.method"], "GET");
    }

    #[tokio::test]
    async fn test_client_error_not_reported() {
        let reporter = Arc::new(Recorder::default());
        assert_eq!(call(reporter.clone(), "/invalid").await, StatusCode::BAD_REQUEST);
        assert!(reporter.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_every_request_is_traced_with_its_status() {
        let reporter = Arc::new(Recorder::default());
        call(reporter.clone(), "/invalid").await;
        call(reporter.clone(), "/failed?page=2").await;

        let traces = reporter.traces.lock().unwrap();
        assert_eq!(
            *traces,
            vec![
                ("GET /invalid".to_string(), StatusCode::BAD_REQUEST),
                ("GET /failed".to_string(), StatusCode::INTERNAL_SERVER_ERROR),
            ]
        );
    }
}

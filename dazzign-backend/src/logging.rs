//! Request logging
//!

use std::time::Duration;

use axum::{http::header::CONTENT_LENGTH, response::Response};
use tower_http::{
    classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier},
    trace::{OnFailure, OnRequest, OnResponse, TraceLayer},
};
use tracing::{trace, warn, Span};

/// Builds the per-request span and fills in status, latency and size once the response is ready.
#[derive(Copy, Clone)]
pub(crate) struct DazzignSpanner {}

impl<B> tower_http::trace::MakeSpan<B> for DazzignSpanner {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
            bytes = tracing::field::Empty
        )
    }
}

impl<B> OnRequest<B> for DazzignSpanner {
    fn on_request(&mut self, _request: &axum::http::Request<B>, _span: &Span) {
        trace!("request received");
    }
}

impl<B> OnResponse<B> for DazzignSpanner {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        span.record("status", response.status().as_u16());
        span.record("latency_ms", latency.as_millis() as u64);
        if let Some(content_length) = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
        {
            span.record("bytes", content_length);
        }
        tracing::event!(tracing::Level::INFO, "response sent");
    }
}

impl OnFailure<ServerErrorsFailureClass> for DazzignSpanner {
    fn on_failure(&mut self, failure: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
        warn!(
            latency_ms = latency.as_millis() as u64,
            "request failed: {}", failure
        );
    }
}

pub(crate) fn logging_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    DazzignSpanner,
    DazzignSpanner,
    DazzignSpanner,
    tower_http::trace::DefaultOnBodyChunk,
    tower_http::trace::DefaultOnEos,
    DazzignSpanner,
> {
    TraceLayer::new_for_http()
        .on_request(DazzignSpanner {})
        .make_span_with(DazzignSpanner {})
        .on_response(DazzignSpanner {})
        .on_failure(DazzignSpanner {})
}

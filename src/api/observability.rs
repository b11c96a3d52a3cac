//! Request spans and Prometheus metrics for the HTTP surface.

use axum::{
    Json,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::{AppState, ErrorBody};
use crate::services::UserError;

pub const HTTP_REQUESTS: &str = "usrman_http_requests_total";
pub const HTTP_DURATION: &str = "usrman_http_request_duration_seconds";
pub const USER_OPERATIONS: &str = "usrman_user_operations_total";

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus_handle {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Metrics are disabled")),
        )
            .into_response(),
    }
}

/// Counts a user-service call by operation and outcome, so that
/// username conflicts, email conflicts and storage failures can be told
/// apart even where they share an HTTP status.
pub fn record_user_operation<T>(operation: &'static str, result: &Result<T, UserError>) {
    let outcome = result.as_ref().map_or_else(UserError::kind, |_| "ok");
    count_user_operation(operation, outcome);
}

pub fn count_user_operation(operation: &'static str, outcome: &'static str) {
    metrics::counter!(USER_OPERATIONS, "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub async fn track_requests(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
        .to_string();

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        route = %route,
    );

    let response = next.run(req).instrument(span.clone()).await;

    let elapsed = started.elapsed();
    let status = response.status();
    let labels = [
        ("method", method.to_string()),
        ("route", route),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!(HTTP_REQUESTS, &labels).increment(1);
    metrics::histogram!(HTTP_DURATION, &labels).record(elapsed.as_secs_f64());

    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        if status.is_server_error() {
            warn!(status = status.as_u16(), elapsed_ms, "Request failed");
        } else {
            info!(status = status.as_u16(), elapsed_ms, "Request finished");
        }
    });

    response
}

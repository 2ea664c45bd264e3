use super::response::ApiResponse;
use crate::application::governor::RateGovernor;
use crate::domain::rate_limit::Admission;
use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

pub const THROTTLED_MESSAGE: &str = "Too many requests. Please try again later.";

/// Rejects requests once the peer address exceeds its window.
///
/// Every caller behind the same network address shares one counter.
pub async fn govern(
    State(governor): State<RateGovernor>,
    request: Request,
    next: Next,
) -> Response {
    let caller_key = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match governor.admit(&caller_key) {
        Admission::Allowed => next.run(request).await,
        Admission::Throttled => {
            tracing::warn!(caller = %caller_key, "request throttled");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ApiResponse::failure(THROTTLED_MESSAGE, None)),
            )
                .into_response()
        }
    }
}

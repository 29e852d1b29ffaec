//! Request middleware: caller identity, admin token and request tracking.
//!
//! Authentication itself happens upstream. User routes trust the
//! `X-User-Id` header set by the host's auth layer; admin routes require the
//! configured bearer token.
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use arena_server::api::middleware::CallerId;
//! use axum::extract::Extension;
//!
//! async fn handler(Extension(CallerId(user_id)): Extension<CallerId>) -> String {
//!     format!("Called by {}", user_id)
//! }
//! # let _ = handler;
//! ```

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::time::Instant;

use super::{AppState, events::ErrorResponse};
use crate::{logging, metrics};

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller, injected into request extensions by [`user_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

fn caller_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(message.to_string())),
    )
        .into_response()
}

/// Require an `X-User-Id` header and inject it as [`CallerId`].
///
/// - **Success**: Injects `CallerId` into request extensions → Calls next handler
/// - **Missing or empty header**: Returns `401 Unauthorized`
pub async fn user_middleware(mut request: Request, next: Next) -> Response {
    let Some(user_id) = caller_id(request.headers()).map(str::to_string) else {
        return unauthorized("Missing user id");
    };

    request.extensions_mut().insert(CallerId(user_id));
    next.run(request).await
}

/// Require `Authorization: Bearer <ADMIN_TOKEN>`.
///
/// - **Success**: Calls next handler
/// - **Missing header, wrong format or wrong token**: Returns `401 Unauthorized`
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if token == &*state.admin_token => next.run(request).await,
        _ => {
            tracing::warn!(
                http_path = request.uri().path(),
                "SECURITY: Rejected admin request"
            );
            unauthorized("Admin token required")
        }
    }
}

/// Log every request and record HTTP metrics.
///
/// The route template (e.g. `/api/v1/events/{event_id}`) is used as the path
/// label so metrics stay bounded.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let user_id = caller_id(request.headers()).map(str::to_string);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();
    metrics::http_requests_total(&method, &path, status);
    metrics::http_request_duration_ms(&method, &path, elapsed.as_secs_f64() * 1000.0);
    logging::log_api_request(
        &method,
        &path,
        status,
        elapsed.as_millis() as u64,
        user_id.as_deref(),
    );

    response
}

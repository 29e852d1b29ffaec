//! HTTP API for the event server.
//!
//! Every response body is JSON carrying an `ok` flag. Failures add a
//! client-safe `error` message.
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `GET /health` - Server health status
//! - `GET /api/v1/events` - List events, newest first
//! - `GET /api/v1/events/{id}` - Event with registrations and brackets
//!
//! ## User (`X-User-Id` header set by the upstream auth layer)
//! - `POST /api/v1/events/{id}/register` - Register solo or as team captain
//! - `POST /api/v1/events/{id}/checkin` - Check in
//! - `POST /api/v1/events/{id}/unregister` - Withdraw and refund the entry fee
//!
//! ## Admin (`Authorization: Bearer <ADMIN_TOKEN>`)
//! - `POST /api/v1/admin/events` - Create event
//! - `DELETE /api/v1/admin/events/{id}` - Delete event
//! - `POST /api/v1/admin/events/{id}/status` - Change status and links
//! - `POST /api/v1/admin/events/{id}/winner` - Announce winner
//! - `POST /api/v1/admin/events/{id}/award-prize` - Credit a prize
//! - `POST /api/v1/admin/events/{id}/bracket/generate` - Build brackets
//! - `POST /api/v1/admin/events/{id}/matches/{match_id}/result` - Record winner
//! - `POST /api/v1/admin/events/{id}/matches/{match_id}/schedule` - Schedule match
//! - `POST /api/v1/admin/events/{id}/matches/{match_id}/update` - Override slots
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use arena::{EventManager, WinnerValidation};
//! use arena::db::InMemoryEventRepository;
//! use arena::team::InMemoryTeamDirectory;
//! use arena::wallet::InMemoryWallet;
//! use arena_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = EventManager::new(
//!     Arc::new(InMemoryEventRepository::new()),
//!     Arc::new(InMemoryWallet::new()),
//!     Arc::new(InMemoryTeamDirectory::new()),
//!     WinnerValidation::Lenient,
//! );
//! let app = create_router(AppState::new(manager, "change-me-admin-token"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod events;
pub mod middleware;

use arena::EventManager;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub event_manager: Arc<EventManager>,
    /// Bearer token accepted on admin routes
    pub admin_token: Arc<str>,
}

impl AppState {
    pub fn new(event_manager: EventManager, admin_token: &str) -> Self {
        Self {
            event_manager: Arc::new(event_manager),
            admin_token: Arc::from(admin_token),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET    /health                                            - public
/// GET    /api/v1/events                                     - public
/// GET    /api/v1/events/{id}                                - public
/// POST   /api/v1/events/{id}/register                       - user
/// POST   /api/v1/events/{id}/checkin                        - user
/// POST   /api/v1/events/{id}/unregister                     - user
/// POST   /api/v1/admin/events                               - admin
/// DELETE /api/v1/admin/events/{id}                          - admin
/// POST   /api/v1/admin/events/{id}/status                   - admin
/// POST   /api/v1/admin/events/{id}/winner                   - admin
/// POST   /api/v1/admin/events/{id}/award-prize              - admin
/// POST   /api/v1/admin/events/{id}/bracket/generate         - admin
/// POST   /api/v1/admin/events/{id}/matches/{match_id}/result   - admin
/// POST   /api/v1/admin/events/{id}/matches/{match_id}/schedule - admin
/// POST   /api/v1/admin/events/{id}/matches/{match_id}/update   - admin
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(middleware::track_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/events", get(events::list_events))
        .route("/events/{event_id}", get(events::get_event));

    let user_routes = Router::new()
        .route("/events/{event_id}/register", post(events::register))
        .route("/events/{event_id}/checkin", post(events::check_in))
        .route("/events/{event_id}/unregister", post(events::unregister))
        .layer(axum::middleware::from_fn(middleware::user_middleware));

    let admin_routes = Router::new()
        .route("/admin/events", post(events::create_event))
        .route("/admin/events/{event_id}", delete(events::delete_event))
        .route("/admin/events/{event_id}/status", post(events::update_status))
        .route("/admin/events/{event_id}/winner", post(events::set_winner))
        .route("/admin/events/{event_id}/award-prize", post(events::award_prize))
        .route(
            "/admin/events/{event_id}/bracket/generate",
            post(events::generate_bracket),
        )
        .route(
            "/admin/events/{event_id}/matches/{match_id}/result",
            post(events::resolve_match),
        )
        .route(
            "/admin/events/{event_id}/matches/{match_id}/schedule",
            post(events::schedule_match),
        )
        .route(
            "/admin/events/{event_id}/matches/{match_id}/update",
            post(events::update_match),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admin_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the event store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"ok":true,"status":"healthy","store":true,"events":{"active_count":2},...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.event_manager.repository().health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Event store health check failed: {}", e);
            false
        }
    };

    let active_count = state.event_manager.active_event_count().await;
    crate::metrics::active_events(active_count);

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "ok": store_healthy,
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "events": {
            "active_count": active_count
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

//! Event API handlers.
//!
//! Public reads, user registration endpoints and admin bracket operations.
//! Handlers are thin: each forwards to the [`EventManager`](arena::EventManager),
//! which routes the request to the event's actor.
//!
//! # Examples
//!
//! Register for an event:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/events/$EVENT/register \
//!   -H "X-User-Id: user1" \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "solo", "username": "player1"}'
//! ```
//!
//! Record a match result:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/admin/events/$EVENT/matches/R0-M0/result \
//!   -H "Authorization: Bearer $ADMIN_TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"winnerId": "user1"}'
//! ```

use arena::{
    BracketError, Brackets, Event, EventError, Match, MatchOutcome, Registration, SlotUpdate,
    db::StoreError,
    event::{EventId, EventWinner, NewEvent, RegistrationRequest, StatusUpdate},
    wallet::WalletError,
};
use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{AppState, middleware::CallerId};
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self { ok: false, error }
    }
}

/// Successful response: `{"ok": true, ...fields of T}`
#[derive(Debug, Serialize)]
pub struct OkResponse<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub body: T,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<OkResponse<T>>, ApiError>;

fn ok<T>(body: T) -> ApiResult<T> {
    Ok(Json(OkResponse { ok: true, body }))
}

/// HTTP status for an event service error
pub fn status_for(err: &EventError) -> StatusCode {
    match err {
        EventError::NotFound(_)
        | EventError::TeamNotFound(_)
        | EventError::NotRegistered
        | EventError::Store(StoreError::NotFound(_))
        | EventError::Bracket(BracketError::MatchNotFound(_)) => StatusCode::NOT_FOUND,
        EventError::AlreadyRegistered
        | EventError::Bracket(BracketError::AlreadyDecided(_))
        | EventError::Store(StoreError::Conflict { .. })
        | EventError::Store(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
        EventError::NotCaptain => StatusCode::FORBIDDEN,
        EventError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EventError::Store(_) | EventError::Wallet(WalletError::Database(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

fn api_error(err: EventError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Event request failed: {}", err);
    }
    (status, Json(ErrorResponse::new(err.client_message())))
}

/// Deserialize a present field as `Some(value)`, keeping `null` distinct from absent
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct EventBody {
    pub event: Event,
}

#[derive(Debug, Serialize)]
pub struct RegistrationBody {
    pub registration: Registration,
}

#[derive(Debug, Serialize)]
pub struct RefundBody {
    pub refunded: i64,
}

#[derive(Debug, Serialize)]
pub struct WinnerBody {
    pub winner: EventWinner,
}

#[derive(Debug, Serialize)]
pub struct BalanceBody {
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct OutcomeBody {
    pub outcome: MatchOutcome,
}

#[derive(Debug, Serialize)]
pub struct MatchBody {
    #[serde(rename = "match")]
    pub matchup: Match,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

/// Body of check-in and unregister; `teamId` selects a team registration
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSelector {
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultRequest {
    pub winner_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// Omitted or `null` clears the schedule
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Slot overrides: absent keeps, `null` or `""` clears, an id seats
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMatchRequest {
    #[serde(default, deserialize_with = "present")]
    pub participant1: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub participant2: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWinnerRequest {
    pub winner_id: String,
    pub winner_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardPrizeRequest {
    pub user_id: String,
    pub amount: i64,
}

/// `GET /api/v1/events`
pub async fn list_events(State(state): State<AppState>) -> ApiResult<EventList> {
    let events = state.event_manager.list_events().await.map_err(api_error)?;
    ok(EventList { events })
}

/// `GET /api/v1/events/{id}`
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<EventBody> {
    let event = state
        .event_manager
        .get_event(event_id)
        .await
        .map_err(api_error)?;
    ok(EventBody { event })
}

/// `POST /api/v1/events/{id}/register`
///
/// Body is `{"type": "solo", "username": ...}` or `{"type": "team", "teamId": ...}`.
/// A team's captain and roster come from the team directory. The entry fee
/// is debited from the caller.
///
/// # Errors
///
/// - `400 Bad Request`: Closed registration, wrong mode, oversized team, insufficient credits
/// - `403 Forbidden`: Caller is not the team captain
/// - `404 Not Found`: Unknown event or team
/// - `409 Conflict`: Already registered
pub async fn register(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    Json(request): Json<RegistrationRequest>,
) -> ApiResult<RegistrationBody> {
    let kind = match request {
        RegistrationRequest::Solo { .. } => "solo",
        RegistrationRequest::Team { .. } => "team",
    };
    let registration = state
        .event_manager
        .register(event_id, &user_id, request)
        .await
        .map_err(api_error)?;

    metrics::registrations_total(kind);
    ok(RegistrationBody { registration })
}

/// `POST /api/v1/events/{id}/checkin`
pub async fn check_in(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    body: Option<Json<TeamSelector>>,
) -> ApiResult<RegistrationBody> {
    let selector = body.map(|Json(selector)| selector).unwrap_or_default();
    let registration = state
        .event_manager
        .check_in(event_id, &user_id, selector.team_id.as_deref())
        .await
        .map_err(api_error)?;
    ok(RegistrationBody { registration })
}

/// `POST /api/v1/events/{id}/unregister`
///
/// Returns the refunded entry fee.
pub async fn unregister(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Extension(CallerId(user_id)): Extension<CallerId>,
    body: Option<Json<TeamSelector>>,
) -> ApiResult<RefundBody> {
    let selector = body.map(|Json(selector)| selector).unwrap_or_default();
    let refunded = state
        .event_manager
        .unregister(event_id, &user_id, selector.team_id.as_deref())
        .await
        .map_err(api_error)?;
    ok(RefundBody { refunded })
}

/// `POST /api/v1/admin/events`
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<NewEvent>,
) -> Result<(StatusCode, Json<OkResponse<EventBody>>), ApiError> {
    let event = state
        .event_manager
        .create_event(request)
        .await
        .map_err(api_error)?;

    logging::log_admin_action("create_event", &event.id.to_string(), &event.name);
    Ok((
        StatusCode::CREATED,
        Json(OkResponse {
            ok: true,
            body: EventBody { event },
        }),
    ))
}

/// `DELETE /api/v1/admin/events/{id}`
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Empty> {
    state
        .event_manager
        .delete_event(event_id)
        .await
        .map_err(api_error)?;

    logging::log_admin_action("delete_event", &event_id.to_string(), "");
    ok(Empty {})
}

/// `POST /api/v1/admin/events/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<EventBody> {
    let detail = update.status.to_string();
    let event = state
        .event_manager
        .update_event_status(event_id, update)
        .await
        .map_err(api_error)?;

    logging::log_admin_action("update_status", &event_id.to_string(), &detail);
    ok(EventBody { event })
}

/// `POST /api/v1/admin/events/{id}/winner`
pub async fn set_winner(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Json(request): Json<SetWinnerRequest>,
) -> ApiResult<WinnerBody> {
    let winner = state
        .event_manager
        .set_winner(event_id, &request.winner_id, &request.winner_name)
        .await
        .map_err(api_error)?;

    logging::log_admin_action("set_winner", &event_id.to_string(), &winner.id);
    ok(WinnerBody { winner })
}

/// `POST /api/v1/admin/events/{id}/award-prize`
///
/// Returns the recipient's new wallet balance.
pub async fn award_prize(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Json(request): Json<AwardPrizeRequest>,
) -> ApiResult<BalanceBody> {
    let balance = state
        .event_manager
        .award_prize(event_id, &request.user_id, request.amount)
        .await
        .map_err(api_error)?;

    logging::log_admin_action(
        "award_prize",
        &event_id.to_string(),
        &format!("{} -> {}", request.amount, request.user_id),
    );
    ok(BalanceBody { balance })
}

/// `POST /api/v1/admin/events/{id}/bracket/generate`
///
/// Rebuilds the brackets from the current registrations, discarding any
/// results already recorded.
pub async fn generate_bracket(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> ApiResult<Brackets> {
    let brackets = state
        .event_manager
        .generate_bracket(event_id)
        .await
        .map_err(api_error)?;

    let elimination = if brackets.loser_bracket.is_some() {
        "double"
    } else {
        "single"
    };
    metrics::brackets_generated_total(elimination);
    metrics::active_events(state.event_manager.active_event_count().await);
    logging::log_admin_action("generate_bracket", &event_id.to_string(), elimination);
    ok(brackets)
}

/// `POST /api/v1/admin/events/{id}/matches/{match_id}/result`
///
/// # Errors
///
/// - `400 Bad Request`: Winner is not a participant (strict validation) or slot empty
/// - `404 Not Found`: Unknown event or match
/// - `409 Conflict`: Match already decided, or concurrent modification
pub async fn resolve_match(
    State(state): State<AppState>,
    Path((event_id, match_id)): Path<(EventId, String)>,
    Json(request): Json<MatchResultRequest>,
) -> ApiResult<OutcomeBody> {
    let result = state
        .event_manager
        .resolve_match(event_id, &match_id, &request.winner_id)
        .await;

    let outcome = match result {
        Ok(outcome) => {
            metrics::match_results_total(if outcome.is_final { "final" } else { "advanced" });
            outcome
        }
        Err(err) => {
            metrics::match_results_total(match &err {
                EventError::Bracket(BracketError::AlreadyDecided(_)) => "already_decided",
                EventError::Bracket(BracketError::InvalidWinner { .. }) => "invalid_winner",
                EventError::Bracket(BracketError::MatchNotFound(_)) => "match_not_found",
                _ => "error",
            });
            return Err(api_error(err));
        }
    };

    logging::log_admin_action(
        "resolve_match",
        &event_id.to_string(),
        &format!("{} -> {}", outcome.match_id, outcome.winner.id),
    );
    ok(OutcomeBody { outcome })
}

/// `POST /api/v1/admin/events/{id}/matches/{match_id}/schedule`
pub async fn schedule_match(
    State(state): State<AppState>,
    Path((event_id, match_id)): Path<(EventId, String)>,
    body: Option<Json<ScheduleRequest>>,
) -> ApiResult<MatchBody> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let matchup = state
        .event_manager
        .schedule_match(event_id, &match_id, request.scheduled_time)
        .await
        .map_err(api_error)?;
    ok(MatchBody { matchup })
}

/// `POST /api/v1/admin/events/{id}/matches/{match_id}/update`
///
/// Manual override of winner-bracket slots, seated from the registrations.
pub async fn update_match(
    State(state): State<AppState>,
    Path((event_id, match_id)): Path<(EventId, String)>,
    Json(request): Json<UpdateMatchRequest>,
) -> ApiResult<MatchBody> {
    let matchup = state
        .event_manager
        .override_participants(
            event_id,
            &match_id,
            SlotUpdate::from_field(request.participant1),
            SlotUpdate::from_field(request.participant2),
        )
        .await
        .map_err(api_error)?;

    logging::log_admin_action("update_match", &event_id.to_string(), &match_id);
    ok(MatchBody { matchup })
}

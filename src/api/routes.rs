//! JSON routes over the domain services

use crate::accounts::AccountRequest;
use crate::api::auth::{Authenticated, Caller};
use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::availability::WindowInput;
use crate::preferences::MatchmakingPreferences;
use crate::profile::{NewProfile, ProfileChanges};
use crate::rating::{RatingOutcome, RatingSubmission};
use crate::session::{LeaveSummary, QueueTicket, SessionRequest, SessionView};
use crate::types::*;
use axum::{
    extract::{MatchedPath, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use tracing::debug;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Router with every API route, authenticated and instrumented
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/games", get(list_games))
        .route("/api/profiles", post(register))
        .route(
            "/api/profiles/me",
            get(current_profile).put(edit_profile).delete(deactivate),
        )
        .route("/api/availability", get(list_availability).post(add_availability))
        .route(
            "/api/availability/{id}",
            put(edit_availability).delete(remove_availability),
        )
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/rating", post(rate_session))
        .route(
            "/api/queue",
            get(current_queue).post(join_queue).delete(leave_queue),
        )
        .route(
            "/api/preferences",
            get(get_preferences).put(save_preferences),
        )
        .route("/api/accounts", get(list_accounts).post(connect_account))
        .route("/api/accounts/{id}", delete(disconnect_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .with_state(state)
}

/// Count every routed response by route template and status
async fn track_requests(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().clone();

    let response = next.run(request).await;
    debug!("{} {} -> {}", method, route, response.status());
    state
        .metrics()
        .record_http_request(&route, response.status().as_u16());
    response
}

async fn list_games(_auth: Authenticated, State(state): State<ApiState>) -> ApiResult<Json<Vec<Game>>> {
    Ok(Json(state.services().list_games()?))
}

// Profiles

async fn register(
    _auth: Authenticated,
    State(state): State<ApiState>,
    Json(input): Json<NewProfile>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    let profile = state.services().profiles.register(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn current_profile(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.services().profiles.get(ctx.profile_id).await?))
}

async fn edit_profile(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Json(changes): Json<ProfileChanges>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.services().profiles.edit(&ctx, changes).await?))
}

async fn deactivate(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.services().profiles.deactivate(&ctx).await?))
}

// Availability

async fn list_availability(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<Availability>>> {
    Ok(Json(state.services().availability.list(&ctx).await?))
}

async fn add_availability(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Json(input): Json<WindowInput>,
) -> ApiResult<(StatusCode, Json<Availability>)> {
    let window = state.services().availability.add(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(window)))
}

async fn edit_availability(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Path(id): Path<AvailabilityId>,
    Json(input): Json<WindowInput>,
) -> ApiResult<Json<Availability>> {
    Ok(Json(state.services().availability.edit(&ctx, id, input).await?))
}

async fn remove_availability(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Path(id): Path<AvailabilityId>,
) -> ApiResult<StatusCode> {
    state.services().availability.remove(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Sessions

async fn create_session(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Json(request): Json<SessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let view = state.services().sessions.create_session(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    _auth: Authenticated,
    State(state): State<ApiState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    Ok(Json(state.services().sessions.get_session(id).await?))
}

async fn rate_session(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Path(id): Path<SessionId>,
    Json(submission): Json<RatingSubmission>,
) -> ApiResult<Json<RatingOutcome>> {
    Ok(Json(
        state.services().ratings.submit(&ctx, id, submission).await?,
    ))
}

// Queue

async fn current_queue(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<Json<Option<SessionProfile>>> {
    Ok(Json(state.services().sessions.current_queue(&ctx).await?))
}

async fn join_queue(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<(StatusCode, Json<QueueTicket>)> {
    let ticket = state.services().sessions.join_queue(&ctx).await?;
    let status = if ticket.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ticket)))
}

async fn leave_queue(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<Json<LeaveSummary>> {
    Ok(Json(state.services().sessions.leave_queue(&ctx).await?))
}

// Preferences

async fn get_preferences(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<Json<MatchmakingPreferences>> {
    Ok(Json(state.services().preferences.get(&ctx).await?))
}

async fn save_preferences(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Json(preferences): Json<MatchmakingPreferences>,
) -> ApiResult<Json<MatchmakingPreferences>> {
    Ok(Json(
        state.services().preferences.save(&ctx, preferences).await?,
    ))
}

// Connected accounts

async fn list_accounts(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<ConnectedAccount>>> {
    Ok(Json(state.services().accounts.list(&ctx).await?))
}

async fn connect_account(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Json(request): Json<AccountRequest>,
) -> ApiResult<(StatusCode, Json<ConnectedAccount>)> {
    let account = state.services().accounts.connect(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn disconnect_account(
    Caller(ctx): Caller,
    State(state): State<ApiState>,
    Path(id): Path<AccountId>,
) -> ApiResult<StatusCode> {
    state.services().accounts.disconnect(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

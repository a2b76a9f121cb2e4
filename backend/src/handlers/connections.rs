use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{api_error, internal_error, match_error, ApiFailure, ApiResult, AppState};
use crate::{
    db,
    matching::{can_send_request, resolve, resolve_with_report, state_for, StateMap},
    models::{Connection, ConnectionRequest, UserId},
};

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub current_user_id: UserId,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub incoming: Vec<ConnectionRequest>,
    #[serde(default)]
    pub outgoing: Vec<ConnectionRequest>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub states: StateMap,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
pub struct SendConnectionRequest {
    pub from_user_id: UserId,
    pub to_user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    pub user_id: UserId,
}

/// Resolve states for records supplied by the caller.
pub async fn resolve_states(Json(req): Json<ResolveRequest>) -> ApiResult<ResolveResponse> {
    let (states, report) = resolve_with_report(req.current_user_id, &req.connections, &req.incoming, &req.outgoing)
        .map_err(match_error)?;

    Ok(Json(ResolveResponse {
        states,
        skipped: report.skipped.len(),
    }))
}

pub async fn connection_states(
    State((pool, _config)): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<ResolveResponse> {
    let records = db::connections::load_relationship_records(&pool, user_id)
        .await
        .map_err(|e| internal_error("Failed to load connections", e))?;

    let (states, report) = resolve_with_report(user_id, &records.connections, &records.incoming, &records.outgoing)
        .map_err(match_error)?;

    Ok(Json(ResolveResponse {
        states,
        skipped: report.skipped.len(),
    }))
}

async fn require_profile(pool: &PgPool, user_id: UserId) -> Result<(), ApiFailure> {
    match db::profiles::get_profile(pool, user_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, format!("Profile {} not found", user_id))),
        Err(e) => Err(internal_error("Failed to load profile", e)),
    }
}

async fn load_request(pool: &PgPool, request_id: Uuid) -> Result<ConnectionRequest, ApiFailure> {
    db::connections::get_request(pool, request_id)
        .await
        .map_err(|e| internal_error("Failed to load connection request", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Connection request {} not found", request_id)))
}

fn already_responded(request: &ConnectionRequest) -> ApiFailure {
    api_error(
        StatusCode::CONFLICT,
        format!("Connection request {} is already {}", request.id, request.status),
    )
}

fn no_longer_pending(request_id: Uuid) -> ApiFailure {
    api_error(
        StatusCode::CONFLICT,
        format!("Connection request {} is no longer pending", request_id),
    )
}

/// Which side of a request may perform an action on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Sender,
    Recipient,
}

/// A request can only be acted on by the right party, and only while pending.
fn check_actionable(request: &ConnectionRequest, user_id: UserId, party: Party, action: &str) -> Result<(), ApiFailure> {
    let owner = match party {
        Party::Sender => request.from_user_id,
        Party::Recipient => request.to_user_id,
    };
    if owner != user_id {
        let who = match party {
            Party::Sender => "sender",
            Party::Recipient => "recipient",
        };
        return Err(api_error(
            StatusCode::FORBIDDEN,
            format!("Only the {} can {} a request", who, action),
        ));
    }
    if request.status.is_final() {
        return Err(already_responded(request));
    }
    Ok(())
}

/// Reject a send unless the resolved state between the two users is `none`.
fn check_can_send(from_user_id: UserId, to_user_id: UserId, states: &StateMap) -> Result<(), ApiFailure> {
    if from_user_id == to_user_id {
        return Err(api_error(StatusCode::BAD_REQUEST, "Cannot send a connection request to yourself"));
    }
    let state = state_for(states, to_user_id);
    if !can_send_request(state) {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("Cannot send a request to {} while the connection is {}", to_user_id, state),
        ));
    }
    Ok(())
}

pub async fn send_request(
    State((pool, _config)): State<AppState>,
    Json(req): Json<SendConnectionRequest>,
) -> ApiResult<ConnectionRequest> {
    check_can_send(req.from_user_id, req.to_user_id, &StateMap::new())?;
    require_profile(&pool, req.from_user_id).await?;
    require_profile(&pool, req.to_user_id).await?;

    let records = db::connections::load_relationship_records(&pool, req.from_user_id)
        .await
        .map_err(|e| internal_error("Failed to load connections", e))?;
    let states = resolve(req.from_user_id, &records.connections, &records.incoming, &records.outgoing)
        .map_err(match_error)?;
    check_can_send(req.from_user_id, req.to_user_id, &states)?;

    let request = db::connections::send_request(&pool, req.from_user_id, req.to_user_id)
        .await
        .map_err(|e| internal_error("Failed to send connection request", e))?
        .ok_or_else(|| api_error(StatusCode::CONFLICT, "A pending request already exists"))?;

    tracing::info!(
        "Connection request {} sent: {} -> {}",
        request.id,
        request.from_user_id,
        request.to_user_id
    );
    Ok(Json(request))
}

pub async fn accept_request(
    State((pool, _config)): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> ApiResult<ConnectionRequest> {
    let existing = load_request(&pool, request_id).await?;
    check_actionable(&existing, req.user_id, Party::Recipient, "accept")?;

    let accepted = db::connections::accept_request(&pool, request_id)
        .await
        .map_err(|e| internal_error("Failed to accept connection request", e))?
        .ok_or_else(|| no_longer_pending(request_id))?;

    tracing::info!(
        "Connection request {} accepted: {} <-> {} connected",
        accepted.id,
        accepted.from_user_id,
        accepted.to_user_id
    );
    Ok(Json(accepted))
}

pub async fn decline_request(
    State((pool, _config)): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> ApiResult<ConnectionRequest> {
    let existing = load_request(&pool, request_id).await?;
    check_actionable(&existing, req.user_id, Party::Recipient, "decline")?;

    let declined = db::connections::decline_request(&pool, request_id)
        .await
        .map_err(|e| internal_error("Failed to decline connection request", e))?
        .ok_or_else(|| no_longer_pending(request_id))?;

    tracing::info!("Connection request {} declined", declined.id);
    Ok(Json(declined))
}

pub async fn cancel_request(
    State((pool, _config)): State<AppState>,
    Path(request_id): Path<Uuid>,
    Query(query): Query<CancelQuery>,
) -> Result<StatusCode, ApiFailure> {
    let existing = load_request(&pool, request_id).await?;
    check_actionable(&existing, query.user_id, Party::Sender, "cancel")?;

    let removed = db::connections::cancel_request(&pool, request_id, query.user_id)
        .await
        .map_err(|e| internal_error("Failed to cancel connection request", e))?;
    if !removed {
        return Err(no_longer_pending(request_id));
    }

    tracing::info!("Connection request {} cancelled by {}", request_id, query.user_id);
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{api_error, internal_error, match_error, profiles::SearchQuery, ApiResult, AppState};
use crate::{
    constants::{CANDIDATE_POOL_LIMIT, PROFILE_SEARCH_LIMIT},
    db,
    matching::{rank_candidates, resolve, score_pair, Compatibility, MatchCandidate},
    models::UserProfile,
};

#[derive(Debug, Deserialize)]
pub struct CompatibilityRequest {
    pub viewer: Option<UserProfile>,
    pub candidate: Option<UserProfile>,
}

/// Score two profiles supplied by the caller.
pub async fn check_compatibility(Json(req): Json<CompatibilityRequest>) -> ApiResult<Compatibility> {
    score_pair(req.viewer.as_ref(), req.candidate.as_ref())
        .map(Json)
        .map_err(match_error)
}

/// Ranked match list for one user. With `q` or `experience` the candidates
/// come from a profile search instead of the whole directory.
pub async fn list_matches(
    State((pool, config)): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<MatchCandidate>> {
    let viewer = db::profiles::get_profile(&pool, user_id)
        .await
        .map_err(|e| internal_error("Failed to load profile", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Profile {} not found", user_id)))?;

    let candidates = if query.is_filtered() {
        let experience = query.experience_level().map_err(match_error)?;
        db::profiles::search_profiles(&pool, query.q.as_deref(), experience, PROFILE_SEARCH_LIMIT).await
    } else {
        db::profiles::list_profiles_except(&pool, user_id, CANDIDATE_POOL_LIMIT).await
    }
    .map_err(|e| internal_error("Failed to load candidates", e))?;

    let records = db::connections::load_relationship_records(&pool, user_id)
        .await
        .map_err(|e| internal_error("Failed to load connections", e))?;
    let states = resolve(user_id, &records.connections, &records.incoming, &records.outgoing)
        .map_err(match_error)?;

    let mut ranked = rank_candidates(&viewer, &candidates, &states);
    ranked.truncate(config.match_limit);

    tracing::debug!(
        "Ranked {} of {} candidates for {}",
        ranked.len(),
        candidates.len(),
        user_id
    );
    Ok(Json(ranked))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::{api_error, internal_error, match_error, ApiResult, AppState};
use crate::{
    constants::PROFILE_SEARCH_LIMIT,
    db,
    models::{ExperienceLevel, NewProfile, Pattern, UserProfile},
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub experience: Option<String>,
}

impl SearchQuery {
    pub fn experience_level(&self) -> Result<Option<ExperienceLevel>, crate::error::MatchError> {
        self.experience
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .map(str::parse)
            .transpose()
    }

    pub fn is_filtered(&self) -> bool {
        self.q.as_deref().is_some_and(|q| !q.trim().is_empty())
            || self.experience.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct PatternUpdate {
    #[serde(default)]
    pub known_patterns: BTreeSet<String>,
    #[serde(default)]
    pub want_to_learn_patterns: BTreeSet<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatternQuery {
    pub difficulty: Option<String>,
}

impl PatternQuery {
    /// A blank `difficulty` means no filter.
    pub fn difficulty_level(&self) -> Result<Option<ExperienceLevel>, crate::error::MatchError> {
        self.difficulty
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(str::parse)
            .transpose()
    }
}

pub async fn create_profile(
    State((pool, _config)): State<AppState>,
    Json(new): Json<NewProfile>,
) -> ApiResult<UserProfile> {
    if new.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Profile name must not be empty"));
    }

    let profile = db::profiles::create_profile(&pool, &new)
        .await
        .map_err(|e| internal_error("Failed to create profile", e))?;

    tracing::info!("Created profile {} ({})", profile.id, profile.experience);
    Ok(Json(profile))
}

pub async fn get_profile(
    State((pool, _config)): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserProfile> {
    db::profiles::get_profile(&pool, id)
        .await
        .map_err(|e| internal_error("Failed to load profile", e))?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Profile {} not found", id)))
}

pub async fn search_profiles(
    State((pool, _config)): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<UserProfile>> {
    let experience = query.experience_level().map_err(match_error)?;

    let profiles = db::profiles::search_profiles(&pool, query.q.as_deref(), experience, PROFILE_SEARCH_LIMIT)
        .await
        .map_err(|e| internal_error("Failed to search profiles", e))?;

    Ok(Json(profiles))
}

pub async fn update_patterns(
    State((pool, _config)): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<PatternUpdate>,
) -> ApiResult<UserProfile> {
    let profile = db::profiles::set_profile_patterns(
        &pool,
        id,
        &update.known_patterns,
        &update.want_to_learn_patterns,
    )
    .await
    .map_err(|e| internal_error("Failed to update patterns", e))?
    .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Profile {} not found", id)))?;

    tracing::debug!(
        "Profile {} now knows {} and wants {} patterns",
        id,
        profile.known_patterns.len(),
        profile.want_to_learn_patterns.len()
    );
    Ok(Json(profile))
}

pub async fn list_patterns(
    State((pool, _config)): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> ApiResult<Vec<Pattern>> {
    let difficulty = query.difficulty_level().map_err(match_error)?;

    let patterns = db::patterns::list_patterns(&pool, difficulty)
        .await
        .map_err(|e| internal_error("Failed to list patterns", e))?;

    Ok(Json(patterns))
}

//! User directory.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use steward_core::User;

use crate::error::{ApiError, ApiResult};
use crate::identity::Identity;
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Users whose email starts with `q`, for participant autocomplete.
pub async fn search_users(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let prefix = query.q.trim();
    if prefix.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    Ok(Json(
        state.db.users.search_by_email_prefix(prefix, limit).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
    pub name: String,
}

/// Create or update the caller's profile.
pub async fn upsert_me(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<ProfileBody>,
) -> ApiResult<Json<User>> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    Ok(Json(state.db.users.upsert(identity.as_str(), name).await?))
}

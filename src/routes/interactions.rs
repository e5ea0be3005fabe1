use crate::{
    error::{AppError, Result},
    models::{
        interaction::{BookmarkQuery, InteractionLookupRequest, ToggleBookmarkRequest, ToggleVoteRequest},
        response::ApiResponse,
    },
    state::AppState,
    utils::middleware::{current_user_middleware, CurrentUser},
};
use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/vote", post(toggle_vote))
        .route("/bookmark", post(toggle_bookmark))
        .route("/items/:item_id", get(get_interaction))
        .route("/lookup", post(lookup_interactions))
        .route("/bookmarks", get(list_bookmarks))
        .route_layer(middleware::from_fn_with_state(state, current_user_middleware))
}

fn envelope<T: serde::Serialize>(data: T) -> Result<Json<Value>> {
    Ok(Json(serde_json::to_value(ApiResponse::success(data))?))
}

/// Toggle the current user's vote on an item
/// POST /api/interactions/vote
async fn toggle_vote(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<ToggleVoteRequest>,
) -> Result<Json<Value>> {
    debug!("Vote {} on {} by user: {}", request.vote, request.item_id, user.id);
    request.validate()?;

    let record = state
        .interaction_service
        .toggle_vote(&request.item_id, request.item_type, &user.id, request.vote)
        .await?;

    envelope(record)
}

/// Set or clear the current user's bookmark on an item
/// POST /api/interactions/bookmark
async fn toggle_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<ToggleBookmarkRequest>,
) -> Result<Json<Value>> {
    debug!(
        "Bookmark={} on {} by user: {}",
        request.is_bookmarked, request.item_id, user.id
    );
    request.validate()?;

    let record = state
        .interaction_service
        .toggle_bookmark(&request.item_id, request.item_type, &user.id, request.is_bookmarked)
        .await?;

    envelope(record)
}

/// The current user's interaction with one item, `null` when there is none
/// GET /api/interactions/items/:item_id
async fn get_interaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>> {
    let record = state
        .query_service
        .get_interaction(&item_id, &user.id)
        .await?;

    envelope(record)
}

/// POST /api/interactions/lookup
async fn lookup_interactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<InteractionLookupRequest>,
) -> Result<Json<Value>> {
    request.validate()?;
    if request.item_ids.iter().any(|id| id.is_empty()) {
        return Err(AppError::validation("item_ids must not contain empty ids"));
    }

    let records = state
        .query_service
        .get_interactions(&request.item_ids, &user.id)
        .await?;

    envelope(records)
}

/// Get the current user's bookmarks
/// GET /api/interactions/bookmarks
async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<BookmarkQuery>,
) -> Result<Json<Value>> {
    let page = state
        .query_service
        .list_bookmarks_page(&user.id, query)
        .await?;

    envelope(page)
}

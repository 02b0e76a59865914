use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::middleware::{require_admin, require_authenticated},
    error::ApiError,
    ids::generate_id,
    state::AppState,
};

use super::dto::{CreateRiddle, Pagination, UpdateRiddle};
use super::repo::Riddle;

pub fn router(state: &AppState) -> Router<AppState> {
    let read = Router::new()
        .route("/riddles", get(list_riddles))
        .route("/riddles/:id", get(get_riddle));

    let write = Router::new()
        .route("/riddles", post(create_riddle))
        .route(
            "/riddles/:id",
            axum::routing::patch(update_riddle).delete(delete_riddle),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ));

    read.merge(write)
}

#[instrument(skip(state))]
pub async fn list_riddles(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Riddle>>, ApiError> {
    let riddles = Riddle::list(&state.db, p.limit, p.offset).await?;
    Ok(Json(riddles))
}

#[instrument(skip(state))]
pub async fn get_riddle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Riddle>, ApiError> {
    Riddle::find_by_id(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Riddle not found.".into()))
}

#[instrument(skip(state, payload))]
pub async fn create_riddle(
    State(state): State<AppState>,
    Json(payload): Json<CreateRiddle>,
) -> Result<(StatusCode, Json<Riddle>), ApiError> {
    if payload.question.trim().is_empty() {
        return Err(ApiError::Validation("Question is required.".into()));
    }
    if payload.answer.trim().is_empty() {
        return Err(ApiError::Validation("Answer is required.".into()));
    }

    let riddle = Riddle::create(
        &state.db,
        &generate_id("rdl"),
        &payload.question,
        &payload.answer,
        &payload.hints,
        payload.complexity_level,
    )
    .await?;

    info!(riddle_id = %riddle.id, "riddle created");
    Ok((StatusCode::CREATED, Json(riddle)))
}

#[instrument(skip(state, payload))]
pub async fn update_riddle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRiddle>,
) -> Result<Json<Riddle>, ApiError> {
    Riddle::update(
        &state.db,
        &id,
        payload.question.as_deref(),
        payload.answer.as_deref(),
        payload.hints.as_deref(),
        payload.complexity_level,
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Riddle not found.".into()))
}

#[instrument(skip(state))]
pub async fn delete_riddle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if Riddle::delete(&state.db, &id).await? {
        info!(riddle_id = %id, "riddle deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Riddle not found.".into()))
    }
}

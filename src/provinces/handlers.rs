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

use super::dto::{CreateProvince, Pagination, UpdateProvince};
use super::repo::Province;

pub fn router(state: &AppState) -> Router<AppState> {
    let read = Router::new()
        .route("/provinces", get(list_provinces))
        .route("/provinces/:id", get(get_province));

    let write = Router::new()
        .route("/provinces", post(create_province))
        .route(
            "/provinces/:id",
            axum::routing::patch(update_province).delete(delete_province),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ));

    read.merge(write)
}

#[instrument(skip(state))]
pub async fn list_provinces(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Province>>, ApiError> {
    let provinces = Province::list(&state.db, p.limit, p.offset).await?;
    Ok(Json(provinces))
}

#[instrument(skip(state))]
pub async fn get_province(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Province>, ApiError> {
    Province::find_by_id(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Province not found.".into()))
}

#[instrument(skip(state, payload))]
pub async fn create_province(
    State(state): State<AppState>,
    Json(payload): Json<CreateProvince>,
) -> Result<(StatusCode, Json<Province>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required.".into()));
    }
    if Province::find_by_name(&state.db, &payload.name).await?.is_some() {
        return Err(ApiError::Conflict("Province already exists.".into()));
    }

    let province = Province::create(
        &state.db,
        &generate_id("prv"),
        &payload.name,
        &payload.description,
        payload.latitude,
        payload.longitude,
    )
    .await?;

    info!(province_id = %province.id, "province created");
    Ok((StatusCode::CREATED, Json(province)))
}

#[instrument(skip(state, payload))]
pub async fn update_province(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProvince>,
) -> Result<Json<Province>, ApiError> {
    Province::update(
        &state.db,
        &id,
        payload.name.as_deref(),
        payload.description.as_deref(),
        payload.latitude,
        payload.longitude,
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Province not found.".into()))
}

#[instrument(skip(state))]
pub async fn delete_province(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if Province::delete(&state.db, &id).await? {
        info!(province_id = %id, "province deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Province not found.".into()))
    }
}

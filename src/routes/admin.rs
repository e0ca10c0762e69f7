use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    middleware::admin::AdminAuth,
    models::{
        operating_hour::{validate_hours, ReplaceHoursRequest},
        restaurant::{CreateRestaurantRequest, UpdateRestaurantRequest},
    },
    services::{metrics::ADMIN_WRITES_COUNTER, restaurants::RestaurantService},
    AppState,
};

const DUPLICATE_LISTING: &str = "a live restaurant with this name and address already exists";
const DUPLICATE_DAY: &str = "operating hours already exist for that day";

fn count_write(action: &str) {
    ADMIN_WRITES_COUNTER.with_label_values(&[action]).inc();
}

/// POST /admin/restaurants
pub async fn create_restaurant(
    State(state): State<AppState>,
    _auth: AdminAuth,
    body: Result<Json<CreateRestaurantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    body.validate().map_err(ApiError::BadRequest)?;

    let restaurant = RestaurantService::create(&state.db, &body)
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_LISTING))?;
    count_write("create");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(restaurant).map_err(anyhow::Error::from)?),
    ))
}

/// PUT /admin/restaurants/{id}
pub async fn update_restaurant(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
    body: Result<Json<UpdateRestaurantRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    body.validate().map_err(ApiError::BadRequest)?;

    let restaurant = RestaurantService::update(&state.db, id, &body)
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_LISTING))?
        .ok_or(ApiError::NotFound("restaurant"))?;
    count_write("update");
    Ok(Json(serde_json::to_value(restaurant).map_err(anyhow::Error::from)?))
}

/// DELETE /admin/restaurants/{id} — soft delete; hidden from every public query.
pub async fn delete_restaurant(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !RestaurantService::soft_delete(&state.db, id).await? {
        return Err(ApiError::NotFound("restaurant"));
    }
    count_write("delete");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/restaurants/{id}/restore
pub async fn restore_restaurant(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let restored = RestaurantService::restore(&state.db, id)
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_LISTING))?;
    if !restored {
        return Err(ApiError::NotFound("deleted restaurant"));
    }
    count_write("restore");
    Ok(Json(json!({ "id": id, "restored": true })))
}

/// PUT /admin/restaurants/{id}/hours — replace the weekly schedule.
pub async fn replace_hours(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
    body: Result<Json<ReplaceHoursRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    validate_hours(&body.hours).map_err(ApiError::BadRequest)?;

    let hours = RestaurantService::replace_hours(&state.db, id, &body.hours)
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_DAY))?
        .ok_or(ApiError::NotFound("restaurant"))?;
    count_write("replace_hours");
    Ok(Json(json!({ "restaurant_id": id, "hours": hours })))
}

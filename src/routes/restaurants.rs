use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    models::search::{Coordinates, FilterSet, NearbyQuery, RestaurantListQuery, SearchError},
    services::{
        clock::{parse_reference_timestamp, ReferenceInstant},
        metrics::{record_search, NEARBY_RESULTS_GAUGE},
        nearby::{search_nearby, NearbySearch},
        open_now::OpenNowPolicy,
        restaurants::RestaurantService,
    },
    AppState,
};

/// Turn raw nearby params into a search plan plus the instant it was
/// evaluated at (in the venue frame). `now` is used only when `at` is absent.
pub fn plan_nearby(
    params: NearbyQuery,
    now: DateTime<Utc>,
    venue: &FixedOffset,
    policy: OpenNowPolicy,
    max_limit: i64,
) -> Result<(NearbySearch, DateTime<FixedOffset>), SearchError> {
    let origin = Coordinates::from_parts(params.latitude, params.longitude)?;
    let filters = FilterSet::parse(
        params.features.as_deref(),
        params.max_beer_price,
        params.max_chuhai_price,
    )?;

    let at = match params.at.as_deref() {
        Some(raw) => parse_reference_timestamp(raw, venue)?,
        None => now.with_timezone(venue),
    }
    .with_timezone(venue);

    if let Some(radius) = params.radius_km {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(SearchError::InvalidNumber { field: "radius_km", value: radius });
        }
    }
    let limit = params.limit.unwrap_or(max_limit).clamp(1, max_limit);

    let open_at = params
        .open_now
        .unwrap_or(true)
        .then(|| ReferenceInstant::in_venue_frame(&at, venue));

    Ok((
        NearbySearch {
            origin,
            filters,
            open_at,
            policy,
            radius_km: params.radius_km,
            limit: usize::try_from(limit).ok(),
        },
        at,
    ))
}

/// GET /restaurants — paginated browse with text, city, feature and price filters.
pub async fn list_restaurants(
    State(state): State<AppState>,
    query: Result<Query<RestaurantListQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = query.inspect_err(|_| record_search("list", false))?;
    let plan = params
        .into_plan(state.config.search_default_limit, state.config.search_max_limit)
        .inspect_err(|_| record_search("list", false))?;

    let (entries, total) = RestaurantService::list(&state.db, &plan).await?;
    record_search("list", true);

    Ok(Json(json!({
        "entries": entries,
        "total":   total,
        "page":    plan.page,
        "limit":   plan.limit,
    })))
}

/// GET /restaurants/{id}
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let restaurant = RestaurantService::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("restaurant"))?;
    Ok(Json(serde_json::to_value(restaurant).map_err(anyhow::Error::from)?))
}

/// GET /restaurants/nearby — restaurants open at `at` (default now), nearest first.
///
/// `at` is ISO-8601; without an offset it is read as venue local time. A `+`
/// in the offset must be sent as `%2B`, a bare `+` decodes to a space.
pub async fn nearby_restaurants(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = query.inspect_err(|_| record_search("nearby", false))?;
    let policy = OpenNowPolicy {
        carry_over_previous_day: state.config.open_now_carry_over,
    };
    let (search, at) = plan_nearby(params, Utc::now(), &state.venue, policy, state.config.search_max_limit)
        .inspect_err(|e| {
            record_search("nearby", false);
            tracing::debug!("nearby search rejected: {e}");
        })?;

    let candidates = RestaurantService::search_candidates(&state.db, &search.filters).await?;
    let candidate_count = candidates.len();
    let results = search_nearby(candidates, &search);

    tracing::debug!(
        candidates = candidate_count,
        results = results.len(),
        "nearby search at {}",
        at.to_rfc3339()
    );
    record_search("nearby", true);
    NEARBY_RESULTS_GAUGE.set(results.len() as f64);

    Ok(Json(json!({
        "at":      at.to_rfc3339(),
        "count":   results.len(),
        "results": results,
    })))
}

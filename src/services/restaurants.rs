use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{
    operating_hour::{OperatingHour, OperatingHourInput, OPERATING_HOUR_COLUMNS},
    restaurant::{
        CreateRestaurantRequest, Restaurant, RestaurantWithHours, UpdateRestaurantRequest,
        RESTAURANT_COLUMNS,
    },
    search::{FilterSet, ListPlan},
};

pub struct RestaurantService;

/// Escape `%`, `_` and `\` so user text is matched literally by ILIKE.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Feature equality and price ceilings as SQL predicates. Caller has already
/// opened a WHERE clause.
fn push_filter_set(qb: &mut QueryBuilder<'_, Postgres>, filters: &FilterSet) {
    for feature in &filters.features {
        // column names come from a closed enum
        qb.push(format!(" AND {} = TRUE", feature.column()));
    }
    if let Some(max) = filters.max_beer_price {
        qb.push(" AND (beer_price IS NULL OR beer_price <= ")
            .push_bind(max)
            .push(")");
    }
    if let Some(max) = filters.max_chuhai_price {
        qb.push(" AND (chuhai_price IS NULL OR chuhai_price <= ")
            .push_bind(max)
            .push(")");
    }
}

fn push_list_predicates(qb: &mut QueryBuilder<'_, Postgres>, plan: &ListPlan) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(text) = &plan.text {
        qb.push(
            " AND concat_ws(' ', name, description, prefecture, city, address_line, building) ILIKE ",
        )
        .push_bind(like_pattern(text));
    }
    if let Some(city) = &plan.city {
        qb.push(" AND city = ").push_bind(city.clone());
    }
    push_filter_set(qb, &plan.filters);
}

impl RestaurantService {
    /// One page of live restaurants plus the total matching count.
    pub async fn list(pool: &PgPool, plan: &ListPlan) -> anyhow::Result<(Vec<Restaurant>, i64)> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants"));
        push_list_predicates(&mut qb, plan);
        qb.push(format!(
            " ORDER BY {} {} NULLS LAST, id ASC LIMIT ",
            plan.sort.column(),
            plan.order.sql()
        ))
        .push_bind(plan.limit)
        .push(" OFFSET ")
        .push_bind(plan.offset());

        let entries = qb.build_query_as::<Restaurant>().fetch_all(pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM restaurants");
        push_list_predicates(&mut count, plan);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        Ok((entries, total))
    }

    /// A live restaurant with its hours.
    pub async fn get(pool: &PgPool, id: i64) -> anyhow::Result<Option<RestaurantWithHours>> {
        let restaurant = sqlx::query_as::<_, Restaurant>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(restaurant) = restaurant else {
            return Ok(None);
        };
        let hours = Self::hours_for(pool, &[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(RestaurantWithHours { restaurant, hours }))
    }

    /// Hours for the given restaurants, grouped by restaurant and ordered by day then id.
    pub async fn hours_for(
        pool: &PgPool,
        restaurant_ids: &[i64],
    ) -> anyhow::Result<HashMap<i64, Vec<OperatingHour>>> {
        let rows = sqlx::query_as::<_, OperatingHour>(&format!(
            "SELECT {OPERATING_HOUR_COLUMNS} FROM operating_hours
             WHERE restaurant_id = ANY($1)
             ORDER BY restaurant_id, day_of_week, id"
        ))
        .bind(restaurant_ids)
        .fetch_all(pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<OperatingHour>> = HashMap::new();
        for row in rows {
            grouped.entry(row.restaurant_id).or_default().push(row);
        }
        Ok(grouped)
    }

    /// Every live restaurant with a position, with its hours. Input to the
    /// nearby pipeline; cheap SQL-side filters are applied here too.
    pub async fn search_candidates(
        pool: &PgPool,
        filters: &FilterSet,
    ) -> anyhow::Result<Vec<RestaurantWithHours>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants
             WHERE deleted_at IS NULL AND latitude IS NOT NULL AND longitude IS NOT NULL"
        ));
        push_filter_set(&mut qb, filters);
        qb.push(" ORDER BY id");
        let restaurants = qb.build_query_as::<Restaurant>().fetch_all(pool).await?;

        let ids: Vec<i64> = restaurants.iter().map(|r| r.id).collect();
        let mut hours = Self::hours_for(pool, &ids).await?;

        Ok(restaurants
            .into_iter()
            .map(|restaurant| {
                let hours = hours.remove(&restaurant.id).unwrap_or_default();
                RestaurantWithHours { restaurant, hours }
            })
            .collect())
    }

    pub async fn create(pool: &PgPool, req: &CreateRestaurantRequest) -> anyhow::Result<Restaurant> {
        let restaurant = sqlx::query_as::<_, Restaurant>(&format!(
            "INSERT INTO restaurants (
                 name, postal_code, prefecture, city, address_line, building, phone, description,
                 latitude, longitude, is_standing, accepts_credit_card, smoking_allowed,
                 has_happy_hour, morning_service, daytime_service, has_tv, has_counter_seats,
                 solo_friendly, credit_card_note, smoking_note, happy_hour_note,
                 beer_price, chuhai_price)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                     $17, $18, $19, $20, $21, $22, $23, $24)
             RETURNING {RESTAURANT_COLUMNS}"
        ))
        .bind(req.name.trim())
        .bind(&req.postal_code)
        .bind(&req.prefecture)
        .bind(&req.city)
        .bind(&req.address_line)
        .bind(&req.building)
        .bind(&req.phone)
        .bind(&req.description)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.is_standing)
        .bind(req.accepts_credit_card)
        .bind(req.smoking_allowed)
        .bind(req.has_happy_hour)
        .bind(req.morning_service)
        .bind(req.daytime_service)
        .bind(req.has_tv)
        .bind(req.has_counter_seats)
        .bind(req.solo_friendly)
        .bind(&req.credit_card_note)
        .bind(&req.smoking_note)
        .bind(&req.happy_hour_note)
        .bind(req.beer_price)
        .bind(req.chuhai_price)
        .fetch_one(pool)
        .await?;

        tracing::info!(id = restaurant.id, "restaurant created");
        Ok(restaurant)
    }

    /// Partial update of a live restaurant. `None` when it does not exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: &UpdateRestaurantRequest,
    ) -> anyhow::Result<Option<Restaurant>> {
        let restaurant = sqlx::query_as::<_, Restaurant>(&format!(
            "UPDATE restaurants
             SET name                = COALESCE($1, name),
                 postal_code         = COALESCE($2, postal_code),
                 prefecture          = COALESCE($3, prefecture),
                 city                = COALESCE($4, city),
                 address_line        = COALESCE($5, address_line),
                 building            = COALESCE($6, building),
                 phone               = COALESCE($7, phone),
                 description         = COALESCE($8, description),
                 latitude            = CASE WHEN $26 THEN NULL ELSE COALESCE($9, latitude) END,
                 longitude           = CASE WHEN $26 THEN NULL ELSE COALESCE($10, longitude) END,
                 is_standing         = COALESCE($11, is_standing),
                 accepts_credit_card = COALESCE($12, accepts_credit_card),
                 smoking_allowed     = COALESCE($13, smoking_allowed),
                 has_happy_hour      = COALESCE($14, has_happy_hour),
                 morning_service     = COALESCE($15, morning_service),
                 daytime_service     = COALESCE($16, daytime_service),
                 has_tv              = COALESCE($17, has_tv),
                 has_counter_seats   = COALESCE($18, has_counter_seats),
                 solo_friendly       = COALESCE($19, solo_friendly),
                 credit_card_note    = COALESCE($20, credit_card_note),
                 smoking_note        = COALESCE($21, smoking_note),
                 happy_hour_note     = COALESCE($22, happy_hour_note),
                 beer_price          = CASE WHEN $27 THEN NULL ELSE COALESCE($23, beer_price) END,
                 chuhai_price        = CASE WHEN $28 THEN NULL ELSE COALESCE($24, chuhai_price) END,
                 updated_at          = NOW()
             WHERE id = $25 AND deleted_at IS NULL
             RETURNING {RESTAURANT_COLUMNS}"
        ))
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.postal_code)
        .bind(&req.prefecture)
        .bind(&req.city)
        .bind(&req.address_line)
        .bind(&req.building)
        .bind(&req.phone)
        .bind(&req.description)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.is_standing)
        .bind(req.accepts_credit_card)
        .bind(req.smoking_allowed)
        .bind(req.has_happy_hour)
        .bind(req.morning_service)
        .bind(req.daytime_service)
        .bind(req.has_tv)
        .bind(req.has_counter_seats)
        .bind(req.solo_friendly)
        .bind(&req.credit_card_note)
        .bind(&req.smoking_note)
        .bind(&req.happy_hour_note)
        .bind(req.beer_price)
        .bind(req.chuhai_price)
        .bind(id)
        .bind(req.clear_location)
        .bind(req.clear_beer_price)
        .bind(req.clear_chuhai_price)
        .fetch_optional(pool)
        .await?;

        if restaurant.is_some() {
            tracing::info!(id, "restaurant updated");
        }
        Ok(restaurant)
    }

    /// Mark a restaurant deleted. Returns false if it was missing or already deleted.
    pub async fn soft_delete(pool: &PgPool, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE restaurants SET deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        let deleted = result.rows_affected() == 1;
        if deleted {
            tracing::info!(id, "restaurant soft-deleted");
        }
        Ok(deleted)
    }

    /// Undo a soft delete. Returns false unless the restaurant was deleted.
    pub async fn restore(pool: &PgPool, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE restaurants SET deleted_at = NULL, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        let restored = result.rows_affected() == 1;
        if restored {
            tracing::info!(id, "restaurant restored");
        }
        Ok(restored)
    }

    /// Replace the whole weekly schedule in one transaction. `None` when the
    /// restaurant is missing or deleted. Entries must already be validated.
    pub async fn replace_hours(
        pool: &PgPool,
        id: i64,
        hours: &[OperatingHourInput],
    ) -> anyhow::Result<Option<Vec<OperatingHour>>> {
        let mut tx = pool.begin().await?;

        let locked: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM restaurants WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query("DELETE FROM operating_hours WHERE restaurant_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let mut inserted = Vec::with_capacity(hours.len());
        for entry in hours {
            let row = sqlx::query_as::<_, OperatingHour>(&format!(
                "INSERT INTO operating_hours (
                     restaurant_id, day_of_week, open_time, close_time, drink_last_order_time,
                     food_last_order_time, happy_hour_start, happy_hour_end)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING {OPERATING_HOUR_COLUMNS}"
            ))
            .bind(id)
            .bind(entry.day_of_week)
            .bind(entry.open_time)
            .bind(entry.close_time)
            .bind(entry.drink_last_order_time)
            .bind(entry.food_last_order_time)
            .bind(entry.happy_hour_start)
            .bind(entry.happy_hour_end)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        sqlx::query("UPDATE restaurants SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        inserted.sort_by_key(|h| (h.day_of_week, h.id));
        tracing::info!(id, entries = inserted.len(), "operating hours replaced");
        Ok(Some(inserted))
    }

    /// Hard-delete restaurants soft-deleted before `cutoff`. Hours cascade.
    pub async fn purge_deleted(pool: &PgPool, cutoff: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM restaurants WHERE deleted_at IS NOT NULL AND deleted_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// (live, soft-deleted) record counts.
    pub async fn count_by_state(pool: &PgPool) -> anyhow::Result<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE deleted_at IS NULL)::BIGINT,
                    COUNT(*) FILTER (WHERE deleted_at IS NOT NULL)::BIGINT
             FROM restaurants",
        )
        .fetch_one(pool)
        .await?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::Feature;
    use crate::models::search::{SortField, SortOrder};

    fn plan(filters: FilterSet) -> ListPlan {
        ListPlan {
            text: Some("100%_bar".into()),
            city: Some("Taito".into()),
            filters,
            page: 2,
            limit: 10,
            sort: SortField::BeerPrice,
            order: SortOrder::Desc,
        }
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
        assert_eq!(like_pattern("hoppy"), "%hoppy%");
    }

    #[test]
    fn list_predicates_sql() {
        let filters = FilterSet {
            features: vec![Feature::IsStanding, Feature::HasTv],
            max_beer_price: Some(300),
            max_chuhai_price: None,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM restaurants");
        push_list_predicates(&mut qb, &plan(filters));
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM restaurants WHERE deleted_at IS NULL \
             AND concat_ws(' ', name, description, prefecture, city, address_line, building) ILIKE $1 \
             AND city = $2 AND is_standing = TRUE AND has_tv = TRUE \
             AND (beer_price IS NULL OR beer_price <= $3)"
        );
    }

    #[test]
    fn empty_filter_set_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_filter_set(&mut qb, &FilterSet::default());
        assert_eq!(qb.sql(), "SELECT 1 WHERE TRUE");
    }
}

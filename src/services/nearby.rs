use chrono::NaiveTime;
use serde::Serialize;

use crate::models::restaurant::RestaurantWithHours;
use crate::models::search::{Coordinates, FilterSet};
use crate::services::clock::ReferenceInstant;
use crate::services::distance::rank_by_distance;
use crate::services::filters::apply_filters;
use crate::services::open_now::{filter_open_now, OpenNowPolicy};

/// A validated location search.
#[derive(Debug, Clone)]
pub struct NearbySearch {
    pub origin: Coordinates,
    pub filters: FilterSet,
    /// `None` skips the hours stage entirely.
    pub open_at: Option<ReferenceInstant>,
    pub policy: OpenNowPolicy,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyRestaurant {
    #[serde(flatten)]
    pub restaurant: RestaurantWithHours,
    /// Kilometres from the search origin.
    pub distance: f64,
    /// Closing time of the window that is open right now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<NaiveTime>,
}

/// Store snapshot -> feature/price filter -> open-now filter -> distance ranking.
///
/// Soft-deleted and unlocated records are dropped silently.
pub fn search_nearby(candidates: Vec<RestaurantWithHours>, search: &NearbySearch) -> Vec<NearbyRestaurant> {
    let live: Vec<RestaurantWithHours> = candidates
        .into_iter()
        .filter(|r| !r.restaurant.is_deleted() && r.restaurant.coordinates().is_some())
        .collect();

    let filtered = apply_filters(live, &search.filters, |r| &r.restaurant);

    let open: Vec<(RestaurantWithHours, Option<NaiveTime>)> = match search.open_at {
        Some(at) => filter_open_now(filtered, at, search.policy)
            .into_iter()
            .map(|(r, close)| (r, Some(close)))
            .collect(),
        None => filtered.into_iter().map(|r| (r, None)).collect(),
    };

    let ranked = rank_by_distance(search.origin, open, |(r, _)| {
        r.restaurant
            .coordinates()
            .map(|(latitude, longitude)| Coordinates { latitude, longitude })
    });

    ranked
        .into_iter()
        .take_while(|(_, d)| search.radius_km.map_or(true, |max| *d <= max))
        .take(search.limit.unwrap_or(usize::MAX))
        .map(|((restaurant, close_time), distance)| NearbyRestaurant {
            restaurant,
            distance,
            close_time,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::feature::Feature;
    use crate::models::operating_hour::fixtures::hour;
    use crate::models::operating_hour::OperatingHour;
    use crate::models::restaurant::fixtures::restaurant;

    const MON: i16 = 1;
    const KM_PER_DEG_LAT: f64 = 111.195;

    fn origin() -> Coordinates {
        Coordinates { latitude: 35.68, longitude: 139.76 }
    }

    /// A restaurant due north of the origin at roughly `km`.
    fn north_of_origin(id: i64, km: f64, hours: Vec<OperatingHour>) -> RestaurantWithHours {
        RestaurantWithHours {
            restaurant: restaurant(id, 35.68 + km / KM_PER_DEG_LAT, 139.76),
            hours,
        }
    }

    fn search(open_at: Option<ReferenceInstant>) -> NearbySearch {
        NearbySearch {
            origin: origin(),
            filters: FilterSet::default(),
            open_at,
            policy: OpenNowPolicy::default(),
            radius_km: None,
            limit: None,
        }
    }

    fn monday_evening() -> Vec<RestaurantWithHours> {
        vec![
            // closed Mondays
            north_of_origin(1, 1.0, vec![hour(1, 1, 2, (17, 0), (23, 0))]),
            north_of_origin(2, 5.0, vec![hour(2, 2, MON, (17, 0), (1, 0))]),
            north_of_origin(3, 2.0, vec![hour(3, 3, MON, (18, 0), (23, 0))]),
        ]
    }

    #[test]
    fn monday_evening_scenario() {
        let results = search_nearby(monday_evening(), &search(Some(ReferenceInstant::new(1, 19, 0))));
        let ids: Vec<i64> = results.iter().map(|r| r.restaurant.restaurant.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert!((results[0].distance - 2.0).abs() < 0.01);
        assert!((results[1].distance - 5.0).abs() < 0.01);
        assert_eq!(results[0].close_time, NaiveTime::from_hms_opt(23, 0, 0));
        assert_eq!(results[1].close_time, NaiveTime::from_hms_opt(1, 0, 0));
    }

    #[test]
    fn without_open_at_every_located_restaurant_is_ranked() {
        let results = search_nearby(monday_evening(), &search(None));
        let ids: Vec<i64> = results.iter().map(|r| r.restaurant.restaurant.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert!(results.iter().all(|r| r.close_time.is_none()));
    }

    #[test]
    fn deleted_and_unlocated_are_excluded() {
        let mut rs = monday_evening();
        rs[2].restaurant.deleted_at = Some(Utc::now());
        rs[1].restaurant.latitude = None;
        assert!(search_nearby(rs, &search(None)).iter().all(|r| r.restaurant.restaurant.id == 1));
    }

    #[test]
    fn features_narrow_before_ranking() {
        let mut rs = monday_evening();
        rs[1].restaurant.is_standing = true;
        let mut s = search(Some(ReferenceInstant::new(1, 19, 0)));
        s.filters.features = vec![Feature::IsStanding];
        let results = search_nearby(rs, &s);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].restaurant.restaurant.id, 2);
    }

    #[test]
    fn radius_and_limit_truncate_ranked_results() {
        let mut s = search(None);
        s.radius_km = Some(3.0);
        let ids: Vec<i64> = search_nearby(monday_evening(), &s)
            .iter()
            .map(|r| r.restaurant.restaurant.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        let mut s = search(None);
        s.limit = Some(1);
        assert_eq!(search_nearby(monday_evening(), &s).len(), 1);
    }

    #[test]
    fn stage_order_does_not_change_the_result() {
        let mut rs = monday_evening();
        rs[2].restaurant.beer_price = Some(600);
        let mut s = search(Some(ReferenceInstant::new(1, 19, 0)));
        s.filters.max_beer_price = Some(500);
        let pipeline: Vec<i64> = search_nearby(rs.clone(), &s)
            .iter()
            .map(|r| r.restaurant.restaurant.id)
            .collect();

        // hours first, then features
        let open_first = search_nearby(rs, &search(Some(ReferenceInstant::new(1, 19, 0))));
        let reordered: Vec<i64> = open_first
            .into_iter()
            .filter(|r| crate::services::filters::matches(&r.restaurant.restaurant, &s.filters))
            .map(|r| r.restaurant.restaurant.id)
            .collect();

        assert_eq!(pipeline, vec![2]);
        assert_eq!(pipeline, reordered);
    }
}

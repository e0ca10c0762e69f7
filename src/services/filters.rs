use crate::models::restaurant::Restaurant;
use crate::models::search::FilterSet;

/// Unset prices get the benefit of the doubt; set ones must not exceed the ceiling.
fn within_ceiling(price: Option<i32>, ceiling: Option<i32>) -> bool {
    match (price, ceiling) {
        (Some(p), Some(max)) => p <= max,
        _ => true,
    }
}

/// Every requested feature must be set, and both price ceilings must hold.
pub fn matches(restaurant: &Restaurant, filters: &FilterSet) -> bool {
    filters.features.iter().all(|f| f.is_set_on(restaurant))
        && within_ceiling(restaurant.beer_price, filters.max_beer_price)
        && within_ceiling(restaurant.chuhai_price, filters.max_chuhai_price)
}

/// Keep the items whose restaurant passes `filters`, preserving order.
pub fn apply_filters<T, F>(items: Vec<T>, filters: &FilterSet, restaurant: F) -> Vec<T>
where
    F: Fn(&T) -> &Restaurant,
{
    if filters == &FilterSet::default() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| matches(restaurant(item), filters))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::Feature;
    use crate::models::restaurant::fixtures::restaurant;

    fn features(names: &str) -> FilterSet {
        FilterSet::parse(Some(names), None, None).unwrap()
    }

    fn beer_ceiling(max: i32) -> FilterSet {
        FilterSet {
            max_beer_price: Some(max),
            ..Default::default()
        }
    }

    #[test]
    fn features_are_anded() {
        let mut r = restaurant(1, 35.0, 139.0);
        r.is_standing = true;
        r.has_tv = false;
        assert!(!matches(&r, &features("is_standing,has_tv")));
        assert!(matches(&r, &features("is_standing")));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let items = vec![restaurant(1, 0.0, 0.0), restaurant(2, 0.0, 0.0)];
        assert_eq!(apply_filters(items, &FilterSet::default(), |r| r).len(), 2);
    }

    #[test]
    fn unset_price_passes_ceiling() {
        let r = restaurant(1, 35.0, 139.0);
        assert!(matches(&r, &beer_ceiling(300)));
    }

    #[test]
    fn price_ceiling_is_inclusive() {
        let mut r = restaurant(1, 35.0, 139.0);
        r.beer_price = Some(500);
        assert!(!matches(&r, &beer_ceiling(300)));
        r.beer_price = Some(300);
        assert!(matches(&r, &beer_ceiling(300)));
    }

    #[test]
    fn chuhai_ceiling_is_independent_of_beer() {
        let mut r = restaurant(1, 35.0, 139.0);
        r.beer_price = Some(1000);
        r.chuhai_price = Some(200);
        let f = FilterSet {
            max_chuhai_price: Some(250),
            ..Default::default()
        };
        assert!(matches(&r, &f));
        let f = FilterSet {
            max_beer_price: Some(250),
            max_chuhai_price: Some(250),
            ..Default::default()
        };
        assert!(!matches(&r, &f));
    }

    #[test]
    fn apply_preserves_order() {
        let mut a = restaurant(1, 0.0, 0.0);
        let b = restaurant(2, 0.0, 0.0);
        let mut c = restaurant(3, 0.0, 0.0);
        a.smoking_allowed = true;
        c.smoking_allowed = true;
        let f = FilterSet {
            features: vec![Feature::SmokingAllowed],
            ..Default::default()
        };
        let kept: Vec<i64> = apply_filters(vec![a, b, c], &f, |r| r).iter().map(|r| r.id).collect();
        assert_eq!(kept, vec![1, 3]);
    }
}

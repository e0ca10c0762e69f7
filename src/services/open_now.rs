use chrono::NaiveTime;

use crate::models::operating_hour::OperatingHour;
use crate::models::restaurant::RestaurantWithHours;
use crate::services::clock::ReferenceInstant;

/// How strictly "open now" follows the calendar day of the reference instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenNowPolicy {
    /// When the reference day has no matching window, also accept the
    /// previous day's overnight window while it is still running.
    pub carry_over_previous_day: bool,
}

/// Does a single window contain `minute`? Half-open: the opening minute is
/// open, the closing minute is closed.
pub fn window_contains(entry: &OperatingHour, minute: u16) -> bool {
    let open = entry.open_minute();
    let close = entry.close_minute();
    if close >= open {
        // open == close yields an empty window
        open <= minute && minute < close
    } else {
        minute >= open || minute < close
    }
}

/// The entry that makes the restaurant open at `at`, if any.
///
/// Today's entries are scanned in order and the first containing window wins.
pub fn active_entry<'a>(
    hours: &'a [OperatingHour],
    at: ReferenceInstant,
    policy: OpenNowPolicy,
) -> Option<&'a OperatingHour> {
    let today = i16::from(at.day_of_week);
    let found = hours
        .iter()
        .filter(|h| h.day_of_week == today)
        .find(|h| window_contains(h, at.minute_of_day));
    if found.is_some() || !policy.carry_over_previous_day {
        return found;
    }

    let yesterday = i16::from(at.previous_day());
    hours
        .iter()
        .filter(|h| h.day_of_week == yesterday && h.is_overnight())
        .find(|h| at.minute_of_day < h.close_minute())
}

pub fn is_open_at(restaurant: &RestaurantWithHours, at: ReferenceInstant, policy: OpenNowPolicy) -> bool {
    active_entry(&restaurant.hours, at, policy).is_some()
}

/// Restaurants open at `at`, in input order, each paired with the closing time
/// of the window that matched.
pub fn filter_open_now(
    restaurants: Vec<RestaurantWithHours>,
    at: ReferenceInstant,
    policy: OpenNowPolicy,
) -> Vec<(RestaurantWithHours, NaiveTime)> {
    restaurants
        .into_iter()
        .filter_map(|r| {
            let close = active_entry(&r.hours, at, policy)?.close_time;
            Some((r, close))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operating_hour::fixtures::hour;
    use crate::models::restaurant::fixtures::restaurant;

    const MON: u8 = 1;
    const TUE: u8 = 2;

    fn with_hours(id: i64, hours: Vec<OperatingHour>) -> RestaurantWithHours {
        RestaurantWithHours {
            restaurant: restaurant(id, 35.0, 139.0),
            hours,
        }
    }

    fn open_at(r: &RestaurantWithHours, day: u8, h: u16, m: u16) -> bool {
        is_open_at(r, ReferenceInstant::new(day, h, m), OpenNowPolicy::default())
    }

    #[test]
    fn no_entry_for_the_day_means_closed() {
        let r = with_hours(1, vec![hour(1, 1, 2, (0, 0), (23, 59))]);
        for h in 0..24 {
            assert!(!open_at(&r, MON, h, 0));
        }
        assert!(!open_at(&with_hours(2, vec![]), MON, 12, 0));
    }

    #[test]
    fn same_day_window_is_half_open() {
        let r = with_hours(1, vec![hour(1, 1, MON.into(), (10, 0), (22, 0))]);
        assert!(open_at(&r, MON, 10, 0));
        assert!(open_at(&r, MON, 21, 59));
        assert!(!open_at(&r, MON, 22, 0));
        assert!(!open_at(&r, MON, 9, 59));
    }

    #[test]
    fn overnight_window() {
        let r = with_hours(1, vec![hour(1, 1, MON.into(), (18, 0), (2, 0))]);
        assert!(open_at(&r, MON, 23, 30));
        assert!(open_at(&r, MON, 1, 30));
        assert!(!open_at(&r, MON, 2, 0));
        assert!(!open_at(&r, MON, 17, 59));
    }

    #[test]
    fn equal_open_and_close_is_never_open() {
        let r = with_hours(1, vec![hour(1, 1, MON.into(), (10, 0), (10, 0))]);
        for minute in (0..1440).step_by(7) {
            assert!(!open_at(&r, MON, minute / 60, minute % 60));
        }
        assert!(!open_at(&r, MON, 10, 0));
    }

    #[test]
    fn literal_day_ignores_previous_overnight_shift() {
        let r = with_hours(1, vec![hour(1, 1, MON.into(), (18, 0), (2, 0))]);
        assert!(!open_at(&r, TUE, 1, 0));
    }

    #[test]
    fn carry_over_uses_previous_overnight_shift() {
        let r = with_hours(1, vec![hour(1, 1, MON.into(), (18, 0), (2, 0))]);
        let policy = OpenNowPolicy { carry_over_previous_day: true };
        let entry = active_entry(&r.hours, ReferenceInstant::new(TUE, 1, 0), policy).unwrap();
        assert_eq!(entry.id, 1);
        assert!(!is_open_at(&r, ReferenceInstant::new(TUE, 2, 0), policy));
        assert!(!is_open_at(&r, ReferenceInstant::new(TUE, 19, 0), policy));
    }

    #[test]
    fn carry_over_wraps_from_saturday_to_sunday() {
        let r = with_hours(1, vec![hour(1, 1, 6, (20, 0), (3, 0))]);
        let policy = OpenNowPolicy { carry_over_previous_day: true };
        assert!(is_open_at(&r, ReferenceInstant::new(0, 2, 59), policy));
    }

    #[test]
    fn carry_over_ignores_same_day_windows_of_yesterday() {
        let r = with_hours(1, vec![hour(1, 1, MON.into(), (10, 0), (22, 0))]);
        let policy = OpenNowPolicy { carry_over_previous_day: true };
        assert!(!is_open_at(&r, ReferenceInstant::new(TUE, 9, 0), policy));
    }

    #[test]
    fn first_matching_window_wins_among_split_shifts() {
        let r = with_hours(
            1,
            vec![
                hour(10, 1, MON.into(), (11, 0), (14, 0)),
                hour(11, 1, MON.into(), (17, 0), (23, 0)),
                hour(12, 1, MON.into(), (12, 0), (23, 30)),
            ],
        );
        let policy = OpenNowPolicy::default();
        assert_eq!(active_entry(&r.hours, ReferenceInstant::new(MON, 12, 30), policy).unwrap().id, 10);
        assert_eq!(active_entry(&r.hours, ReferenceInstant::new(MON, 15, 0), policy).unwrap().id, 12);
        assert_eq!(active_entry(&r.hours, ReferenceInstant::new(MON, 18, 0), policy).unwrap().id, 11);
        assert!(active_entry(&r.hours, ReferenceInstant::new(MON, 23, 45), policy).is_none());
    }

    #[test]
    fn filter_keeps_order_and_reports_close_time() {
        let rs = vec![
            with_hours(1, vec![hour(1, 1, MON.into(), (17, 0), (1, 0))]),
            with_hours(2, vec![hour(2, 2, TUE.into(), (17, 0), (23, 0))]),
            with_hours(3, vec![hour(3, 3, MON.into(), (18, 0), (23, 0))]),
        ];
        let open = filter_open_now(rs, ReferenceInstant::new(MON, 19, 0), OpenNowPolicy::default());
        let ids: Vec<i64> = open.iter().map(|(r, _)| r.restaurant.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(open[0].1, NaiveTime::from_hms_opt(1, 0, 0).unwrap());
        assert_eq!(open[1].1, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    }
}

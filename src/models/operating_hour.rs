use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const OPERATING_HOUR_COLUMNS: &str = "id, restaurant_id, day_of_week, open_time, close_time, \
     drink_last_order_time, food_last_order_time, happy_hour_start, happy_hour_end";

/// One weekly opening window. `day_of_week` is 0 = Sunday .. 6 = Saturday.
///
/// `close_time < open_time` marks a shift that runs past midnight.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OperatingHour {
    pub id: i64,
    pub restaurant_id: i64,
    pub day_of_week: i16,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub drink_last_order_time: Option<NaiveTime>,
    pub food_last_order_time: Option<NaiveTime>,
    pub happy_hour_start: Option<NaiveTime>,
    pub happy_hour_end: Option<NaiveTime>,
}

impl OperatingHour {
    pub fn open_minute(&self) -> u16 {
        minute_of_day(self.open_time)
    }

    pub fn close_minute(&self) -> u16 {
        minute_of_day(self.close_time)
    }

    pub fn is_overnight(&self) -> bool {
        self.close_minute() < self.open_minute()
    }
}

/// Minutes since midnight; seconds are ignored.
pub fn minute_of_day(t: NaiveTime) -> u16 {
    // hour() < 24 and minute() < 60, so this is at most 1439
    (t.hour() * 60 + t.minute()) as u16
}

/// One entry of the body for PUT /admin/restaurants/{id}/hours.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatingHourInput {
    pub day_of_week: i16,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub drink_last_order_time: Option<NaiveTime>,
    pub food_last_order_time: Option<NaiveTime>,
    pub happy_hour_start: Option<NaiveTime>,
    pub happy_hour_end: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceHoursRequest {
    pub hours: Vec<OperatingHourInput>,
}

/// Days must be 0..=6 and appear at most once.
pub fn validate_hours(hours: &[OperatingHourInput]) -> Result<(), String> {
    let mut seen = [false; 7];
    for entry in hours {
        let day = usize::try_from(entry.day_of_week)
            .ok()
            .filter(|d| *d < 7)
            .ok_or_else(|| format!("day_of_week out of range: {}", entry.day_of_week))?;
        if seen[day] {
            return Err(format!("duplicate entry for day_of_week {day}"));
        }
        seen[day] = true;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub fn hour(id: i64, restaurant_id: i64, day: i16, open: (u32, u32), close: (u32, u32)) -> OperatingHour {
        OperatingHour {
            id,
            restaurant_id,
            day_of_week: day,
            open_time: hm(open.0, open.1),
            close_time: hm(close.0, close.1),
            drink_last_order_time: None,
            food_last_order_time: None,
            happy_hour_start: None,
            happy_hour_end: None,
        }
    }
}

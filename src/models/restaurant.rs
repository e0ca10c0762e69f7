use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::operating_hour::OperatingHour;

pub const RESTAURANT_COLUMNS: &str = "id, name, postal_code, prefecture, city, address_line, building, phone, \
     description, latitude, longitude, is_standing, accepts_credit_card, smoking_allowed, \
     has_happy_hour, morning_service, daytime_service, has_tv, has_counter_seats, solo_friendly, \
     credit_card_note, smoking_note, happy_hour_note, beer_price, chuhai_price, \
     deleted_at, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub address_line: Option<String>,
    pub building: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    /// Absent on unpublished records; those never appear in location search.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub is_standing: bool,
    pub accepts_credit_card: bool,
    pub smoking_allowed: bool,
    pub has_happy_hour: bool,
    pub morning_service: bool,
    pub daytime_service: bool,
    pub has_tv: bool,
    pub has_counter_seats: bool,
    pub solo_friendly: bool,

    pub credit_card_note: Option<String>,
    pub smoking_note: Option<String>,
    pub happy_hour_note: Option<String>,

    /// Yen, tax included.
    pub beer_price: Option<i32>,
    pub chuhai_price: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// A restaurant together with its weekly hours, ordered by day then id.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantWithHours {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub hours: Vec<OperatingHour>,
}

/// Body for POST /admin/restaurants.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub address_line: Option<String>,
    pub building: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_standing: bool,
    #[serde(default)]
    pub accepts_credit_card: bool,
    #[serde(default)]
    pub smoking_allowed: bool,
    #[serde(default)]
    pub has_happy_hour: bool,
    #[serde(default)]
    pub morning_service: bool,
    #[serde(default)]
    pub daytime_service: bool,
    #[serde(default)]
    pub has_tv: bool,
    #[serde(default)]
    pub has_counter_seats: bool,
    #[serde(default)]
    pub solo_friendly: bool,
    pub credit_card_note: Option<String>,
    pub smoking_note: Option<String>,
    pub happy_hour_note: Option<String>,
    pub beer_price: Option<i32>,
    pub chuhai_price: Option<i32>,
}

/// Body for PUT /admin/restaurants/{id}. Absent fields are left unchanged;
/// the `clear_*` flags null a column out (clearing the location unpublishes).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub address_line: Option<String>,
    pub building: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_standing: Option<bool>,
    pub accepts_credit_card: Option<bool>,
    pub smoking_allowed: Option<bool>,
    pub has_happy_hour: Option<bool>,
    pub morning_service: Option<bool>,
    pub daytime_service: Option<bool>,
    pub has_tv: Option<bool>,
    pub has_counter_seats: Option<bool>,
    pub solo_friendly: Option<bool>,
    pub credit_card_note: Option<String>,
    pub smoking_note: Option<String>,
    pub happy_hour_note: Option<String>,
    pub beer_price: Option<i32>,
    pub chuhai_price: Option<i32>,
    #[serde(default)]
    pub clear_location: bool,
    #[serde(default)]
    pub clear_beer_price: bool,
    #[serde(default)]
    pub clear_chuhai_price: bool,
}

/// Shared checks for admin writes. Returns a message suitable for a 400.
pub fn validate_location_and_prices(
    latitude: Option<f64>,
    longitude: Option<f64>,
    beer_price: Option<i32>,
    chuhai_price: Option<i32>,
) -> Result<(), String> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("latitude out of range: {lat}"));
        }
    }
    if let Some(lng) = longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!("longitude out of range: {lng}"));
        }
    }
    for (field, price) in [("beer_price", beer_price), ("chuhai_price", chuhai_price)] {
        if matches!(price, Some(p) if p < 0) {
            return Err(format!("{field} must not be negative"));
        }
    }
    Ok(())
}

impl CreateRestaurantRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            return Err("latitude and longitude must be given together".into());
        }
        validate_location_and_prices(self.latitude, self.longitude, self.beer_price, self.chuhai_price)
    }
}

impl UpdateRestaurantRequest {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err("name must not be empty".into());
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            return Err("latitude and longitude must be given together".into());
        }
        if self.clear_location && self.latitude.is_some() {
            return Err("clear_location cannot be combined with latitude/longitude".into());
        }
        if self.clear_beer_price && self.beer_price.is_some() {
            return Err("clear_beer_price cannot be combined with beer_price".into());
        }
        if self.clear_chuhai_price && self.chuhai_price.is_some() {
            return Err("clear_chuhai_price cannot be combined with chuhai_price".into());
        }
        validate_location_and_prices(self.latitude, self.longitude, self.beer_price, self.chuhai_price)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Bare published restaurant with no flags or prices set.
    pub fn restaurant(id: i64, latitude: f64, longitude: f64) -> Restaurant {
        let ts = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        Restaurant {
            id,
            name: format!("bar {id}"),
            postal_code: None,
            prefecture: None,
            city: None,
            address_line: None,
            building: None,
            phone: None,
            description: None,
            latitude: Some(latitude),
            longitude: Some(longitude),
            is_standing: false,
            accepts_credit_card: false,
            smoking_allowed: false,
            has_happy_hour: false,
            morning_service: false,
            daytime_service: false,
            has_tv: false,
            has_counter_seats: false,
            solo_friendly: false,
            credit_card_note: None,
            smoking_note: None,
            happy_hour_note: None,
            beer_price: None,
            chuhai_price: None,
            deleted_at: None,
            created_at: ts,
            updated_at: ts,
        }
    }
}

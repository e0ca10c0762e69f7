use serde::Deserialize;
use thiserror::Error;

use super::feature::Feature;

/// Caller errors raised while turning a search request into a plan.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("latitude and longitude are required for a location search")]
    MissingLocation,

    #[error("{field} out of range: {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },

    #[error("malformed reference timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SearchError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SearchError::InvalidCoordinate { field: "latitude", value: latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SearchError::InvalidCoordinate { field: "longitude", value: longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Both halves must be present; a lone latitude is as useless as none.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, SearchError> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng),
            _ => Err(SearchError::MissingLocation),
        }
    }
}

/// Feature flags and price ceilings shared by every search surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub features: Vec<Feature>,
    pub max_beer_price: Option<i32>,
    pub max_chuhai_price: Option<i32>,
}

impl FilterSet {
    pub fn parse(
        features: Option<&str>,
        max_beer_price: Option<i32>,
        max_chuhai_price: Option<i32>,
    ) -> Result<Self, SearchError> {
        for (field, value) in [("max_beer_price", max_beer_price), ("max_chuhai_price", max_chuhai_price)] {
            if let Some(v) = value.filter(|v| *v < 0) {
                return Err(SearchError::InvalidNumber { field, value: f64::from(v) });
            }
        }
        Ok(Self {
            features: features.map(Feature::parse_list).transpose()?.unwrap_or_default(),
            max_beer_price,
            max_chuhai_price,
        })
    }
}

/// Query params for GET /restaurants/nearby. Unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NearbyQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// ISO-8601 instant with offset; defaults to now.
    pub at: Option<String>,
    /// Comma-separated feature names, all of which must hold.
    pub features: Option<String>,
    pub max_beer_price: Option<i32>,
    pub max_chuhai_price: Option<i32>,
    pub open_now: Option<bool>,
    pub radius_km: Option<f64>,
    pub limit: Option<i64>,
}

/// Query params for GET /restaurants. Unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestaurantListQuery {
    /// Free text matched against name, description and address.
    pub q: Option<String>,
    pub city: Option<String>,
    pub features: Option<String>,
    pub max_beer_price: Option<i32>,
    pub max_chuhai_price: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Name,
    BeerPrice,
    ChuhaiPrice,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::BeerPrice => "beer_price",
            SortField::ChuhaiPrice => "chuhai_price",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "beer_price" => Ok(SortField::BeerPrice),
            "chuhai_price" => Ok(SortField::ChuhaiPrice),
            "created_at" => Ok(SortField::CreatedAt),
            "updated_at" => Ok(SortField::UpdatedAt),
            _ => Err(SearchError::UnknownSortField(s.to_string())),
        }
    }
}

/// Validated form of [`RestaurantListQuery`], ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
    pub text: Option<String>,
    pub city: Option<String>,
    pub filters: FilterSet,
    pub page: i64,
    pub limit: i64,
    pub sort: SortField,
    pub order: SortOrder,
}

impl ListPlan {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl RestaurantListQuery {
    pub fn into_plan(self, default_limit: i64, max_limit: i64) -> Result<ListPlan, SearchError> {
        let filters = FilterSet::parse(
            self.features.as_deref(),
            self.max_beer_price,
            self.max_chuhai_price,
        )?;
        let sort = self
            .sort
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();

        Ok(ListPlan {
            text: self.q.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            city: self.city.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            filters,
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(default_limit).clamp(1, max_limit),
            sort,
            order: self.order.unwrap_or_default(),
        })
    }
}

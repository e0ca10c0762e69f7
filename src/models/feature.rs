use serde::{Deserialize, Serialize};

use super::restaurant::Restaurant;
use super::search::SearchError;

/// Boolean amenity/policy flags a restaurant can be filtered on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    IsStanding,
    AcceptsCreditCard,
    SmokingAllowed,
    HasHappyHour,
    MorningService,
    DaytimeService,
    HasTv,
    HasCounterSeats,
    SoloFriendly,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::IsStanding,
        Feature::AcceptsCreditCard,
        Feature::SmokingAllowed,
        Feature::HasHappyHour,
        Feature::MorningService,
        Feature::DaytimeService,
        Feature::HasTv,
        Feature::HasCounterSeats,
        Feature::SoloFriendly,
    ];

    /// Column name in `restaurants`; also the wire name.
    pub fn column(self) -> &'static str {
        match self {
            Feature::IsStanding => "is_standing",
            Feature::AcceptsCreditCard => "accepts_credit_card",
            Feature::SmokingAllowed => "smoking_allowed",
            Feature::HasHappyHour => "has_happy_hour",
            Feature::MorningService => "morning_service",
            Feature::DaytimeService => "daytime_service",
            Feature::HasTv => "has_tv",
            Feature::HasCounterSeats => "has_counter_seats",
            Feature::SoloFriendly => "solo_friendly",
        }
    }

    pub fn is_set_on(self, r: &Restaurant) -> bool {
        match self {
            Feature::IsStanding => r.is_standing,
            Feature::AcceptsCreditCard => r.accepts_credit_card,
            Feature::SmokingAllowed => r.smoking_allowed,
            Feature::HasHappyHour => r.has_happy_hour,
            Feature::MorningService => r.morning_service,
            Feature::DaytimeService => r.daytime_service,
            Feature::HasTv => r.has_tv,
            Feature::HasCounterSeats => r.has_counter_seats,
            Feature::SoloFriendly => r.solo_friendly,
        }
    }

    /// Parse a comma-separated list such as `is_standing,has_tv`.
    ///
    /// Blank segments are skipped; any unrecognised name rejects the whole list
    /// so a caller never believes a filter was applied when it was not.
    pub fn parse_list(raw: &str) -> Result<Vec<Feature>, SearchError> {
        let mut features = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let feature: Feature = name.parse()?;
            if !features.contains(&feature) {
                features.push(feature);
            }
        }
        Ok(features)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

impl std::str::FromStr for Feature {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.column() == s)
            .ok_or_else(|| SearchError::UnknownFeature(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_name() {
        for feature in Feature::ALL {
            assert_eq!(feature.column().parse::<Feature>().unwrap(), feature);
        }
    }

    #[test]
    fn parse_list_dedups_and_skips_blanks() {
        let features = Feature::parse_list("is_standing, has_tv,,is_standing").unwrap();
        assert_eq!(features, vec![Feature::IsStanding, Feature::HasTv]);
        assert!(Feature::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn parse_list_rejects_unknown_name() {
        let err = Feature::parse_list("is_standing,has_karaoke").unwrap_err();
        assert!(matches!(err, SearchError::UnknownFeature(ref n) if n == "has_karaoke"));
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("Is_Standing".parse::<Feature>().is_err());
    }
}

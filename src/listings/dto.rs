use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::FeedListing;
use super::services::NearbySort;
use crate::feed::language_model::EstimateReview;
use crate::feed::services::EstimateMethod;
use crate::feed::AnimalType;

pub const DEFAULT_MAX_DISTANCE_MILES: f64 = 25.0;

#[derive(Debug, Deserialize)]
pub struct CreateListingsRequest {
    pub item_ids: Vec<Uuid>,
    #[serde(default)]
    pub prices: HashMap<AnimalType, f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub method: EstimateMethod,
}

#[derive(Debug, Serialize)]
pub struct CreateListingsResponse {
    pub listings: Vec<FeedListing>,
    pub review: EstimateReview,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub max_distance: Option<f64>,
    pub animal_type: Option<AnimalType>,
    #[serde(default)]
    pub sort: NearbySort,
}

impl NearbyQuery {
    pub fn max_distance(&self) -> Result<f64, String> {
        match self.max_distance {
            None => Ok(DEFAULT_MAX_DISTANCE_MILES),
            Some(d) if d.is_finite() && d >= 0.0 => Ok(d),
            Some(d) => Err(format!("max_distance must be a non-negative number, got {d}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let req: CreateListingsRequest = serde_json::from_str(
            r#"{"item_ids":[],"prices":{"chicken":1.25,"pig":0.5}}"#,
        )
        .unwrap();
        assert_eq!(req.method, EstimateMethod::Table);
        assert_eq!(req.prices.get(&AnimalType::Chicken), Some(&1.25));
        assert!(req.description.is_none());
    }

    #[test]
    fn nearby_distance_defaults_and_validates() {
        let q = NearbyQuery {
            max_distance: None,
            animal_type: None,
            sort: NearbySort::Distance,
        };
        assert_eq!(q.max_distance(), Ok(DEFAULT_MAX_DISTANCE_MILES));

        let q = NearbyQuery {
            max_distance: Some(-1.0),
            ..q
        };
        assert!(q.max_distance().is_err());
    }
}

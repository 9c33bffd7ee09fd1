use std::collections::HashMap;

use serde::Serialize;

use super::types::{AnimalType, FeedEstimate};

/// A listing ready to be validated and persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedListingDraft {
    pub animal_type: AnimalType,
    pub quantity_weight: f64,
    pub unit_price: f64,
}

/// One draft per animal type with positive weight, in animal-type order.
/// A missing price becomes 0; rejecting zero-priced drafts is left to the caller.
pub fn build_listing_drafts(
    estimate: &FeedEstimate,
    prices: &HashMap<AnimalType, f64>,
) -> Vec<FeedListingDraft> {
    estimate
        .iter()
        .filter(|(_, weight)| *weight > 0.0)
        .map(|(animal_type, quantity_weight)| FeedListingDraft {
            animal_type,
            quantity_weight,
            unit_price: prices.get(&animal_type).copied().unwrap_or(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weights_are_dropped() {
        let estimate: FeedEstimate = [(AnimalType::Chicken, 16.0), (AnimalType::Pig, 12.0)]
            .into_iter()
            .collect();
        let prices = HashMap::from([(AnimalType::Chicken, 1.25), (AnimalType::Pig, 0.9)]);

        let drafts = build_listing_drafts(&estimate, &prices);
        assert_eq!(
            drafts,
            vec![
                FeedListingDraft {
                    animal_type: AnimalType::Chicken,
                    quantity_weight: 16.0,
                    unit_price: 1.25
                },
                FeedListingDraft {
                    animal_type: AnimalType::Pig,
                    quantity_weight: 12.0,
                    unit_price: 0.9
                },
            ]
        );
    }

    #[test]
    fn missing_price_maps_to_zero() {
        let estimate: FeedEstimate = [(AnimalType::Goat, 3.0)].into_iter().collect();
        let drafts = build_listing_drafts(&estimate, &HashMap::new());
        assert_eq!(drafts[0].unit_price, 0.0);
    }

    #[test]
    fn empty_estimate_gives_no_drafts() {
        let drafts = build_listing_drafts(&FeedEstimate::zeroed(), &HashMap::new());
        assert!(drafts.is_empty());
    }

    #[test]
    fn negative_weights_never_become_drafts() {
        let estimate: FeedEstimate = [(AnimalType::Sheep, -2.0), (AnimalType::Cattle, 0.1)]
            .into_iter()
            .collect();
        let drafts = build_listing_drafts(&estimate, &HashMap::new());
        assert_eq!(drafts.len(), 1);
        assert!(drafts.iter().all(|d| d.quantity_weight > 0.0));
    }
}

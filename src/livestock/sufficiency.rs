use std::collections::BTreeMap;

use serde::Serialize;

use super::repo_types::LivestockHolding;
use crate::feed::types::{round_tenth, AnimalType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSufficiency {
    pub animal_type: AnimalType,
    pub required: f64,
    pub available: f64,
    pub needed: f64,
    pub percentage: f64,
}

/// Weekly feed coverage per animal type the farm keeps.
/// `available` is what completed orders delivered; types with no livestock are omitted.
pub fn weekly_sufficiency(
    holdings: &[LivestockHolding],
    available: &[(AnimalType, f64)],
) -> Vec<FeedSufficiency> {
    let mut required: BTreeMap<AnimalType, f64> = BTreeMap::new();
    for h in holdings {
        *required.entry(h.animal_type).or_default() +=
            f64::from(h.count) * h.weekly_feed_requirement;
    }
    let mut received: BTreeMap<AnimalType, f64> = BTreeMap::new();
    for (animal, weight) in available {
        *received.entry(*animal).or_default() += weight.max(0.0);
    }

    required
        .into_iter()
        .map(|(animal_type, required)| {
            let available = received.get(&animal_type).copied().unwrap_or(0.0);
            let percentage = if required > 0.0 {
                (available / required * 100.0).min(100.0)
            } else {
                0.0
            };
            FeedSufficiency {
                animal_type,
                required: round_tenth(required),
                available: round_tenth(available),
                needed: round_tenth((required - available).max(0.0)),
                percentage: round_tenth(percentage),
            }
        })
        .collect()
}

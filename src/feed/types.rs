use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Livestock a feed listing is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalType {
    Chicken,
    Pig,
    Cattle,
    Goat,
    Sheep,
}

impl AnimalType {
    pub const ALL: [AnimalType; 5] = [
        AnimalType::Chicken,
        AnimalType::Pig,
        AnimalType::Cattle,
        AnimalType::Goat,
        AnimalType::Sheep,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnimalType::Chicken => "chicken",
            AnimalType::Pig => "pig",
            AnimalType::Cattle => "cattle",
            AnimalType::Goat => "goat",
            AnimalType::Sheep => "sheep",
        }
    }

    /// Pounds of feed one head needs per week when the farm has not recorded its own figure.
    pub fn default_weekly_feed(self) -> f64 {
        match self {
            AnimalType::Chicken => 0.5,
            AnimalType::Pig => 10.0,
            AnimalType::Cattle => 50.0,
            AnimalType::Goat => 5.0,
            AnimalType::Sheep => 7.0,
        }
    }
}

impl fmt::Display for AnimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimalType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        AnimalType::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownVariant::new("animal type", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FoodCategory {
    ProduceFruit,
    ProduceVegetable,
    Protein,
    Bakery,
    Dairy,
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 6] = [
        FoodCategory::ProduceFruit,
        FoodCategory::ProduceVegetable,
        FoodCategory::Protein,
        FoodCategory::Bakery,
        FoodCategory::Dairy,
        FoodCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FoodCategory::ProduceFruit => "produce-fruit",
            FoodCategory::ProduceVegetable => "produce-vegetable",
            FoodCategory::Protein => "protein",
            FoodCategory::Bakery => "bakery",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Other => "other",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace([' ', '_'], "-");
        FoodCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&needle))
            .ok_or_else(|| UnknownVariant::new("food category", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Fresh,
    Expiring,
    Expired,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Fresh => "fresh",
            ItemStatus::Expiring => "expiring",
            ItemStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ItemStatus::Fresh, ItemStatus::Expiring, ItemStatus::Expired]
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("item status", s))
    }
}

/// Unit a store enters a quantity in. Stored weights are always pounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityUnit {
    #[default]
    Pounds,
    Kilograms,
    Gallons,
    Loaves,
}

impl QuantityUnit {
    pub fn to_pounds(self, amount: f64) -> f64 {
        let factor = match self {
            QuantityUnit::Pounds => 1.0,
            QuantityUnit::Kilograms => 2.20462,
            QuantityUnit::Gallons => 8.34,
            QuantityUnit::Loaves => 1.5,
        };
        amount * factor
    }
}

/// Feed weight per animal type. Every animal type is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedEstimate(BTreeMap<AnimalType, f64>);

impl FeedEstimate {
    pub fn zeroed() -> Self {
        Self(AnimalType::ALL.into_iter().map(|a| (a, 0.0)).collect())
    }

    pub fn get(&self, animal: AnimalType) -> f64 {
        self.0.get(&animal).copied().unwrap_or(0.0)
    }

    pub fn add(&mut self, animal: AnimalType, weight: f64) {
        *self.0.entry(animal).or_insert(0.0) += weight;
    }

    pub fn set(&mut self, animal: AnimalType, weight: f64) {
        self.0.insert(animal, weight);
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_all_zero(&self) -> bool {
        self.0.values().all(|w| *w == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimalType, f64)> + '_ {
        self.0.iter().map(|(a, w)| (*a, *w))
    }

    /// Rounds every weight to one decimal place.
    pub fn rounded(mut self) -> Self {
        for w in self.0.values_mut() {
            *w = round_tenth(*w);
        }
        self
    }
}

impl Default for FeedEstimate {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FromIterator<(AnimalType, f64)> for FeedEstimate {
    fn from_iter<T: IntoIterator<Item = (AnimalType, f64)>>(iter: T) -> Self {
        let mut estimate = Self::zeroed();
        for (animal, weight) in iter {
            estimate.set(animal, weight);
        }
        estimate
    }
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

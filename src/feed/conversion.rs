use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::types::{AnimalType, FeedEstimate, FoodCategory};
use crate::inventory::SupplyItem;

/// Multipliers turning a pound of surplus food into pounds of usable feed.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    rates: HashMap<(FoodCategory, AnimalType), f64>,
}

// chicken, pig, cattle, goat, sheep
const PRODUCE: [f64; 5] = [0.8, 0.6, 0.4, 0.7, 0.6];
const BAKERY: [f64; 5] = [0.5, 0.9, 0.3, 0.4, 0.4];
const DAIRY: [f64; 5] = [0.3, 0.8, 0.5, 0.6, 0.5];
const PROTEIN: [f64; 5] = [0.7, 0.9, 0.6, 0.5, 0.5];

impl ConversionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rates used in production. `other` has no entry and contributes nothing.
    pub fn standard() -> Self {
        [
            (FoodCategory::ProduceFruit, PRODUCE),
            (FoodCategory::ProduceVegetable, PRODUCE),
            (FoodCategory::Bakery, BAKERY),
            (FoodCategory::Dairy, DAIRY),
            (FoodCategory::Protein, PROTEIN),
        ]
        .into_iter()
        .fold(Self::empty(), |table, (category, row)| {
            AnimalType::ALL
                .into_iter()
                .zip(row)
                .fold(table, |t, (animal, rate)| t.with_rate(category, animal, rate))
        })
    }

    pub fn with_rate(mut self, category: FoodCategory, animal: AnimalType, rate: f64) -> Self {
        self.rates.insert((category, animal), rate);
        self
    }

    pub fn rate(&self, category: FoodCategory, animal: AnimalType) -> Option<f64> {
        self.rates.get(&(category, animal)).copied()
    }
}

/// Table-driven feed estimate over the selected items, rounded to one decimal.
pub fn estimate_deterministic(
    table: &ConversionTable,
    items: &[SupplyItem],
    selected: &HashSet<Uuid>,
) -> FeedEstimate {
    let mut estimate = FeedEstimate::zeroed();
    for item in items.iter().filter(|i| selected.contains(&i.id)) {
        for animal in AnimalType::ALL {
            if let Some(rate) = table.rate(item.category, animal) {
                estimate.add(animal, item.quantity_weight * rate);
            }
        }
    }
    estimate.rounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::ItemStatus;
    use time::macros::date;

    fn item(category: FoodCategory, qty: f64) -> SupplyItem {
        SupplyItem {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: "item".into(),
            category,
            quantity_weight: qty,
            expiration_date: date!(2024 - 06 - 01),
            status: ItemStatus::Expiring,
        }
    }

    fn select(items: &[SupplyItem]) -> HashSet<Uuid> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn single_produce_item_with_two_rates() {
        let table = ConversionTable::empty()
            .with_rate(FoodCategory::ProduceVegetable, AnimalType::Chicken, 0.8)
            .with_rate(FoodCategory::ProduceVegetable, AnimalType::Pig, 0.6);
        let items = vec![item(FoodCategory::ProduceVegetable, 20.0)];

        let e = estimate_deterministic(&table, &items, &select(&items));
        assert_eq!(e.get(AnimalType::Chicken), 16.0);
        assert_eq!(e.get(AnimalType::Pig), 12.0);
        assert_eq!(e.get(AnimalType::Cattle), 0.0);
    }

    #[test]
    fn nothing_selected_gives_all_zero() {
        let items = vec![item(FoodCategory::Bakery, 15.0)];
        let e = estimate_deterministic(&ConversionTable::standard(), &items, &HashSet::new());
        assert!(e.is_all_zero());
        assert_eq!(e.iter().count(), AnimalType::ALL.len());
    }

    #[test]
    fn unselected_items_are_ignored() {
        let items = vec![
            item(FoodCategory::Bakery, 10.0),
            item(FoodCategory::Dairy, 100.0),
        ];
        let selected: HashSet<Uuid> = [items[0].id].into_iter().collect();
        let e = estimate_deterministic(&ConversionTable::standard(), &items, &selected);
        assert_eq!(e.get(AnimalType::Pig), 9.0);
        assert_eq!(e.get(AnimalType::Chicken), 5.0);
    }

    #[test]
    fn other_category_contributes_nothing() {
        let items = vec![item(FoodCategory::Other, 50.0)];
        let e = estimate_deterministic(&ConversionTable::standard(), &items, &select(&items));
        assert!(e.is_all_zero());
    }

    #[test]
    fn totals_accumulate_across_items_and_round() {
        let items = vec![
            item(FoodCategory::ProduceFruit, 30.0),
            item(FoodCategory::Protein, 25.0),
            item(FoodCategory::Dairy, 83.4),
        ];
        let e = estimate_deterministic(&ConversionTable::standard(), &items, &select(&items));
        // 30*0.8 + 25*0.7 + 83.4*0.3 = 24 + 17.5 + 25.02
        assert_eq!(e.get(AnimalType::Chicken), 66.5);
        // 30*0.4 + 25*0.6 + 83.4*0.5 = 12 + 15 + 41.7
        assert_eq!(e.get(AnimalType::Cattle), 68.7);
    }

    #[test]
    fn same_input_same_output() {
        let items = vec![
            item(FoodCategory::Bakery, 7.3),
            item(FoodCategory::ProduceFruit, 11.1),
        ];
        let table = ConversionTable::standard();
        let a = estimate_deterministic(&table, &items, &select(&items));
        let b = estimate_deterministic(&table, &items, &select(&items));
        assert_eq!(a, b);
    }
}

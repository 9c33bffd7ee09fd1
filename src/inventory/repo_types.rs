use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::db::{non_negative, RowError};
use crate::feed::types::{FoodCategory, ItemStatus};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Raw `supply_items` row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct SupplyItemRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity_weight: f64,
    pub expiration_date: Date,
    pub status: String,
    pub created_at: OffsetDateTime,
}

/// Surplus food a store has on hand. Weight is in pounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: FoodCategory,
    pub quantity_weight: f64,
    #[serde(with = "iso_date")]
    pub expiration_date: Date,
    pub status: ItemStatus,
}

impl TryFrom<SupplyItemRow> for SupplyItem {
    type Error = RowError;

    fn try_from(r: SupplyItemRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "supply_items";
        Ok(Self {
            category: r.category.parse().map_err(RowError::variant(TABLE, r.id))?,
            status: r.status.parse().map_err(RowError::variant(TABLE, r.id))?,
            quantity_weight: non_negative(TABLE, r.id, "quantity_weight", r.quantity_weight)?,
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            expiration_date: r.expiration_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn row(category: &str, status: &str, qty: f64) -> SupplyItemRow {
        SupplyItemRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Lettuce".into(),
            category: category.into(),
            quantity_weight: qty,
            expiration_date: date!(2024 - 05 - 01),
            status: status.into(),
            created_at: datetime!(2024-04-28 10:00 UTC),
        }
    }

    #[test]
    fn valid_row_decodes() {
        let item = SupplyItem::try_from(row("produce-vegetable", "Expiring", 20.0)).unwrap();
        assert_eq!(item.category, FoodCategory::ProduceVegetable);
        assert_eq!(item.status, ItemStatus::Expiring);
        assert_eq!(item.quantity_weight, 20.0);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = SupplyItem::try_from(row("meat", "fresh", 1.0)).unwrap_err();
        assert!(err.to_string().contains("unknown food category"));
    }

    #[test]
    fn negative_weight_is_rejected() {
        assert!(SupplyItem::try_from(row("bakery", "fresh", -4.0)).is_err());
    }

    #[test]
    fn expiration_serializes_as_iso_date() {
        let item = SupplyItem::try_from(row("dairy", "fresh", 2.0)).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["expiration_date"], "2024-05-01");
        assert_eq!(json["category"], "dairy");
    }
}

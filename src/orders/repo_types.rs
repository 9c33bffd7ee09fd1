use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{non_negative, RowError};
use crate::feed::types::{AnimalType, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [OrderStatus::Pending, OrderStatus::Completed]
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("order status", s))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PurchaseRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub listing_id: Uuid,
    pub animal_type: String,
    pub quantity_weight: f64,
    pub total_price: f64,
    pub status: String,
    pub purchase_date: OffsetDateTime,
}

/// A farm's order against a store listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub listing_id: Uuid,
    pub animal_type: AnimalType,
    pub quantity_weight: f64,
    pub total_price: f64,
    pub status: OrderStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub purchase_date: OffsetDateTime,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = RowError;

    fn try_from(r: PurchaseRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "purchases";
        Ok(Self {
            animal_type: r.animal_type.parse().map_err(RowError::variant(TABLE, r.id))?,
            status: r.status.parse().map_err(RowError::variant(TABLE, r.id))?,
            quantity_weight: non_negative(TABLE, r.id, "quantity_weight", r.quantity_weight)?,
            total_price: non_negative(TABLE, r.id, "total_price", r.total_price)?,
            id: r.id,
            buyer_id: r.buyer_id,
            seller_id: r.seller_id,
            listing_id: r.listing_id,
            purchase_date: r.purchase_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, animal: &str) -> PurchaseRow {
        PurchaseRow {
            id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            animal_type: animal.into(),
            quantity_weight: 4.0,
            total_price: 6.0,
            status: status.into(),
            purchase_date: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn decodes_stored_purchase() {
        let p = Purchase::try_from(row("Completed", "goat")).unwrap();
        assert_eq!(p.status, OrderStatus::Completed);
        assert_eq!(p.animal_type, AnimalType::Goat);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = Purchase::try_from(row("shipped", "pig")).unwrap_err();
        assert!(err.to_string().contains("unknown order status"));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}

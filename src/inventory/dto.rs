use serde::Deserialize;
use time::Date;

use super::repo::NewSupplyItem;
use crate::feed::types::{FoodCategory, ItemStatus, QuantityUnit};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Deserialize)]
pub struct CreateSupplyItemRequest {
    pub name: String,
    pub category: FoodCategory,
    pub amount: f64,
    #[serde(default)]
    pub unit: QuantityUnit,
    #[serde(with = "iso_date")]
    pub expiration_date: Date,
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

impl CreateSupplyItemRequest {
    /// Normalizes the entered amount to pounds.
    pub fn into_new_item(self) -> Result<NewSupplyItem, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("name is required".into());
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err("amount must be a non-negative number".into());
        }
        Ok(NewSupplyItem {
            name,
            category: self.category,
            quantity_weight: self.unit.to_pounds(self.amount),
            expiration_date: self.expiration_date,
            status: self.status.unwrap_or(ItemStatus::Expiring),
        })
    }
}

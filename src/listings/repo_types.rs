use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{non_negative, RowError};
use crate::feed::types::AnimalType;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, FromRow)]
pub struct FeedListingRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub animal_type: String,
    pub quantity_weight: f64,
    pub unit_price: f64,
    pub source_item_ids: Vec<Uuid>,
    pub description: String,
    pub created_at: OffsetDateTime,
}

/// Feed a store offers for one animal type. Weight in pounds, price per pound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedListing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub animal_type: AnimalType,
    pub quantity_weight: f64,
    pub unit_price: f64,
    pub source_item_ids: Vec<Uuid>,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<FeedListingRow> for FeedListing {
    type Error = RowError;

    fn try_from(r: FeedListingRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "feed_listings";
        Ok(Self {
            animal_type: r.animal_type.parse().map_err(RowError::variant(TABLE, r.id))?,
            quantity_weight: non_negative(TABLE, r.id, "quantity_weight", r.quantity_weight)?,
            unit_price: non_negative(TABLE, r.id, "unit_price", r.unit_price)?,
            id: r.id,
            owner_id: r.owner_id,
            source_item_ids: r.source_item_ids,
            description: r.description,
            created_at: r.created_at,
        })
    }
}

/// Listing joined with the selling store's name and coordinates.
#[derive(Debug, Clone, FromRow)]
pub struct StoreListingRow {
    #[sqlx(flatten)]
    pub listing: FeedListingRow,
    pub store_name: String,
    pub store_lat: Option<f64>,
    pub store_lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreListing {
    pub listing: FeedListing,
    pub store_name: String,
    pub store_location: Option<GeoPoint>,
}

impl TryFrom<StoreListingRow> for StoreListing {
    type Error = RowError;

    fn try_from(r: StoreListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            listing: r.listing.try_into()?,
            store_name: r.store_name,
            store_location: GeoPoint::from_columns(r.store_lat, r.store_lng),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(animal: &str, qty: f64, price: f64) -> FeedListingRow {
        FeedListingRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            animal_type: animal.into(),
            quantity_weight: qty,
            unit_price: price,
            source_item_ids: vec![Uuid::new_v4()],
            description: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn listing_row_decodes() {
        let l = FeedListing::try_from(row("Cattle", 40.0, 0.5)).unwrap();
        assert_eq!(l.animal_type, AnimalType::Cattle);
    }

    #[test]
    fn negative_price_is_quarantined() {
        assert!(FeedListing::try_from(row("pig", 40.0, -1.0)).is_err());
    }

    #[test]
    fn store_without_coordinates_has_no_location() {
        let r = StoreListingRow {
            listing: row("goat", 1.0, 1.0),
            store_name: "Corner Grocer".into(),
            store_lat: None,
            store_lng: Some(-74.0),
        };
        assert_eq!(StoreListing::try_from(r).unwrap().store_location, None);
    }
}

use anyhow::Context;
use axum::http::StatusCode;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::reconcile::{
    apply_purchase, ensure_pending, shared_keep_fraction, ListingOutcome, ReconcileError,
};
use super::repo::{self, NewPurchase};
use super::repo_types::{OrderStatus, Purchase};
use crate::feed::types::round_tenth;
use crate::listings::{self, FeedListing};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found")]
    NotFound,
    #[error("listing is no longer available")]
    ListingGone,
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<OrderError> for (StatusCode, String) {
    fn from(e: OrderError) -> Self {
        let status = match &e {
            OrderError::NotFound => StatusCode::NOT_FOUND,
            OrderError::ListingGone | OrderError::Reconcile(ReconcileError::NotPending(_)) => {
                StatusCode::CONFLICT
            }
            OrderError::Reconcile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::Store(inner) => {
                error!(error = %inner, "order store failure");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into());
            }
        };
        (status, e.to_string())
    }
}

/// Validates a farm's order against the listing and prices it.
pub fn quote(listing: &FeedListing, buyer_id: Uuid, quantity: f64) -> Result<NewPurchase, ReconcileError> {
    apply_purchase(listing.quantity_weight, quantity)?;
    Ok(NewPurchase {
        buyer_id,
        seller_id: listing.owner_id,
        listing_id: listing.id,
        animal_type: listing.animal_type,
        quantity_weight: quantity,
        total_price: (quantity * listing.unit_price * 100.0).round() / 100.0,
    })
}

pub async fn place_order(
    db: &PgPool,
    buyer_id: Uuid,
    listing_id: Uuid,
    quantity: f64,
) -> Result<Purchase, OrderError> {
    let listing = listings::repo::find_by_id(db, listing_id)
        .await?
        .ok_or(OrderError::ListingGone)?;
    let new = quote(&listing, buyer_id, quantity)?;
    let purchase = repo::create(db, new).await?;
    info!(
        order_id = %purchase.id,
        %listing_id,
        quantity,
        total = purchase.total_price,
        "order placed"
    );
    Ok(purchase)
}

#[derive(Debug, Serialize)]
pub struct Completion {
    pub order: Purchase,
    pub listing_remaining: f64,
    pub source_items_removed: u64,
}

/// Completes a pending order in one transaction: the listing loses the purchased weight
/// (and disappears when empty) and its source items shrink by the share of everything
/// still listed from them that was sold.
pub async fn complete_order(
    db: &PgPool,
    seller_id: Uuid,
    order_id: Uuid,
) -> Result<Completion, OrderError> {
    let mut tx = db.begin().await.context("begin tx")?;

    let order = repo::lock_tx(&mut tx, order_id)
        .await?
        .filter(|o| o.seller_id == seller_id)
        .ok_or(OrderError::NotFound)?;
    ensure_pending(order.status)?;

    let group = listings::repo::lock_group_tx(&mut tx, order.listing_id).await?;
    let listed: Vec<f64> = group.iter().map(|l| l.quantity_weight).collect();
    let listing = group
        .into_iter()
        .find(|l| l.id == order.listing_id)
        .ok_or(OrderError::ListingGone)?;
    let outcome = apply_purchase(listing.quantity_weight, order.quantity_weight)?;
    let keep = shared_keep_fraction(&listed, order.quantity_weight);

    if !repo::mark_completed_tx(&mut tx, order.id).await? {
        return Err(ReconcileError::NotPending(OrderStatus::Completed).into());
    }
    let listing_remaining = match outcome {
        ListingOutcome::Remaining(q) => {
            listings::repo::set_quantity_tx(&mut tx, listing.id, q).await?;
            round_tenth(q)
        }
        ListingOutcome::Exhausted => {
            listings::repo::delete_tx(&mut tx, listing.id).await?;
            0.0
        }
    };
    let source_items_removed = crate::inventory::repo::scale_down_tx(
        &mut tx,
        seller_id,
        &listing.source_item_ids,
        keep,
    )
    .await?;

    tx.commit().await.context("commit tx")?;

    info!(
        %order_id,
        listing_id = %listing.id,
        listing_remaining,
        source_items_removed,
        "order completed"
    );
    Ok(Completion {
        order: Purchase {
            status: OrderStatus::Completed,
            ..order
        },
        listing_remaining,
        source_items_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::AnimalType;
    use time::OffsetDateTime;

    fn listing(qty: f64, price: f64) -> FeedListing {
        FeedListing {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            animal_type: AnimalType::Cattle,
            quantity_weight: qty,
            unit_price: price,
            source_item_ids: vec![Uuid::new_v4()],
            description: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn quote_prices_quantity_times_unit_price() {
        let l = listing(40.0, 0.35);
        let buyer = Uuid::new_v4();
        let new = quote(&l, buyer, 12.0).unwrap();
        assert_eq!(new.total_price, 4.2);
        assert_eq!(new.seller_id, l.owner_id);
        assert_eq!(new.animal_type, AnimalType::Cattle);
    }

    #[test]
    fn quote_refuses_more_than_listed() {
        let l = listing(5.0, 1.0);
        assert!(matches!(
            quote(&l, Uuid::new_v4(), 5.5),
            Err(ReconcileError::ExceedsListing { .. })
        ));
    }

    #[test]
    fn error_statuses() {
        let (s, _): (StatusCode, String) = OrderError::NotFound.into();
        assert_eq!(s, StatusCode::NOT_FOUND);
        let (s, msg): (StatusCode, String) =
            OrderError::Reconcile(ReconcileError::NotPending(OrderStatus::Completed)).into();
        assert_eq!(s, StatusCode::CONFLICT);
        assert_eq!(msg, "order is already completed");
        let (s, _): (StatusCode, String) =
            OrderError::Reconcile(ReconcileError::NonPositive).into();
        assert_eq!(s, StatusCode::UNPROCESSABLE_ENTITY);
        let (s, msg): (StatusCode, String) = OrderError::Store(anyhow::anyhow!("db down")).into();
        assert_eq!(s, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Internal error");
    }
}

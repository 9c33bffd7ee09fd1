use thiserror::Error;

use super::repo_types::OrderStatus;

/// What is left of a listing once a purchase is taken out of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListingOutcome {
    Remaining(f64),
    Exhausted,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReconcileError {
    #[error("order is already {0}")]
    NotPending(OrderStatus),
    #[error("order of {purchased} lbs exceeds the {available} lbs still listed")]
    ExceedsListing { purchased: f64, available: f64 },
    #[error("purchased quantity must be greater than zero")]
    NonPositive,
}

/// Slack allowed when comparing pound quantities. Anything at or below it counts as empty.
pub const QUANTITY_EPS: f64 = 1e-6;

/// Rounds away float noise so stored quantities match what callers see.
fn settle(qty: f64) -> f64 {
    (qty * 1e6).round() / 1e6
}

/// Takes `purchased` pounds out of a listing holding `listing_qty`.
pub fn apply_purchase(listing_qty: f64, purchased: f64) -> Result<ListingOutcome, ReconcileError> {
    if !(purchased > 0.0) || !purchased.is_finite() {
        return Err(ReconcileError::NonPositive);
    }
    if purchased > listing_qty + QUANTITY_EPS {
        return Err(ReconcileError::ExceedsListing {
            purchased,
            available: listing_qty,
        });
    }
    let remaining = settle(listing_qty - purchased);
    if remaining <= QUANTITY_EPS {
        Ok(ListingOutcome::Exhausted)
    } else {
        Ok(ListingOutcome::Remaining(remaining))
    }
}

/// Share of the source items to keep after selling `purchased` out of a pool of `pool_qty`.
/// Zero once the pool is exhausted.
pub fn keep_fraction(pool_qty: f64, purchased: f64) -> f64 {
    if pool_qty <= QUANTITY_EPS {
        return 0.0;
    }
    let remaining = settle(pool_qty - purchased);
    if remaining <= QUANTITY_EPS {
        return 0.0;
    }
    (remaining / pool_qty).clamp(0.0, 1.0)
}

/// Keep fraction for source items shared by several listings.
/// `listed` holds the current weight of every listing drawn from the same items,
/// the one being sold from included. Applying this after each sale leaves the items at
/// the share of their original weight that is still listed.
pub fn shared_keep_fraction(listed: &[f64], purchased: f64) -> f64 {
    let pool: f64 = listed.iter().filter(|q| q.is_finite() && **q > 0.0).sum();
    keep_fraction(pool, purchased)
}

pub fn ensure_pending(status: OrderStatus) -> Result<(), ReconcileError> {
    match status {
        OrderStatus::Pending => Ok(()),
        other => Err(ReconcileError::NotPending(other)),
    }
}

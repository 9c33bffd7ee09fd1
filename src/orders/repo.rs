use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use super::repo_types::{OrderStatus, Purchase, PurchaseRow};
use crate::auth::AccountKind;
use crate::db::decode_rows;
use crate::feed::types::AnimalType;

const PURCHASE_COLUMNS: &str = "id, buyer_id, seller_id, listing_id, animal_type, quantity_weight, total_price, status, purchase_date";

pub struct NewPurchase {
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub listing_id: Uuid,
    pub animal_type: AnimalType,
    pub quantity_weight: f64,
    pub total_price: f64,
}

pub async fn create(db: &PgPool, new: NewPurchase) -> anyhow::Result<Purchase> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        r#"
        INSERT INTO purchases
            (buyer_id, seller_id, listing_id, animal_type, quantity_weight, total_price, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PURCHASE_COLUMNS}
        "#
    ))
    .bind(new.buyer_id)
    .bind(new.seller_id)
    .bind(new.listing_id)
    .bind(new.animal_type.as_str())
    .bind(new.quantity_weight)
    .bind(new.total_price)
    .bind(OrderStatus::Pending.as_str())
    .fetch_one(db)
    .await
    .context("insert purchase")?;
    Ok(Purchase::try_from(row)?)
}

/// Orders placed by a farm, or received by a store, newest first.
pub async fn list_for_account(
    db: &PgPool,
    account_id: Uuid,
    kind: AccountKind,
) -> anyhow::Result<Vec<Purchase>> {
    let column = match kind {
        AccountKind::Farm => "buyer_id",
        AccountKind::Store => "seller_id",
    };
    let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE {column} = $1 ORDER BY purchase_date DESC"
    ))
    .bind(account_id)
    .fetch_all(db)
    .await
    .context("list purchases")?;
    Ok(decode_rows(rows))
}

/// Locks the order row for the rest of the transaction.
pub async fn lock_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<Purchase>> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock purchase")?;
    row.map(Purchase::try_from).transpose().map_err(Into::into)
}

/// Flips a pending order to completed. False when it was not pending anymore.
pub async fn mark_completed_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE purchases SET status = $2 WHERE id = $1 AND status = $3")
        .bind(id)
        .bind(OrderStatus::Completed.as_str())
        .bind(OrderStatus::Pending.as_str())
        .execute(&mut **tx)
        .await
        .context("complete purchase")?;
    Ok(res.rows_affected() == 1)
}

/// Pounds of feed a farm has received per animal type, counting completed orders only.
pub async fn completed_weight_by_animal(
    db: &PgPool,
    buyer_id: Uuid,
) -> anyhow::Result<Vec<(AnimalType, f64)>> {
    let rows: Vec<(String, f64)> = sqlx::query_as(
        r#"
        SELECT animal_type, COALESCE(SUM(quantity_weight), 0)::DOUBLE PRECISION
          FROM purchases
         WHERE buyer_id = $1 AND status = $2
         GROUP BY animal_type
        "#,
    )
    .bind(buyer_id)
    .bind(OrderStatus::Completed.as_str())
    .fetch_all(db)
    .await
    .context("sum completed purchases")?;

    Ok(rows
        .into_iter()
        .filter_map(|(animal, weight)| match animal.parse::<AnimalType>() {
            Ok(a) => Some((a, weight)),
            Err(e) => {
                warn!(error = %e, %buyer_id, "skipping purchases with unknown animal type");
                None
            }
        })
        .collect())
}

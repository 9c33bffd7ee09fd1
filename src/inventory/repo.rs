use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;
use uuid::Uuid;

use super::repo_types::{SupplyItem, SupplyItemRow};
use crate::db::decode_rows;
use crate::feed::types::{FoodCategory, ItemStatus};

const ITEM_COLUMNS: &str =
    "id, owner_id, name, category, quantity_weight, expiration_date, status, created_at";

pub struct NewSupplyItem {
    pub name: String,
    pub category: FoodCategory,
    pub quantity_weight: f64,
    pub expiration_date: Date,
    pub status: ItemStatus,
}

/// Owner's items, soonest expiration first.
pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<SupplyItem>> {
    let rows = sqlx::query_as::<_, SupplyItemRow>(&format!(
        r#"
        SELECT {ITEM_COLUMNS}
          FROM supply_items
         WHERE owner_id = $1
         ORDER BY expiration_date ASC, created_at ASC
        "#
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("list supply items")?;
    Ok(decode_rows(rows))
}

/// Only rows owned by `owner_id` come back, whatever ids were asked for.
pub async fn find_owned(
    db: &PgPool,
    owner_id: Uuid,
    ids: &[Uuid],
) -> anyhow::Result<Vec<SupplyItem>> {
    let rows = sqlx::query_as::<_, SupplyItemRow>(&format!(
        r#"
        SELECT {ITEM_COLUMNS}
          FROM supply_items
         WHERE owner_id = $1 AND id = ANY($2)
         ORDER BY created_at ASC
        "#
    ))
    .bind(owner_id)
    .bind(ids)
    .fetch_all(db)
    .await
    .context("find owned supply items")?;
    Ok(decode_rows(rows))
}

pub async fn insert(db: &PgPool, owner_id: Uuid, new: NewSupplyItem) -> anyhow::Result<SupplyItem> {
    let row = sqlx::query_as::<_, SupplyItemRow>(&format!(
        r#"
        INSERT INTO supply_items (owner_id, name, category, quantity_weight, expiration_date, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(owner_id)
    .bind(&new.name)
    .bind(new.category.as_str())
    .bind(new.quantity_weight)
    .bind(new.expiration_date)
    .bind(new.status.as_str())
    .fetch_one(db)
    .await
    .context("insert supply item")?;
    Ok(SupplyItem::try_from(row)?)
}

/// Returns whether a row was deleted.
pub async fn delete(db: &PgPool, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM supply_items WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await
        .context("delete supply item")?;
    Ok(res.rows_affected() > 0)
}

/// Multiplies each listed item's weight by `keep` (0..=1), then drops emptied items.
pub async fn scale_down_tx(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: Uuid,
    ids: &[Uuid],
    keep: f64,
) -> anyhow::Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    sqlx::query(
        r#"
        UPDATE supply_items
           SET quantity_weight = GREATEST(quantity_weight * $3, 0)
         WHERE owner_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(owner_id)
    .bind(ids)
    .bind(keep)
    .execute(&mut **tx)
    .await
    .context("scale down supply items")?;

    let removed = sqlx::query(
        "DELETE FROM supply_items WHERE owner_id = $1 AND id = ANY($2) AND quantity_weight <= 0",
    )
    .bind(owner_id)
    .bind(ids)
    .execute(&mut **tx)
    .await
    .context("remove emptied supply items")?;
    Ok(removed.rows_affected())
}

use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{FeedListing, FeedListingRow, StoreListing, StoreListingRow};
use crate::db::decode_rows;
use crate::feed::drafts::FeedListingDraft;
use crate::feed::types::AnimalType;

const LISTING_COLUMNS: &str =
    "id, owner_id, animal_type, quantity_weight, unit_price, source_item_ids, description, created_at";

pub async fn insert_drafts(
    db: &PgPool,
    owner_id: Uuid,
    drafts: &[FeedListingDraft],
    source_item_ids: &[Uuid],
    description: &str,
) -> anyhow::Result<Vec<FeedListing>> {
    let mut tx = db.begin().await.context("begin tx")?;
    let mut out = Vec::with_capacity(drafts.len());
    for d in drafts {
        let row = sqlx::query_as::<_, FeedListingRow>(&format!(
            r#"
            INSERT INTO feed_listings
                (owner_id, animal_type, quantity_weight, unit_price, source_item_ids, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(d.animal_type.as_str())
        .bind(d.quantity_weight)
        .bind(d.unit_price)
        .bind(source_item_ids)
        .bind(description)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("insert {} listing", d.animal_type))?;
        out.push(FeedListing::try_from(row)?);
    }
    tx.commit().await.context("commit tx")?;
    Ok(out)
}

pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<FeedListing>> {
    let rows = sqlx::query_as::<_, FeedListingRow>(&format!(
        r#"
        SELECT {LISTING_COLUMNS}
          FROM feed_listings
         WHERE owner_id = $1
         ORDER BY created_at DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("list listings by owner")?;
    Ok(decode_rows(rows))
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FeedListing>> {
    let row = sqlx::query_as::<_, FeedListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM feed_listings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find listing")?;
    row.map(FeedListing::try_from).transpose().map_err(Into::into)
}

/// Every listing with stock left, with its store's coordinates, optionally for one animal type.
pub async fn list_with_store(
    db: &PgPool,
    animal_type: Option<AnimalType>,
) -> anyhow::Result<Vec<StoreListing>> {
    let rows = sqlx::query_as::<_, StoreListingRow>(
        r#"
        SELECT l.id, l.owner_id, l.animal_type, l.quantity_weight, l.unit_price,
               l.source_item_ids, l.description, l.created_at,
               a.name AS store_name, a.lat AS store_lat, a.lng AS store_lng
          FROM feed_listings l
          JOIN accounts a ON a.id = l.owner_id
         WHERE l.quantity_weight > 0
           AND ($1::text IS NULL OR l.animal_type = $1)
         ORDER BY l.created_at ASC
        "#,
    )
    .bind(animal_type.map(AnimalType::as_str))
    .fetch_all(db)
    .await
    .context("list listings with store")?;
    Ok(decode_rows(rows))
}

pub async fn delete(db: &PgPool, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM feed_listings WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await
        .context("delete listing")?;
    Ok(res.rows_affected() > 0)
}

/// Locks the listing together with every listing of the same owner drawn from the same
/// source items, in id order. Empty when the listing is gone.
pub async fn lock_group_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Vec<FeedListing>> {
    let rows = sqlx::query_as::<_, FeedListingRow>(&format!(
        r#"
        SELECT {LISTING_COLUMNS}
          FROM feed_listings
         WHERE id = $1
            OR (owner_id, source_item_ids) = (
                   SELECT owner_id, source_item_ids
                     FROM feed_listings
                    WHERE id = $1 AND cardinality(source_item_ids) > 0
               )
         ORDER BY id
           FOR UPDATE
        "#
    ))
    .bind(id)
    .fetch_all(&mut **tx)
    .await
    .context("lock listing group")?;
    rows.into_iter()
        .map(|r| FeedListing::try_from(r).map_err(anyhow::Error::from))
        .collect()
}

pub async fn set_quantity_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    quantity_weight: f64,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE feed_listings SET quantity_weight = $2 WHERE id = $1")
        .bind(id)
        .bind(quantity_weight)
        .execute(&mut **tx)
        .await
        .context("update listing quantity")?;
    Ok(())
}

pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM feed_listings WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("delete exhausted listing")?;
    Ok(())
}

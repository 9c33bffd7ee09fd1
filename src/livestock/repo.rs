use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{LivestockHolding, LivestockRow};
use crate::db::decode_rows;
use crate::feed::types::AnimalType;

const LIVESTOCK_COLUMNS: &str =
    "id, farm_id, animal_type, count, weekly_feed_requirement, created_at";

pub struct NewHolding {
    pub animal_type: AnimalType,
    pub count: u32,
    pub weekly_feed_requirement: f64,
}

pub async fn list_by_farm(db: &PgPool, farm_id: Uuid) -> anyhow::Result<Vec<LivestockHolding>> {
    let rows = sqlx::query_as::<_, LivestockRow>(&format!(
        "SELECT {LIVESTOCK_COLUMNS} FROM livestock WHERE farm_id = $1 ORDER BY created_at ASC"
    ))
    .bind(farm_id)
    .fetch_all(db)
    .await
    .context("list livestock")?;
    Ok(decode_rows(rows))
}

pub async fn insert(db: &PgPool, farm_id: Uuid, new: NewHolding) -> anyhow::Result<LivestockHolding> {
    let count = i32::try_from(new.count).context("livestock count too large")?;
    let row = sqlx::query_as::<_, LivestockRow>(&format!(
        r#"
        INSERT INTO livestock (farm_id, animal_type, count, weekly_feed_requirement)
        VALUES ($1, $2, $3, $4)
        RETURNING {LIVESTOCK_COLUMNS}
        "#
    ))
    .bind(farm_id)
    .bind(new.animal_type.as_str())
    .bind(count)
    .bind(new.weekly_feed_requirement)
    .fetch_one(db)
    .await
    .context("insert livestock")?;
    Ok(LivestockHolding::try_from(row)?)
}

pub async fn delete(db: &PgPool, farm_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM livestock WHERE id = $1 AND farm_id = $2")
        .bind(id)
        .bind(farm_id)
        .execute(db)
        .await
        .context("delete livestock")?;
    Ok(res.rows_affected() > 0)
}

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{Account, AccountKind, AccountRow};
use crate::geo::GeoPoint;

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, kind, name, address, lat, lng, created_at";

pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub kind: AccountKind,
    pub name: &'a str,
    pub address: Option<&'a str>,
    pub location: Option<GeoPoint>,
}

impl Account {
    /// Find an account by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find account by email")?;
        row.map(Account::try_from).transpose().map_err(Into::into)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find account by id")?;
        row.map(Account::try_from).transpose().map_err(Into::into)
    }

    /// Create a new account with a hashed password.
    pub async fn create(db: &PgPool, new: NewAccount<'_>) -> anyhow::Result<Account> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (email, password_hash, kind, name, address, lat, lng)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.kind.as_str())
        .bind(new.name)
        .bind(new.address)
        .bind(new.location.map(|p| p.lat))
        .bind(new.location.map(|p| p.lng))
        .fetch_one(db)
        .await
        .context("insert account")?;
        Ok(Account::try_from(row)?)
    }

    /// Overwrites address and coordinates. A `None` location clears stale coordinates.
    pub async fn update_location(
        db: &PgPool,
        id: Uuid,
        address: &str,
        location: Option<GeoPoint>,
    ) -> anyhow::Result<Account> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE accounts SET address = $2, lat = $3, lng = $4
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(address)
        .bind(location.map(|p| p.lat))
        .bind(location.map(|p| p.lng))
        .fetch_one(db)
        .await
        .context("update account location")?;
        Ok(Account::try_from(row)?)
    }

    /// Stores coordinates only; the address stays as entered.
    pub async fn set_coordinates(db: &PgPool, id: Uuid, location: GeoPoint) -> anyhow::Result<()> {
        sqlx::query("UPDATE accounts SET lat = $2, lng = $3 WHERE id = $1")
            .bind(id)
            .bind(location.lat)
            .bind(location.lng)
            .execute(db)
            .await
            .context("set account coordinates")?;
        Ok(())
    }

    /// `(id, address)` for every account that has an address on file.
    pub async fn list_addresses(db: &PgPool) -> anyhow::Result<Vec<(Uuid, String)>> {
        sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, address FROM accounts WHERE address IS NOT NULL AND address <> ''",
        )
        .fetch_all(db)
        .await
        .context("list account addresses")
    }
}

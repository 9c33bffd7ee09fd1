use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::RowError;
use crate::feed::types::UnknownVariant;
use crate::geo::GeoPoint;

/// Whether an account sells surplus (store) or buys feed (farm).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Store,
    Farm,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Store => "store",
            AccountKind::Farm => "farm",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store" => Ok(AccountKind::Store),
            "farm" => Ok(AccountKind::Farm),
            _ => Err(UnknownVariant {
                kind: "account kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Account row in the database.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // Argon2 hash
    pub kind: String,
    pub name: String,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub kind: AccountKind,
    pub name: String,
    pub address: Option<String>,
    /// `None` until the address geocodes to a valid point.
    pub location: Option<GeoPoint>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<AccountRow> for Account {
    type Error = RowError;

    fn try_from(r: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: r.kind.parse().map_err(RowError::variant("accounts", r.id))?,
            location: GeoPoint::from_columns(r.lat, r.lng),
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            name: r.name,
            address: r.address,
            created_at: r.created_at,
        })
    }
}

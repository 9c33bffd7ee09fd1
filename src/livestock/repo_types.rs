use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{non_negative, RowError};
use crate::feed::types::AnimalType;

#[derive(Debug, Clone, FromRow)]
pub struct LivestockRow {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub animal_type: String,
    pub count: i32,
    pub weekly_feed_requirement: f64,
    pub created_at: OffsetDateTime,
}

/// A group of animals on a farm. The requirement is pounds per head per week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivestockHolding {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub animal_type: AnimalType,
    pub count: u32,
    pub weekly_feed_requirement: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<LivestockRow> for LivestockHolding {
    type Error = RowError;

    fn try_from(r: LivestockRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "livestock";
        let count = u32::try_from(r.count).map_err(|_| RowError::OutOfRange {
            table: TABLE,
            id: r.id,
            field: "count",
            value: f64::from(r.count),
        })?;
        Ok(Self {
            animal_type: r.animal_type.parse().map_err(RowError::variant(TABLE, r.id))?,
            weekly_feed_requirement: non_negative(
                TABLE,
                r.id,
                "weekly_feed_requirement",
                r.weekly_feed_requirement,
            )?,
            count,
            id: r.id,
            farm_id: r.farm_id,
            created_at: r.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(count: i32, animal: &str) -> LivestockRow {
        LivestockRow {
            id: Uuid::new_v4(),
            farm_id: Uuid::new_v4(),
            animal_type: animal.into(),
            count,
            weekly_feed_requirement: 10.0,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn decodes_holding() {
        let h = LivestockHolding::try_from(row(12, "Pig")).unwrap();
        assert_eq!(h.count, 12);
        assert_eq!(h.animal_type, AnimalType::Pig);
    }

    #[test]
    fn negative_count_is_out_of_range() {
        let err = LivestockHolding::try_from(row(-1, "pig")).unwrap_err();
        assert!(matches!(err, RowError::OutOfRange { field: "count", .. }));
    }
}

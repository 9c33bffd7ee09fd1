use thiserror::Error;
use uuid::Uuid;

use crate::feed::types::UnknownVariant;

/// A row that came back from the store but does not describe a valid entity.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("{table} row {id}: {source}")]
    Variant {
        table: &'static str,
        id: Uuid,
        #[source]
        source: UnknownVariant,
    },
    #[error("{table} row {id}: {field} out of range ({value})")]
    OutOfRange {
        table: &'static str,
        id: Uuid,
        field: &'static str,
        value: f64,
    },
}

impl RowError {
    pub fn variant(table: &'static str, id: Uuid) -> impl FnOnce(UnknownVariant) -> Self {
        move |source| RowError::Variant { table, id, source }
    }
}

/// Rejects negative or non-finite weights/prices/counts read from a row.
pub fn non_negative(
    table: &'static str,
    id: Uuid,
    field: &'static str,
    value: f64,
) -> Result<f64, RowError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RowError::OutOfRange {
            table,
            id,
            field,
            value,
        })
    }
}

/// Converts rows into entities, skipping (and logging) the ones that fail validation.
pub fn decode_rows<R, T>(rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = RowError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = %e, "quarantined invalid row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Raw(f64);
    #[derive(Debug)]
    struct Weight(f64);

    impl TryFrom<Raw> for Weight {
        type Error = RowError;
        fn try_from(r: Raw) -> Result<Self, Self::Error> {
            non_negative("weights", Uuid::nil(), "value", r.0).map(Weight)
        }
    }

    #[test]
    fn decode_rows_drops_invalid_entries() {
        let out: Vec<Weight> = decode_rows(vec![Raw(1.0), Raw(-2.0), Raw(f64::NAN), Raw(3.0)]);
        let values: Vec<f64> = out.iter().map(|w| w.0).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn out_of_range_error_names_the_field() {
        let err = non_negative("supply_items", Uuid::nil(), "quantity_weight", -1.0).unwrap_err();
        assert!(err.to_string().contains("quantity_weight out of range"));
    }
}

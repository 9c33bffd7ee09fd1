use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use super::password::MIN_PASSWORD_LEN;
use super::repo_types::Account;
use crate::geo::{geocode_all, GeoPoint, Geocoder};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Checks sign-up input after normalization; returns the message shown to the client.
pub(crate) fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), String> {
    if !is_valid_email(email) {
        return Err("Invalid email".into());
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err("Password too short".into());
    }
    if name.trim().is_empty() {
        return Err("Name is required".into());
    }
    Ok(())
}

/// Geocodes an address, treating provider failures as "no location".
/// The account is still usable; it just won't appear in distance searches.
pub async fn locate(geocoder: &dyn Geocoder, address: Option<&str>) -> Option<GeoPoint> {
    let address = address?.trim();
    if address.is_empty() {
        return None;
    }
    match geocoder.geocode(address).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "geocoding address failed; location left empty");
            None
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CoordinateRefresh {
    pub updated: usize,
    pub unresolved: usize,
}

/// Re-geocodes every account with an address and overwrites its coordinates.
/// Addresses that do not resolve keep whatever coordinates they had.
pub async fn refresh_all_coordinates(
    db: &PgPool,
    geocoder: &dyn Geocoder,
) -> anyhow::Result<CoordinateRefresh> {
    let addresses = Account::list_addresses(db).await?;
    info!(count = addresses.len(), "refreshing account coordinates");

    let mut summary = CoordinateRefresh::default();
    for (id, point) in geocode_all(geocoder, addresses).await {
        match point {
            Some(p) => {
                Account::set_coordinates(db, id, p).await?;
                summary.updated += 1;
            }
            None => summary.unresolved += 1,
        }
    }
    info!(updated = summary.updated, unresolved = summary.unresolved, "coordinates refreshed");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Down;

    #[async_trait]
    impl Geocoder for Down {
        async fn geocode(&self, _address: &str) -> anyhow::Result<Option<GeoPoint>> {
            anyhow::bail!("OVER_QUERY_LIMIT")
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("store@example.com"));
        assert!(!is_valid_email("store@example"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration("a@b.co", "longenough", "Corner Grocer").is_ok());
        assert_eq!(
            validate_registration("a@b.co", "short", "x"),
            Err("Password too short".to_string())
        );
        assert_eq!(
            validate_registration("a@b.co", "longenough", "  "),
            Err("Name is required".to_string())
        );
    }

    #[tokio::test]
    async fn failed_geocode_leaves_location_empty() {
        assert_eq!(locate(&Down, Some("1 Main St")).await, None);
        assert_eq!(locate(&Down, None).await, None);
    }
}

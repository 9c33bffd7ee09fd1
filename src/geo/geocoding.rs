use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use super::distance::GeoPoint;
use crate::config::GeocodingConfig;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the provider has no match for the address.
    async fn geocode(&self, address: &str) -> anyhow::Result<Option<GeoPoint>>;
}

/// Google-style geocode JSON API.
#[derive(Clone)]
pub struct HttpGeocoder {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: GeoPoint,
}

impl HttpGeocoder {
    pub fn new(cfg: &GeocodingConfig, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build geocoding http client")?;
        Ok(Self {
            http,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> anyhow::Result<Option<GeoPoint>> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }
        anyhow::ensure!(!self.api_key.is_empty(), "geocoding api key is not configured");

        let body: GeocodeResponse = self
            .http
            .get(&self.api_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("send geocode request")?
            .error_for_status()
            .context("geocode request rejected")?
            .json()
            .await
            .context("decode geocode response")?;

        match body.status.as_str() {
            "OK" => {
                let point = body
                    .results
                    .into_iter()
                    .next()
                    .and_then(|r| GeoPoint::new(r.geometry.location.lat, r.geometry.location.lng));
                debug!(%address, found = point.is_some(), "geocoded");
                Ok(point)
            }
            "ZERO_RESULTS" => Ok(None),
            other => anyhow::bail!(
                "geocoding failed with status {}: {}",
                other,
                body.error_message.unwrap_or_default()
            ),
        }
    }
}

/// Geocodes every address concurrently. Results are paired with their key, not their
/// position; a failed lookup is logged and reported as `None`.
pub async fn geocode_all<K>(
    geocoder: &dyn Geocoder,
    addresses: Vec<(K, String)>,
) -> Vec<(K, Option<GeoPoint>)>
where
    K: std::fmt::Display,
{
    join_all(addresses.into_iter().map(|(key, address)| async move {
        let point = match geocoder.geocode(&address).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, %key, "geocoding failed");
                None
            }
        };
        (key, point)
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Lookup(HashMap<&'static str, GeoPoint>);

    #[async_trait]
    impl Geocoder for Lookup {
        async fn geocode(&self, address: &str) -> anyhow::Result<Option<GeoPoint>> {
            if address == "boom" {
                anyhow::bail!("provider down");
            }
            // answer later requests first
            tokio::time::sleep(Duration::from_millis(10 * (5 - address.len().min(5)) as u64)).await;
            Ok(self.0.get(address).copied())
        }
    }

    #[tokio::test]
    async fn results_stay_paired_with_keys() {
        let geocoder = Lookup(HashMap::from([
            ("a", GeoPoint { lat: 1.0, lng: 1.0 }),
            ("bbbb", GeoPoint { lat: 4.0, lng: 4.0 }),
        ]));
        let out = geocode_all(
            &geocoder,
            vec![
                (1, "a".to_string()),
                (2, "boom".to_string()),
                (3, "bbbb".to_string()),
                (4, "zz".to_string()),
            ],
        )
        .await;
        let by_key: HashMap<i32, Option<GeoPoint>> = out.into_iter().collect();
        assert_eq!(by_key[&1], Some(GeoPoint { lat: 1.0, lng: 1.0 }));
        assert_eq!(by_key[&2], None);
        assert_eq!(by_key[&3], Some(GeoPoint { lat: 4.0, lng: 4.0 }));
        assert_eq!(by_key[&4], None);
    }

    #[tokio::test]
    async fn empty_address_is_not_sent() {
        let cfg = GeocodingConfig {
            api_url: "http://127.0.0.1:9/unused".into(),
            api_key: String::new(),
        };
        let geocoder = HttpGeocoder::new(&cfg, Duration::from_secs(1)).unwrap();
        assert_eq!(geocoder.geocode("   ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_key_is_an_error() {
        let cfg = GeocodingConfig {
            api_url: "http://127.0.0.1:9/unused".into(),
            api_key: String::new(),
        };
        let geocoder = HttpGeocoder::new(&cfg, Duration::from_secs(1)).unwrap();
        assert!(geocoder.geocode("1 Main St").await.is_err());
    }

    #[test]
    fn response_decodes() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{"status":"OK","results":[{"geometry":{"location":{"lat":40.7,"lng":-74.0}}}]}"#,
        )
        .unwrap();
        assert_eq!(body.results[0].geometry.location.lat, 40.7);
    }
}

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Text-completion provider (Gemini-style `generateContent` endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

/// Geocoding provider (Google-style geocode JSON endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub completion: CompletionConfig,
    pub geocoding: GeocodingConfig,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "farmconnect".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "farmconnect-accounts".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: parse_var("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let completion = CompletionConfig {
            api_url: std::env::var("COMPLETION_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            api_key: std::env::var("COMPLETION_API_KEY").unwrap_or_default(),
            model: std::env::var("COMPLETION_MODEL").unwrap_or_else(|_| "gemini-pro".into()),
        };
        let geocoding = GeocodingConfig {
            api_url: std::env::var("GEOCODING_API_URL").unwrap_or_else(|_| {
                "https://maps.googleapis.com/maps/api/geocode/json".into()
            }),
            api_key: std::env::var("GEOCODING_API_KEY").unwrap_or_default(),
        };
        if completion.api_key.is_empty() {
            tracing::warn!("COMPLETION_API_KEY is empty; language-model estimates will fail");
        }
        if geocoding.api_key.is_empty() {
            tracing::warn!("GEOCODING_API_KEY is empty; addresses will not be geocoded");
        }

        Ok(Self {
            database_url,
            jwt,
            completion,
            geocoding,
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS").unwrap_or(30),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

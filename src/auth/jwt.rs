use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use super::repo_types::AccountKind;
use crate::{config::JwtConfig, state::AppState};

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    fn sign_with_kind(
        &self,
        account_id: Uuid,
        acct: AccountKind,
        kind: TokenKind,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: account_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            acct,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = %account_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, account_id: Uuid, acct: AccountKind) -> anyhow::Result<String> {
        self.sign_with_kind(account_id, acct, TokenKind::Access)
    }

    pub fn sign_refresh(&self, account_id: Uuid, acct: AccountKind) -> anyhow::Result<String> {
        self.sign_with_kind(account_id, acct, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(account_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

/// The authenticated caller, passed explicitly to every operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub account_id: Uuid,
    pub kind: AccountKind,
}

impl Session {
    pub fn require(&self, kind: AccountKind) -> Result<(), (StatusCode, String)> {
        if self.kind == kind {
            Ok(())
        } else {
            warn!(account_id = %self.account_id, expected = %kind, actual = %self.kind, "wrong account type");
            Err((
                StatusCode::FORBIDDEN,
                format!("wrong account type: {} account required", kind),
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Access token required".to_string(),
            ));
        }

        Ok(Session {
            account_id: claims.sub,
            kind: claims.acct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    async fn extract(keys: &JwtKeys, header: Option<String>) -> Result<Session, (StatusCode, String)> {
        let mut builder = Request::builder().uri("/");
        if let Some(h) = header {
            builder = builder.header(axum::http::header::AUTHORIZATION, h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Session::from_request_parts(&mut parts, keys).await
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let id = Uuid::new_v4();
        let token = keys.sign_access(id, AccountKind::Farm).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.acct, AccountKind::Farm);
    }

    #[test]
    fn verify_refresh_rejects_access_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign_access(Uuid::new_v4(), AccountKind::Store).unwrap();
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
    }

    #[test]
    fn verify_rejects_wrong_audience() {
        let good = make_keys("same-secret", "iss", "good-aud");
        let bad = make_keys("same-secret", "iss", "bad-aud");
        let token = good.sign_access(Uuid::new_v4(), AccountKind::Store).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[tokio::test]
    async fn session_extracted_from_bearer_token() {
        let keys = make_keys("s", "i", "a");
        let id = Uuid::new_v4();
        let token = keys.sign_access(id, AccountKind::Store).unwrap();
        let session = extract(&keys, Some(format!("Bearer {token}"))).await.unwrap();
        assert_eq!(
            session,
            Session {
                account_id: id,
                kind: AccountKind::Store
            }
        );
    }

    #[tokio::test]
    async fn refresh_token_cannot_open_a_session() {
        let keys = make_keys("s", "i", "a");
        let token = keys.sign_refresh(Uuid::new_v4(), AccountKind::Farm).unwrap();
        let (status, _) = extract(&keys, Some(format!("Bearer {token}"))).await.unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let keys = make_keys("s", "i", "a");
        let (status, msg) = extract(&keys, None).await.unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(msg.contains("Missing"));
    }

    #[test]
    fn require_checks_account_kind() {
        let session = Session {
            account_id: Uuid::new_v4(),
            kind: AccountKind::Farm,
        };
        assert!(session.require(AccountKind::Farm).is_ok());
        let (status, _) = session.require(AccountKind::Store).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

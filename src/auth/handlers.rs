use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    app::internal,
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicAccount, RefreshRequest, RegisterRequest,
            UpdateAddressRequest,
        },
        jwt::{JwtKeys, Session},
        password::{hash_password, verify_password},
        repo::NewAccount,
        repo_types::Account,
        services::{is_valid_email, locate, validate_registration},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/address", put(update_address))
}

fn issue_tokens(
    state: &AppState,
    account: Account,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(account.id, account.kind).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh_token = keys.sign_refresh(account.id, account.kind).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        account: account.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if let Err(msg) = validate_registration(&payload.email, &payload.password, &payload.name) {
        warn!(email = %payload.email, reason = %msg, "registration rejected");
        return Err((StatusCode::BAD_REQUEST, msg));
    }

    match Account::find_by_email(&state.db, &payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Ok(None) => {}
        Err(e) => return Err(internal(e)),
    }

    let hash = hash_password(&payload.password)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let address = payload.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
    let location = locate(state.geocoder.as_ref(), address).await;

    let account = Account::create(
        &state.db,
        NewAccount {
            email: &payload.email,
            password_hash: &hash,
            kind: payload.kind,
            name: payload.name.trim(),
            address,
            location,
        },
    )
    .await
    .map_err(internal)?;

    info!(account_id = %account.id, kind = %account.kind, located = location.is_some(), "account registered");
    issue_tokens(&state, account)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let account = match Account::find_by_email(&state.db, &payload.email).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => return Err(internal(e)),
    };

    let ok = verify_password(&payload.password, &account.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    if !ok {
        warn!(account_id = %account.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    info!(account_id = %account.id, kind = %account.kind, "account logged in");
    issue_tokens(&state, account)
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let account = Account::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "Account not found".to_string()))?;

    issue_tokens(&state, account)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PublicAccount>, (StatusCode, String)> {
    let account = Account::find_by_id(&state.db, session.account_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "Account not found".to_string()))?;

    Ok(Json(account.into()))
}

/// Re-geocodes the caller's address. A provider failure leaves the stored record untouched.
#[instrument(skip(state, payload))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UpdateAddressRequest>,
) -> Result<Json<PublicAccount>, (StatusCode, String)> {
    let address = payload.address.trim();
    if address.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Address is required".into()));
    }

    let location = state.geocoder.geocode(address).await.map_err(|e| {
        error!(error = %e, account_id = %session.account_id, "geocoding failed");
        (StatusCode::BAD_GATEWAY, "Geocoding unavailable, try again".to_string())
    })?;
    if location.is_none() {
        warn!(account_id = %session.account_id, "address did not resolve");
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "Address could not be located".into()));
    }

    let account = Account::update_location(&state.db, session.account_id, address, location)
        .await
        .map_err(internal)?;

    info!(account_id = %account.id, "address updated");
    Ok(Json(account.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::AccountKind;
    use crate::geo::GeoPoint;

    #[test]
    fn public_account_omits_password() {
        let response = PublicAccount {
            id: uuid::Uuid::new_v4(),
            email: "store@example.com".to_string(),
            kind: AccountKind::Store,
            name: "Corner Grocer".into(),
            address: None,
            location: Some(GeoPoint { lat: 1.0, lng: 2.0 }),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("store@example.com"));
        assert!(json.contains("\"location\":{\"lat\":1.0,\"lng\":2.0}"));
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn issued_tokens_carry_account_kind() {
        let state = AppState::fake();
        let account = Account {
            id: uuid::Uuid::new_v4(),
            email: "farm@example.com".into(),
            password_hash: String::new(),
            kind: AccountKind::Farm,
            name: "Green Acres".into(),
            address: None,
            location: None,
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let id = account.id;
        let Json(resp) = issue_tokens(&state, account).unwrap();
        let claims = JwtKeys::from_ref(&state).verify(&resp.access_token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.acct, AccountKind::Farm);
    }
}

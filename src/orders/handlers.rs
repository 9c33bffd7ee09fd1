use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo;
use super::repo_types::Purchase;
use super::services::{complete_order, place_order, Completion};
use crate::{
    app::internal,
    auth::{AccountKind, Session},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub listing_id: Uuid,
    pub quantity_weight: f64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id/complete", post(complete))
}

#[instrument(skip(state))]
pub async fn create_order(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Purchase>), (StatusCode, String)> {
    session.require(AccountKind::Farm)?;
    if !(payload.quantity_weight > 0.0) || !payload.quantity_weight.is_finite() {
        return Err((
            StatusCode::BAD_REQUEST,
            "quantity_weight must be greater than zero".into(),
        ));
    }
    let purchase = place_order(
        &state.db,
        session.account_id,
        payload.listing_id,
        payload.quantity_weight,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// Farms see what they bought, stores see what they sold.
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Purchase>>, (StatusCode, String)> {
    let orders = repo::list_for_account(&state.db, session.account_id, session.kind)
        .await
        .map_err(internal)?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
pub async fn complete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Completion>, (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    let completion = complete_order(&state.db, session.account_id, id).await?;
    Ok(Json(completion))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(kind: AccountKind) -> Session {
        Session {
            account_id: Uuid::new_v4(),
            kind,
        }
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let req = PlaceOrderRequest {
            listing_id: Uuid::new_v4(),
            quantity_weight: 0.0,
        };
        let err = create_order(State(AppState::fake()), session(AccountKind::Farm), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stores_cannot_order() {
        let req = PlaceOrderRequest {
            listing_id: Uuid::new_v4(),
            quantity_weight: 2.0,
        };
        let err = create_order(State(AppState::fake()), session(AccountKind::Store), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn only_sellers_complete() {
        let err = complete(
            State(AppState::fake()),
            session(AccountKind::Farm),
            Path(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }
}

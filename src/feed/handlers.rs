use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::services::{estimate_owned_items, EstimateMethod, Estimation};
use crate::{
    auth::{AccountKind, Session},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub item_ids: Vec<Uuid>,
    #[serde(default)]
    pub method: EstimateMethod,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/feed/estimate", post(estimate))
}

/// Preview only: nothing is written, whichever method is used.
#[instrument(skip(state, payload), fields(method = ?payload.method))]
pub async fn estimate(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<EstimateRequest>,
) -> Result<Json<Estimation>, (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    let estimation =
        estimate_owned_items(&state, session.account_id, &payload.item_ids, payload.method)
            .await?;
    Ok(Json(estimation))
}

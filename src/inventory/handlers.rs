use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{dto::CreateSupplyItemRequest, repo, SupplyItem};
use crate::{
    app::internal,
    auth::{AccountKind, Session},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_items).post(create_item))
        .route("/inventory/:id", delete(delete_item))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<SupplyItem>>, (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    let items = repo::list_by_owner(&state.db, session.account_id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateSupplyItemRequest>,
) -> Result<(StatusCode, Json<SupplyItem>), (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    let new = payload.into_new_item().map_err(|msg| {
        warn!(reason = %msg, "supply item rejected");
        (StatusCode::BAD_REQUEST, msg)
    })?;

    let item = repo::insert(&state.db, session.account_id, new)
        .await
        .map_err(internal)?;
    info!(item_id = %item.id, weight = item.quantity_weight, "supply item added");
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    match repo::delete(&state.db, session.account_id, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((StatusCode::NOT_FOUND, "Item not found".into())),
        Err(e) => Err(internal(e)),
    }
}

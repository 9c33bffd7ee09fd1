use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateListingsRequest, CreateListingsResponse, NearbyQuery};
use super::repo;
use super::repo_types::FeedListing;
use super::services::{priced_drafts, search_nearby, source_ids, NearbyListing};
use crate::{
    app::internal,
    auth::{Account, AccountKind, Session},
    feed::services::estimate_owned_items,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings", post(create_listings))
        .route("/listings/mine", get(my_listings))
        .route("/listings/nearby", get(nearby_listings))
        .route("/listings/:id", get(get_listing).delete(delete_listing))
}

#[instrument(skip(state, payload), fields(items = payload.item_ids.len()))]
pub async fn create_listings(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateListingsRequest>,
) -> Result<(StatusCode, Json<CreateListingsResponse>), (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    if payload.item_ids.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "select at least one item".into()));
    }

    let estimation =
        estimate_owned_items(&state, session.account_id, &payload.item_ids, payload.method)
            .await?;
    let drafts = priced_drafts(&estimation.estimate, &payload.prices).map_err(|r| {
        warn!(rejection = ?r, "listing drafts rejected");
        (StatusCode::BAD_REQUEST, r.message())
    })?;

    let sources = source_ids(&estimation.items);
    let description = payload.description.as_deref().unwrap_or_default().trim();
    let listings = repo::insert_drafts(&state.db, session.account_id, &drafts, &sources, description)
        .await
        .map_err(internal)?;

    info!(
        store_id = %session.account_id,
        count = listings.len(),
        "feed listings created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateListingsResponse {
            listings,
            review: estimation.review,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn my_listings(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<FeedListing>>, (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    let listings = repo::list_by_owner(&state.db, session.account_id)
        .await
        .map_err(internal)?;
    Ok(Json(listings))
}

#[instrument(skip(state))]
pub async fn nearby_listings(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyListing>>, (StatusCode, String)> {
    session.require(AccountKind::Farm)?;
    let max_distance = query
        .max_distance()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let farm = Account::find_by_id(&state.db, session.account_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Account not found".to_string()))?;
    let origin = farm.location.ok_or((
        StatusCode::UNPROCESSABLE_ENTITY,
        "set a farm address before searching nearby listings".to_string(),
    ))?;

    let candidates = repo::list_with_store(&state.db, query.animal_type)
        .await
        .map_err(internal)?;
    let total = candidates.len();
    let nearby = search_nearby(origin, candidates, max_distance, query.sort);
    info!(farm_id = %farm.id, total, within = nearby.len(), max_distance, "nearby search");
    Ok(Json(nearby))
}

#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedListing>, (StatusCode, String)> {
    repo::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Listing not found".into()))
}

#[instrument(skip(state))]
pub async fn delete_listing(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    session.require(AccountKind::Store)?;
    match repo::delete(&state.db, session.account_id, id).await {
        Ok(true) => {
            info!(listing_id = %id, "listing removed");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err((StatusCode::NOT_FOUND, "Listing not found".into())),
        Err(e) => Err(internal(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::services::NearbySort;

    fn session(kind: AccountKind) -> Session {
        Session {
            account_id: Uuid::new_v4(),
            kind,
        }
    }

    #[tokio::test]
    async fn nearby_is_for_farms_only() {
        let query = NearbyQuery {
            max_distance: None,
            animal_type: None,
            sort: NearbySort::Distance,
        };
        let err = nearby_listings(State(AppState::fake()), session(AccountKind::Store), Query(query))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn bad_distance_is_rejected_before_lookup() {
        let query = NearbyQuery {
            max_distance: Some(-3.0),
            animal_type: None,
            sort: NearbySort::PriceLow,
        };
        let err = nearby_listings(State(AppState::fake()), session(AccountKind::Farm), Query(query))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_needs_a_selection() {
        let req: CreateListingsRequest =
            serde_json::from_str(r#"{"item_ids":[],"prices":{"chicken":2.0}}"#).unwrap();
        let err = create_listings(State(AppState::fake()), session(AccountKind::Store), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn farms_cannot_create_listings() {
        let req: CreateListingsRequest =
            serde_json::from_str(r#"{"item_ids":["6f1c2a52-8f43-4b0e-9d7a-3c1d2e4f5a6b"]}"#)
                .unwrap();
        let err = create_listings(State(AppState::fake()), session(AccountKind::Farm), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{self, NewHolding};
use super::repo_types::LivestockHolding;
use super::sufficiency::{weekly_sufficiency, FeedSufficiency};
use crate::{
    app::internal,
    auth::{AccountKind, Session},
    feed::AnimalType,
    orders,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AddLivestockRequest {
    pub animal_type: AnimalType,
    pub count: u32,
    pub weekly_feed_requirement: Option<f64>,
}

impl AddLivestockRequest {
    /// Falls back to the per-head default for the animal type.
    pub fn into_new_holding(self) -> Result<NewHolding, String> {
        if i32::try_from(self.count).is_err() {
            return Err(format!("count must be at most {}", i32::MAX));
        }
        let weekly = self
            .weekly_feed_requirement
            .unwrap_or_else(|| self.animal_type.default_weekly_feed());
        if !weekly.is_finite() || weekly < 0.0 {
            return Err("weekly_feed_requirement must be a non-negative number".into());
        }
        Ok(NewHolding {
            animal_type: self.animal_type,
            count: self.count,
            weekly_feed_requirement: weekly,
        })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/livestock", get(list_livestock).post(add_livestock))
        .route("/livestock/sufficiency", get(sufficiency))
        .route("/livestock/:id", delete(remove_livestock))
}

#[instrument(skip(state))]
pub async fn list_livestock(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<LivestockHolding>>, (StatusCode, String)> {
    session.require(AccountKind::Farm)?;
    let holdings = repo::list_by_farm(&state.db, session.account_id)
        .await
        .map_err(internal)?;
    Ok(Json(holdings))
}

#[instrument(skip(state))]
pub async fn add_livestock(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AddLivestockRequest>,
) -> Result<(StatusCode, Json<LivestockHolding>), (StatusCode, String)> {
    session.require(AccountKind::Farm)?;
    let new = payload
        .into_new_holding()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let holding = repo::insert(&state.db, session.account_id, new)
        .await
        .map_err(internal)?;
    info!(holding_id = %holding.id, animal = %holding.animal_type, count = holding.count, "livestock added");
    Ok((StatusCode::CREATED, Json(holding)))
}

#[instrument(skip(state))]
pub async fn remove_livestock(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    session.require(AccountKind::Farm)?;
    match repo::delete(&state.db, session.account_id, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((StatusCode::NOT_FOUND, "Livestock not found".into())),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn sufficiency(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<FeedSufficiency>>, (StatusCode, String)> {
    session.require(AccountKind::Farm)?;
    let holdings = repo::list_by_farm(&state.db, session.account_id)
        .await
        .map_err(internal)?;
    let received = orders::repo::completed_weight_by_animal(&state.db, session.account_id)
        .await
        .map_err(internal)?;
    Ok(Json(weekly_sufficiency(&holdings, &received)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_requirement_uses_default() {
        let req: AddLivestockRequest =
            serde_json::from_str(r#"{"animal_type":"cattle","count":3}"#).unwrap();
        let new = req.into_new_holding().unwrap();
        assert_eq!(new.weekly_feed_requirement, 50.0);
        assert_eq!(new.count, 3);
    }

    #[test]
    fn explicit_requirement_wins() {
        let req: AddLivestockRequest = serde_json::from_str(
            r#"{"animal_type":"chicken","count":40,"weekly_feed_requirement":0.75}"#,
        )
        .unwrap();
        assert_eq!(req.into_new_holding().unwrap().weekly_feed_requirement, 0.75);
    }

    #[test]
    fn negative_requirement_is_rejected() {
        let req = AddLivestockRequest {
            animal_type: AnimalType::Goat,
            count: 2,
            weekly_feed_requirement: Some(-1.0),
        };
        assert!(req.into_new_holding().is_err());
    }

    #[tokio::test]
    async fn oversized_herd_is_a_bad_request() {
        let session = Session {
            account_id: Uuid::new_v4(),
            kind: AccountKind::Farm,
        };
        let req = AddLivestockRequest {
            animal_type: AnimalType::Cattle,
            count: u32::MAX,
            weekly_feed_requirement: None,
        };
        let err = add_livestock(State(AppState::fake()), session, Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let largest = AddLivestockRequest {
            animal_type: AnimalType::Cattle,
            count: i32::MAX as u32,
            weekly_feed_requirement: None,
        };
        assert!(largest.into_new_holding().is_ok());
    }

    #[tokio::test]
    async fn stores_have_no_livestock() {
        let session = Session {
            account_id: Uuid::new_v4(),
            kind: AccountKind::Store,
        };
        let err = sufficiency(State(AppState::fake()), session)
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }
}

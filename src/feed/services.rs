use std::collections::HashSet;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::conversion::estimate_deterministic;
use super::language_model::{
    estimate_via_language_model, review_estimate, EstimateError, EstimateReview,
};
use super::types::FeedEstimate;
use crate::{app::internal, inventory, inventory::SupplyItem, state::AppState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimateMethod {
    #[default]
    Table,
    LanguageModel,
}

#[derive(Debug, Serialize)]
pub struct Estimation {
    pub method: EstimateMethod,
    pub estimate: FeedEstimate,
    pub review: EstimateReview,
    #[serde(skip)]
    pub items: Vec<SupplyItem>,
}

impl From<EstimateError> for (StatusCode, String) {
    fn from(e: EstimateError) -> Self {
        (StatusCode::BAD_GATEWAY, format!("{e}; please try again"))
    }
}

/// The table credits each pound to several animal types, so only language-model totals
/// are held to the input weight.
fn review_for(
    method: EstimateMethod,
    estimate: &FeedEstimate,
    items: &[SupplyItem],
    selected: &HashSet<Uuid>,
) -> EstimateReview {
    let mut review = review_estimate(estimate, items, selected);
    if method == EstimateMethod::Table {
        review.exceeds_input = false;
    }
    review
}

/// Loads the caller's selected items and estimates feed from them.
/// Every selected id must name an item the owner holds.
pub async fn estimate_owned_items(
    state: &AppState,
    owner_id: Uuid,
    item_ids: &[Uuid],
    method: EstimateMethod,
) -> Result<Estimation, (StatusCode, String)> {
    let selected: HashSet<Uuid> = item_ids.iter().copied().collect();
    let items = if selected.is_empty() {
        Vec::new()
    } else {
        let ids: Vec<Uuid> = selected.iter().copied().collect();
        inventory::repo::find_owned(&state.db, owner_id, &ids)
            .await
            .map_err(internal)?
    };
    if items.len() != selected.len() {
        warn!(%owner_id, requested = selected.len(), found = items.len(), "foreign or unknown items selected");
        return Err((
            StatusCode::BAD_REQUEST,
            "selected items must be existing items from your inventory".into(),
        ));
    }

    let estimate = match method {
        EstimateMethod::Table => estimate_deterministic(&state.conversion, &items, &selected),
        EstimateMethod::LanguageModel => {
            estimate_via_language_model(state.completion.as_ref(), &items, &selected)
                .await
                .map_err(|e| {
                    error!(error = %e, %owner_id, "language-model estimate failed");
                    e
                })?
        }
    };
    let review = review_for(method, &estimate, &items, &selected);
    if review.exceeds_input || review.has_negative {
        warn!(%owner_id, ?review, "estimate flagged for manual review");
    }
    info!(%owner_id, ?method, total = estimate.total(), "feed estimated");

    Ok(Estimation {
        method,
        estimate,
        review,
        items,
    })
}

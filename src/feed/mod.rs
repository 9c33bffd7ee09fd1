pub mod completion;
pub mod conversion;
pub mod drafts;
pub mod handlers;
pub mod language_model;
pub mod services;
pub mod types;

use crate::state::AppState;
use axum::Router;

pub use completion::{CompletionClient, GeminiClient};
pub use conversion::ConversionTable;
pub use drafts::{build_listing_drafts, FeedListingDraft};
pub use types::{AnimalType, FeedEstimate};

pub fn router() -> Router<AppState> {
    handlers::routes()
}

pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod sufficiency;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

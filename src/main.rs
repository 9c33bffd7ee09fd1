mod app;
mod auth;
mod config;
mod db;
mod feed;
mod geo;
mod inventory;
mod listings;
mod livestock;
mod orders;
mod state;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "farmconnect=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    if std::env::args().nth(1).as_deref() == Some("update-coordinates") {
        let summary =
            auth::services::refresh_all_coordinates(&app_state.db, app_state.geocoder.as_ref())
                .await?;
        tracing::info!(?summary, "coordinate update finished");
        return Ok(());
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}

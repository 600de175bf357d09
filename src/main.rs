mod app;
mod auth;
mod categories;
mod config;
mod contents;
mod db;
mod error;
mod images;
#[cfg(test)]
mod memory;
mod state;
mod storage;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "newsdesk=debug,axum=info,tower_http=info".to_string());
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

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config).await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let seed = config.seed_admin.clone();
    let state = AppState::init(config, pool).await?;

    if let Some(seed) = seed {
        match auth::services::seed_admin(&state, &seed).await {
            Ok(user) => tracing::info!(user_id = user.id, "admin account ready"),
            Err(e) => tracing::error!(error = %e, "admin seeding failed"),
        }
    }

    app::serve(app::build_app(state)).await
}

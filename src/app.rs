/*
 * Responsibility
 * - Config 読み込み → 鍵ペア読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (HTTP / CORS / DPoP)
 * - axum::serve() で起動
 */
use std::{panic, process};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::services::auth::{build_pop_gateway, build_replay_store};
use crate::{api, config::Config, middleware, state::AppState};

fn init_tracing() {
    // RUST_LOG wins, e.g. RUST_LOG=info,fare_api=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so the panic is noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Key material and the replay store are process-level; failing to load
/// either stops startup.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let pop = build_pop_gateway(config).map_err(|e| {
        tracing::error!(code = e.code(), error = %e, "DPoP key material unavailable");
        e
    })?;
    let replay = build_replay_store(config)
        .await
        .context("failed to initialise DPoP replay store")?;

    Ok(AppState::new(pop, replay, config.public_base_url.clone()))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::http::apply(router, config);
    middleware::cors::apply(router, config)
}

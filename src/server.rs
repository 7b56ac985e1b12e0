//!
//! HTTP server
//! -----------
//! Axum router for the campaign API and permission management.
//!
//! Responsibilities:
//! - Bearer-token login and per-request identity via `AuthUser` / `AdminUser`.
//! - Campaign CRUD with column-filtered responses.
//! - ADMIN-only management of the column permission table.
//! - First-run provisioning and startup configuration logs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::identity::TokenService;
use crate::storage::{seed, SharedStore};

mod auth;
mod campaigns;
mod extract;
mod permissions;

pub use extract::{ApiJson, ApiPath};

/// Shared server state injected into all handlers.
///
/// The token service is reachable on its own through `FromRef` so the identity
/// extractors do not depend on the rest of the state.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: SharedStore,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(store: SharedStore, tokens: TokenService) -> Self {
        Self { store, tokens: Arc::new(tokens) }
    }
}

/// Run store and hashing work on the blocking pool. Handlers never hold the
/// store mutex or run Argon2 on a runtime worker thread.
pub(crate) async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal("blocking_task".to_string(), format!("spawn_blocking join error: {}", e)))?
}

fn log_startup_config(cfg: &ServerConfig) {
    let cwd = std::env::current_dir().ok();
    info!(
        target: "startup",
        "campaign server starting: cwd={:?}, db_root={}, http_port={}, issuer={}, audience={}, token_expiry_hours={}, seed={}",
        cwd, cfg.db_root, cfg.http_port, cfg.jwt_issuer, cfg.jwt_audience, cfg.jwt_expiry_hours, cfg.seed
    );
    if cfg.uses_default_secret() {
        warn!(target: "startup", "JWT_SECRET is not set; tokens are signed with the built-in development secret");
    }
}

/// Any origin may call the API. Requested headers are mirrored so browsers can
/// send `Authorization`, which a `*` allow-list does not cover.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::PUT, Method::PATCH, Method::POST, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "ok"})) }))
        .route("/auth/login", post(auth::login))
        .route("/campaigns", get(campaigns::list).post(campaigns::create))
        .route("/campaigns/{id}", get(campaigns::get_one).put(campaigns::update).delete(campaigns::remove))
        .route("/permissions", get(permissions::list_all).put(permissions::set_one).delete(permissions::delete_one))
        .route("/permissions/bulk", post(permissions::set_bulk))
        .route("/permissions/{role}/{resource}", get(permissions::list_for).delete(permissions::delete_all_for))
        .layer(cors_layer())
        .with_state(state)
}

/// Open the store under the configured root, provision it when empty and
/// enabled, and build the shared state.
pub fn prepare_state(cfg: &ServerConfig) -> anyhow::Result<AppState> {
    std::fs::create_dir_all(&cfg.db_root)
        .with_context(|| format!("Failed to create or access database root: {}", cfg.db_root))?;
    let store = SharedStore::new(&cfg.db_root)
        .with_context(|| format!("While opening store with root: {}", cfg.db_root))?;
    if cfg.seed {
        seed::ensure_seeded(&store, &cfg.seed_password)
            .with_context(|| format!("While provisioning db_root: {}", cfg.db_root))?;
    }
    let tokens = TokenService::new(&cfg.jwt_secret, cfg.jwt_issuer.clone(), cfg.jwt_audience.clone(), cfg.jwt_expiry_hours);
    Ok(AppState::new(store, tokens))
}

/// Serve on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn run_with_config(cfg: ServerConfig) -> anyhow::Result<()> {
    log_startup_config(&cfg);
    let state = prepare_state(&cfg)?;

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = TcpListener::bind(addr).await
        .with_context(|| format!("While binding {}", addr))?;
    serve(listener, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocking_work_result_is_returned() {
        assert_eq!(run_blocking(|| Ok(7)).await.unwrap(), 7);
        let err = run_blocking::<(), _>(|| Err(AppError::not_found("x", "missing"))).await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn panicking_blocking_work_becomes_internal_error() {
        let err = run_blocking::<(), _>(|| panic!("disk gone")).await.unwrap_err();
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.code_str(), "blocking_task");
    }
}

use axum::extract::State;
use axum::Json;

use super::{run_blocking, ApiJson, AppState};
use crate::error::AppResult;
use crate::identity::{AuthProvider, LocalAuthProvider, LoginRequest, LoginResponse};

pub(super) async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> AppResult<Json<LoginResponse>> {
    run_blocking(move || LocalAuthProvider::new(&state.store, &state.tokens).login(&req))
        .await
        .map(Json)
}

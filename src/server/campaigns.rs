//! Campaign endpoints. Every response that carries campaign records is
//! projected through the caller's readable-column set, computed fresh per request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::{run_blocking, ApiJson, ApiPath, AppState};
use crate::error::AppResult;
use crate::identity::{AuthUser, Principal};
use crate::projection::{project, project_all};
use crate::security::{enforce, readable_columns, Action, ReadableColumns, CAMPAIGNS};
use crate::service::campaigns::{self as svc, CreateCampaignInput, UpdateCampaignInput};

fn columns_for(state: &AppState, caller: &Principal) -> AppResult<ReadableColumns> {
    Ok(readable_columns(&state.store, caller.role, CAMPAIGNS)?)
}

pub(super) async fn list(State(state): State<AppState>, AuthUser(caller): AuthUser) -> AppResult<Json<Vec<Value>>> {
    run_blocking(move || {
        enforce(Action::Read, &caller, None)?;
        let rows = svc::list(&state.store)?;
        let cols = columns_for(&state, &caller)?;
        Ok(project_all(&rows, &cols)?)
    })
    .await
    .map(Json)
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    run_blocking(move || {
        enforce(Action::Read, &caller, None)?;
        let row = svc::get(&state.store, id)?;
        let cols = columns_for(&state, &caller)?;
        Ok(project(&row, &cols)?)
    })
    .await
    .map(Json)
}

pub(super) async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<CreateCampaignInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let created = run_blocking(move || {
        let row = svc::create(&state.store, &caller, input)?;
        let cols = columns_for(&state, &caller)?;
        Ok(project(&row, &cols)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateCampaignInput>,
) -> AppResult<Json<Value>> {
    run_blocking(move || {
        let row = svc::update(&state.store, &caller, id, input)?;
        let cols = columns_for(&state, &caller)?;
        Ok(project(&row, &cols)?)
    })
    .await
    .map(Json)
}

pub(super) async fn remove(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    run_blocking(move || svc::delete(&state.store, &caller, id)).await?;
    Ok(Json(json!({"message": "Campaign deleted successfully"})))
}

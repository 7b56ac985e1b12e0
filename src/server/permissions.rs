//! Permission management endpoints. `AdminUser` rejects non-admins before any
//! body is parsed, so every operation here denies other roles the same way.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::{run_blocking, ApiJson, ApiPath, AppState};
use crate::error::AppResult;
use crate::identity::AdminUser;
use crate::service::permissions::{self as svc, BulkSetRequest, DeletePermissionRequest, SetPermissionRequest};
use crate::storage::ColumnPermission;

pub(super) async fn list_all(State(state): State<AppState>, _admin: AdminUser) -> AppResult<Json<Vec<ColumnPermission>>> {
    run_blocking(move || svc::list_all(&state.store)).await.map(Json)
}

pub(super) async fn list_for(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath((role, resource)): ApiPath<(String, String)>,
) -> AppResult<Json<Vec<ColumnPermission>>> {
    run_blocking(move || svc::list_for(&state.store, &role, &resource)).await.map(Json)
}

pub(super) async fn set_one(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<SetPermissionRequest>,
) -> AppResult<Json<Value>> {
    let permission = run_blocking(move || svc::set_one(&state.store, &req.role, &req.resource, &req.column, req.can_read)).await?;
    Ok(Json(json!({"message": "Permission updated successfully", "permission": permission})))
}

pub(super) async fn set_bulk(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<BulkSetRequest>,
) -> AppResult<Json<Value>> {
    let permissions = run_blocking(move || svc::set_bulk(&state.store, &req.role, &req.resource, &req.columns)).await?;
    Ok(Json(json!({
        "message": format!("{} permissions updated successfully", permissions.len()),
        "permissions": permissions,
    })))
}

pub(super) async fn delete_one(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<DeletePermissionRequest>,
) -> AppResult<Json<Value>> {
    run_blocking(move || svc::delete_one(&state.store, &req.role, &req.resource, &req.column)).await?;
    Ok(Json(json!({"message": "Permission deleted successfully"})))
}

pub(super) async fn delete_all_for(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath((role, resource)): ApiPath<(String, String)>,
) -> AppResult<Json<Value>> {
    let count = run_blocking(move || svc::delete_all_for(&state.store, &role, &resource)).await?;
    Ok(Json(json!({
        "message": format!("{} permission(s) deleted successfully", count),
        "count": count,
    })))
}

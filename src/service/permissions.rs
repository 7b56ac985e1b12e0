//! Validated management operations over the column permission table.
//! Callers must already have passed `security::require_admin`.

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::Role;
use crate::storage::{ColumnPermission, PermissionStore};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetPermissionRequest {
    #[serde(default)]
    pub role: String,
    #[serde(default, alias = "table_name")]
    pub resource: String,
    #[serde(default, alias = "column_name")]
    pub column: String,
    #[serde(rename = "canRead", alias = "can_read")]
    pub can_read: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkColumn {
    #[serde(default, rename = "columnName", alias = "column_name")]
    pub column_name: String,
    #[serde(rename = "canRead", alias = "can_read")]
    pub can_read: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkSetRequest {
    #[serde(default)]
    pub role: String,
    #[serde(default, alias = "table_name")]
    pub resource: String,
    pub columns: Vec<BulkColumn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeletePermissionRequest {
    #[serde(default)]
    pub role: String,
    #[serde(default, alias = "table_name")]
    pub resource: String,
    #[serde(default, alias = "column_name")]
    pub column: String,
}

fn require_names(resource: &str, column: &str) -> AppResult<()> {
    if resource.trim().is_empty() || column.trim().is_empty() {
        return Err(AppError::validation("missing_fields", "Resource name and column name are required"));
    }
    Ok(())
}

pub fn list_all<S: PermissionStore + ?Sized>(store: &S) -> AppResult<Vec<ColumnPermission>> {
    Ok(store.list_permissions()?)
}

pub fn list_for<S: PermissionStore + ?Sized>(store: &S, role: &str, resource: &str) -> AppResult<Vec<ColumnPermission>> {
    let role: Role = role.parse()?;
    Ok(store.permissions_for(role, resource)?)
}

fn upsert<S: PermissionStore + ?Sized>(store: &S, role: Role, resource: &str, column: &str, can_read: bool) -> AppResult<ColumnPermission> {
    require_names(resource, column)?;
    let entry = store.upsert_permission(role, resource, column, can_read)?;
    info!(target: "permissions", role = %role, resource, column, can_read, "permission set");
    Ok(entry)
}

pub fn set_one<S: PermissionStore + ?Sized>(store: &S, role: &str, resource: &str, column: &str, can_read: bool) -> AppResult<ColumnPermission> {
    let role: Role = role.parse()?;
    upsert(store, role, resource, column, can_read)
}

/// Role is validated once; each entry is then an independent upsert in the given
/// order. A failing entry stops the loop, and entries already written stay written.
pub fn set_bulk<S: PermissionStore + ?Sized>(store: &S, role: &str, resource: &str, entries: &[BulkColumn]) -> AppResult<Vec<ColumnPermission>> {
    let role: Role = role.parse()?;
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        out.push(upsert(store, role, resource, &entry.column_name, entry.can_read)?);
    }
    Ok(out)
}

pub fn delete_one<S: PermissionStore + ?Sized>(store: &S, role: &str, resource: &str, column: &str) -> AppResult<()> {
    let role: Role = role.parse()?;
    if !store.delete_permission(role, resource, column)? {
        return Err(AppError::not_found("permission_not_found", "Permission not found"));
    }
    info!(target: "permissions", role = %role, resource, column, "permission deleted");
    Ok(())
}

pub fn delete_all_for<S: PermissionStore + ?Sized>(store: &S, role: &str, resource: &str) -> AppResult<usize> {
    let role: Role = role.parse()?;
    let count = store.delete_permissions_for(role, resource)?;
    info!(target: "permissions", role = %role, resource, count, "permissions deleted");
    Ok(count)
}

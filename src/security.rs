//! Authorization engine.
//!
//! Two independent decisions live here:
//! - column visibility: which fields of a resource a role may read, computed fresh
//!   from the permission table on every call (no cache, so a permission write is
//!   visible to the very next request);
//! - action authorization: whether a subject may create/read/update/delete a
//!   given record, from its role and the record's owner.
//!
//! Visibility is default-deny. The readable set is built only from explicit
//! `can_read = true` entries; a missing entry and a `false` entry look the same.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::{Principal, Role};
use crate::storage::PermissionStore;

/// Logical table name the campaign permissions are stored under.
pub const CAMPAIGNS: &str = "campaigns";

/// Set of column names a caller may see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadableColumns(BTreeSet<String>);

impl ReadableColumns {
    pub fn contains(&self, column: &str) -> bool { self.0.contains(column) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|s| s.as_str()) }
}

impl<S: Into<String>> FromIterator<S> for ReadableColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Columns of `resource` that `role` may read right now.
pub fn readable_columns<S: PermissionStore + ?Sized>(store: &S, role: Role, resource: &str) -> Result<ReadableColumns> {
    let entries = store.permissions_for(role, resource)?;
    Ok(entries
        .into_iter()
        .filter(|p| p.role == role && p.resource == resource && p.can_read)
        .map(|p| p.column)
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action { Create, Read, Update, Delete }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision { Allow, Deny }

/// Decision table for record-level actions.
///
/// | action | ADMIN | USER, owner | USER, not owner |
/// |--------|-------|-------------|-----------------|
/// | create | allow | allow       | allow           |
/// | read   | allow | allow       | allow           |
/// | update | allow | allow       | deny            |
/// | delete | allow | deny        | deny            |
///
/// `owner` is `None` for create, where no record exists yet.
pub fn authorize_mutation(action: Action, role: Role, subject_id: i64, owner: Option<i64>) -> Decision {
    if role.is_admin() { return Decision::Allow; }
    match action {
        Action::Create | Action::Read => Decision::Allow,
        Action::Update if owner == Some(subject_id) => Decision::Allow,
        Action::Update | Action::Delete => Decision::Deny,
    }
}

/// `authorize_mutation` for the calling principal, as a typed error on deny.
pub fn enforce(action: Action, principal: &Principal, owner: Option<i64>) -> AppResult<()> {
    match authorize_mutation(action, principal.role, principal.user_id, owner) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            info!(target: "authz", user_id = principal.user_id, role = %principal.role, action = ?action, "denied");
            let msg = match action {
                Action::Update => "You can only update your own campaigns",
                Action::Delete => "Only admins can delete campaigns",
                Action::Create | Action::Read => "Access forbidden",
            };
            Err(AppError::forbidden("forbidden", msg))
        }
    }
}

/// Gate for every permission-table management operation. Uniform for all of them.
pub fn require_admin(principal: &Principal) -> AppResult<()> {
    if principal.role.is_admin() { return Ok(()); }
    info!(target: "authz", user_id = principal.user_id, role = %principal.role, "denied permission management");
    Err(AppError::forbidden("forbidden", "Only admins can manage permissions"))
}

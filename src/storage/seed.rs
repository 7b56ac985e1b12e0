//! First-run provisioning of an empty deployment: two accounts and the baseline
//! permission table for campaigns. Runs only when the users table is empty, so a
//! restart never re-creates rows an administrator has since removed.

use anyhow::{Context, Result};
use tracing::info;

use super::{PermissionStore, SharedStore, CAMPAIGN_COLUMNS};
use crate::identity::Role;
use crate::security::CAMPAIGNS;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@test.com";
pub const DEFAULT_USER_EMAIL: &str = "user@test.com";

/// Columns USER may read out of the box. `budget` is deliberately absent: no entry means no access.
const USER_BASELINE_HIDDEN: &[&str] = &["budget"];

/// Returns true when provisioning happened.
pub fn ensure_seeded(store: &SharedStore, password: &str) -> Result<bool> {
    if store.has_users() { return Ok(false); }

    store.add_user(DEFAULT_ADMIN_EMAIL, password, Role::Admin)
        .context("While provisioning default admin")?;
    store.add_user(DEFAULT_USER_EMAIL, password, Role::User)
        .context("While provisioning default user")?;

    if store.list_permissions()?.is_empty() {
        for column in CAMPAIGN_COLUMNS {
            store.upsert_permission(Role::Admin, CAMPAIGNS, column, true)?;
            if !USER_BASELINE_HIDDEN.contains(&column) {
                store.upsert_permission(Role::User, CAMPAIGNS, column, true)?;
            }
        }
    }
    info!(target: "startup", admin = DEFAULT_ADMIN_EMAIL, user = DEFAULT_USER_EMAIL, "provisioned default accounts and campaign permissions");
    Ok(true)
}

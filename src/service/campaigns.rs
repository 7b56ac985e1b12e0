//! Campaign business rules. Existence is checked before ownership, so a missing
//! record is always 404 and a present-but-foreign record is always 403.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::identity::Principal;
use crate::security::{enforce, Action};
use crate::storage::{Campaign, CampaignPatch, CampaignStore, NewCampaign};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCampaignInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaignInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Accepted so it can be observed and ignored; the owner is write-once.
    #[serde(default)]
    pub created_by: Option<serde_json::Value>,
}

fn not_found() -> AppError { AppError::not_found("campaign_not_found", "Campaign not found") }

fn require_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("name_required", "Name is required"));
    }
    Ok(trimmed.to_string())
}

pub fn list<S: CampaignStore + ?Sized>(store: &S) -> AppResult<Vec<Campaign>> {
    Ok(store.list_campaigns()?)
}

pub fn get<S: CampaignStore + ?Sized>(store: &S, id: i64) -> AppResult<Campaign> {
    store.find_campaign(id)?.ok_or_else(not_found)
}

pub fn create<S: CampaignStore + ?Sized>(store: &S, caller: &Principal, input: CreateCampaignInput) -> AppResult<Campaign> {
    enforce(Action::Create, caller, None)?;
    let name = require_name(input.name.as_deref().unwrap_or(""))?;
    let campaign = store.insert_campaign(NewCampaign {
        name,
        budget: input.budget,
        start_date: input.start_date,
        end_date: input.end_date,
        created_by: caller.user_id,
    })?;
    info!(target: "campaigns", campaign_id = campaign.id, user_id = caller.user_id, "created");
    Ok(campaign)
}

pub fn update<S: CampaignStore + ?Sized>(store: &S, caller: &Principal, id: i64, input: UpdateCampaignInput) -> AppResult<Campaign> {
    let existing = store.find_campaign(id)?.ok_or_else(not_found)?;
    enforce(Action::Update, caller, Some(existing.created_by))?;

    if input.created_by.is_some() {
        debug!(target: "campaigns", campaign_id = id, user_id = caller.user_id, "ignoring created_by in update payload");
    }
    let name = match input.name.as_deref() {
        Some(n) => Some(require_name(n)?),
        None => None,
    };
    let patch = CampaignPatch { name, budget: input.budget, start_date: input.start_date, end_date: input.end_date };
    // The row can vanish between the read above and this write
    let updated = store.update_campaign(id, &patch)?.ok_or_else(not_found)?;
    info!(target: "campaigns", campaign_id = id, user_id = caller.user_id, "updated");
    Ok(updated)
}

pub fn delete<S: CampaignStore + ?Sized>(store: &S, caller: &Principal, id: i64) -> AppResult<()> {
    let existing = store.find_campaign(id)?.ok_or_else(not_found)?;
    enforce(Action::Delete, caller, Some(existing.created_by))?;
    if !store.delete_campaign(id)? {
        return Err(not_found());
    }
    info!(target: "campaigns", campaign_id = id, user_id = caller.user_id, "deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use crate::storage::SharedStore;

    fn principal(id: i64, role: Role) -> Principal {
        Principal { user_id: id, email: format!("{}@test.com", id), role }
    }

    fn setup() -> (tempfile::TempDir, SharedStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = SharedStore::new(tmp.path()).unwrap();
        (tmp, store)
    }

    fn named(name: &str) -> CreateCampaignInput {
        CreateCampaignInput { name: Some(name.into()), ..Default::default() }
    }

    #[test]
    fn owner_is_the_creator() {
        let (_tmp, store) = setup();
        let c = create(&store, &principal(4, Role::User), named("Mine")).unwrap();
        assert_eq!(c.created_by, 4);
    }

    #[test]
    fn name_is_required() {
        let (_tmp, store) = setup();
        let u = principal(4, Role::User);
        assert_eq!(create(&store, &u, CreateCampaignInput::default()).unwrap_err().http_status(), 400);
        assert_eq!(create(&store, &u, named("   ")).unwrap_err().http_status(), 400);

        let c = create(&store, &u, named("ok")).unwrap();
        let blank = UpdateCampaignInput { name: Some("".into()), ..Default::default() };
        assert_eq!(update(&store, &u, c.id, blank).unwrap_err().http_status(), 400);
    }

    #[test]
    fn ownership_rules_for_update() {
        let (_tmp, store) = setup();
        let owner = principal(4, Role::User);
        let stranger = principal(5, Role::User);
        let admin = principal(1, Role::Admin);
        let c = create(&store, &owner, named("Mine")).unwrap();

        let rename = |n: &str| UpdateCampaignInput { name: Some(n.into()), ..Default::default() };
        assert_eq!(update(&store, &owner, c.id, rename("Mine v2")).unwrap().name, "Mine v2");
        assert_eq!(update(&store, &stranger, c.id, rename("Hijack")).unwrap_err().http_status(), 403);
        assert_eq!(update(&store, &admin, c.id, rename("Admin edit")).unwrap().name, "Admin edit");
        assert_eq!(get(&store, c.id).unwrap().name, "Admin edit");
    }

    #[test]
    fn created_by_in_payload_is_ignored() {
        let (_tmp, store) = setup();
        let owner = principal(4, Role::User);
        let c = create(&store, &owner, named("Mine")).unwrap();
        let sneaky = UpdateCampaignInput { created_by: Some(serde_json::json!(99)), budget: Some(1.0), ..Default::default() };
        let updated = update(&store, &owner, c.id, sneaky).unwrap();
        assert_eq!(updated.created_by, 4);
        assert_eq!(updated.budget, Some(1.0));
    }

    #[test]
    fn delete_is_admin_only_and_missing_is_404() {
        let (_tmp, store) = setup();
        let owner = principal(4, Role::User);
        let admin = principal(1, Role::Admin);
        let c = create(&store, &owner, named("Mine")).unwrap();

        assert_eq!(delete(&store, &owner, c.id).unwrap_err().http_status(), 403);
        assert!(get(&store, c.id).is_ok());
        delete(&store, &admin, c.id).unwrap();
        assert_eq!(get(&store, c.id).unwrap_err().http_status(), 404);

        assert_eq!(delete(&store, &admin, c.id).unwrap_err().http_status(), 404);
        assert_eq!(delete(&store, &owner, c.id).unwrap_err().http_status(), 404);
        assert_eq!(update(&store, &owner, 999, UpdateCampaignInput::default()).unwrap_err().http_status(), 404);
    }
}

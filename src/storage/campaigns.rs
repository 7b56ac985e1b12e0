use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Row, SharedStore};

/// Every serialized field of a campaign, in declaration order.
pub const CAMPAIGN_COLUMNS: [&str; 8] = [
    "id", "name", "budget", "start_date", "end_date", "created_by", "created_at", "updated_at",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Row for Campaign {
    type Key = i64;
    fn key(&self) -> i64 { self.id }
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: i64,
}

/// Mutable campaign fields. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CampaignPatch {
    pub name: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Campaign {
    /// Apply a patch. Identity, owner and creation time are never touched here.
    pub fn apply(&mut self, patch: &CampaignPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name { self.name = name.clone(); }
        if let Some(budget) = patch.budget { self.budget = Some(budget); }
        if let Some(d) = patch.start_date { self.start_date = Some(d); }
        if let Some(d) = patch.end_date { self.end_date = Some(d); }
        self.updated_at = now;
    }
}

pub trait CampaignStore {
    /// All campaigns, newest first.
    fn list_campaigns(&self) -> Result<Vec<Campaign>>;
    fn find_campaign(&self, id: i64) -> Result<Option<Campaign>>;
    fn insert_campaign(&self, new: NewCampaign) -> Result<Campaign>;
    /// Returns `None` when no campaign has this id.
    fn update_campaign(&self, id: i64, patch: &CampaignPatch) -> Result<Option<Campaign>>;
    /// Returns whether a campaign was removed.
    fn delete_campaign(&self, id: i64) -> Result<bool>;
}

impl CampaignStore for SharedStore {
    fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let guard = self.0.lock();
        let mut out: Vec<Campaign> = guard.campaigns.rows().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    fn find_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        Ok(self.0.lock().campaigns.get(&id).cloned())
    }

    fn insert_campaign(&self, new: NewCampaign) -> Result<Campaign> {
        let mut guard = self.0.lock();
        guard.mutate_campaigns(|table| {
            let now = Utc::now();
            let campaign = Campaign {
                id: table.allocate_id(),
                name: new.name,
                budget: new.budget,
                start_date: new.start_date,
                end_date: new.end_date,
                created_by: new.created_by,
                created_at: now,
                updated_at: now,
            };
            table.insert(campaign.clone());
            campaign
        })
    }

    fn update_campaign(&self, id: i64, patch: &CampaignPatch) -> Result<Option<Campaign>> {
        let mut guard = self.0.lock();
        if guard.campaigns.get(&id).is_none() { return Ok(None); }
        guard.mutate_campaigns(|table| {
            table.get_mut(&id).map(|c| {
                c.apply(patch, Utc::now());
                c.clone()
            })
        })
    }

    fn delete_campaign(&self, id: i64) -> Result<bool> {
        let mut guard = self.0.lock();
        if guard.campaigns.get(&id).is_none() { return Ok(false); }
        guard.mutate_campaigns(|table| table.remove(&id).is_some())
    }
}

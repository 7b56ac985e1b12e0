//!
//! campaign_rbac storage module
//! ----------------------------
//! Durable record store for users, campaigns and column permissions. Each table
//! lives in memory as an ordered map and is snapshotted to `<root>/<table>.json`
//! after every mutation (write to a temp file, then rename over the old snapshot).
//!
//! The public API centers around the `Store` type, which is wrapped in a
//! thread-safe `SharedStore` (`Arc<Mutex<Store>>`). Every store operation takes the
//! lock exactly once, which makes each operation atomic with respect to the others;
//! concurrent upserts on the same key resolve as last-write-wins.
//!
//! Callers never touch `Store` directly: they go through the `CredentialStore`,
//! `CampaignStore` and `PermissionStore` contracts implemented on `SharedStore`.

use std::collections::BTreeMap;
use std::{fs, path::{Path, PathBuf}};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod campaigns;
pub mod permissions;
pub mod seed;
pub mod users;

pub use campaigns::{Campaign, CampaignPatch, CampaignStore, NewCampaign, CAMPAIGN_COLUMNS};
pub use permissions::{ColumnPermission, PermissionKey, PermissionStore};
pub use users::{CredentialStore, User};

const USERS_FILE: &str = "users.json";
const CAMPAIGNS_FILE: &str = "campaigns.json";
const PERMISSIONS_FILE: &str = "column_permissions.json";

/// A persisted row with a stable ordering key.
pub trait Row: Clone + Serialize + DeserializeOwned {
    type Key: Ord + Clone;
    fn key(&self) -> Self::Key;
}

/// One table: rows keyed for lookup plus the next id to hand out.
#[derive(Clone)]
pub struct Table<T: Row> {
    next_id: i64,
    rows: BTreeMap<T::Key, T>,
}

impl<T: Row> Default for Table<T> {
    fn default() -> Self { Self { next_id: 1, rows: BTreeMap::new() } }
}

impl<T: Row> Table<T> {
    pub fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
    pub fn rows(&self) -> impl Iterator<Item = &T> { self.rows.values() }
    pub fn get(&self, key: &T::Key) -> Option<&T> { self.rows.get(key) }
    pub fn get_mut(&mut self, key: &T::Key) -> Option<&mut T> { self.rows.get_mut(key) }
    pub fn insert(&mut self, row: T) { self.rows.insert(row.key(), row); }
    pub fn remove(&mut self, key: &T::Key) -> Option<T> { self.rows.remove(key) }
    pub fn retain(&mut self, f: impl FnMut(&T::Key, &mut T) -> bool) { self.rows.retain(f) }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

#[derive(Serialize)]
struct TableSnapshotRef<'a, T> {
    next_id: i64,
    rows: Vec<&'a T>,
}

#[derive(Deserialize)]
struct TableSnapshot<T> {
    next_id: i64,
    rows: Vec<T>,
}

fn load_table<T: Row>(path: &Path) -> Result<Table<T>> {
    if !path.exists() { return Ok(Table::default()); }
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let snap: TableSnapshot<T> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing {}", path.display()))?;
    let mut table = Table { next_id: snap.next_id.max(1), rows: BTreeMap::new() };
    for row in snap.rows { table.insert(row); }
    Ok(table)
}

fn save_table<T: Row>(path: &Path, table: &Table<T>) -> Result<()> {
    let snap = TableSnapshotRef { next_id: table.next_id, rows: table.rows().collect() };
    let bytes = serde_json::to_vec_pretty(&snap)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    debug!(target: "storage", path = %path.display(), rows = table.len(), "table snapshot written");
    Ok(())
}

/// Core on-disk storage handle rooted at a db folder.
pub struct Store {
    root: PathBuf,
    users: Table<User>,
    campaigns: Table<Campaign>,
    permissions: Table<ColumnPermission>,
}

impl Store {
    /// Open (or create) a store rooted at the given folder and load every table snapshot.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create or access db root: {}", root.display()))?;
        let users = load_table(&root.join(USERS_FILE))?;
        let campaigns = load_table(&root.join(CAMPAIGNS_FILE))?;
        let permissions = load_table(&root.join(PERMISSIONS_FILE))?;
        Ok(Self { root, users, campaigns, permissions })
    }

    /// Apply `f` to a staged copy of the users table; only a successful snapshot replaces the live table.
    fn mutate_users<R>(&mut self, f: impl FnOnce(&mut Table<User>) -> Result<R>) -> Result<R> {
        let mut staged = self.users.clone();
        let out = f(&mut staged)?;
        save_table(&self.root.join(USERS_FILE), &staged)?;
        self.users = staged;
        Ok(out)
    }

    fn mutate_campaigns<R>(&mut self, f: impl FnOnce(&mut Table<Campaign>) -> R) -> Result<R> {
        let mut staged = self.campaigns.clone();
        let out = f(&mut staged);
        save_table(&self.root.join(CAMPAIGNS_FILE), &staged)?;
        self.campaigns = staged;
        Ok(out)
    }

    fn mutate_permissions<R>(&mut self, f: impl FnOnce(&mut Table<ColumnPermission>) -> R) -> Result<R> {
        let mut staged = self.permissions.clone();
        let out = f(&mut staged);
        save_table(&self.root.join(PERMISSIONS_FILE), &staged)?;
        self.permissions = staged;
        Ok(out)
    }
}

#[derive(Clone)]
pub struct SharedStore(pub Arc<Mutex<Store>>);

impl SharedStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Store::new(root)?))))
    }
}

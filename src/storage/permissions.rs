use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{Row, SharedStore};
use crate::identity::Role;

/// Composite key: at most one entry per (role, resource, column).
pub type PermissionKey = (Role, String, String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPermission {
    pub id: i64,
    pub role: Role,
    pub resource: String,
    pub column: String,
    pub can_read: bool,
}

impl Row for ColumnPermission {
    type Key = PermissionKey;
    fn key(&self) -> PermissionKey { (self.role, self.resource.clone(), self.column.clone()) }
}

/// Durable (role, resource, column) -> readable table.
pub trait PermissionStore {
    /// Full dump ordered by role, resource, column.
    fn list_permissions(&self) -> Result<Vec<ColumnPermission>>;
    fn permissions_for(&self, role: Role, resource: &str) -> Result<Vec<ColumnPermission>>;
    /// Insert or replace `can_read` for the key. An existing entry keeps its id.
    fn upsert_permission(&self, role: Role, resource: &str, column: &str, can_read: bool) -> Result<ColumnPermission>;
    /// Returns whether an entry was removed.
    fn delete_permission(&self, role: Role, resource: &str, column: &str) -> Result<bool>;
    /// Returns the number of entries removed.
    fn delete_permissions_for(&self, role: Role, resource: &str) -> Result<usize>;
}

impl PermissionStore for SharedStore {
    fn list_permissions(&self) -> Result<Vec<ColumnPermission>> {
        // BTreeMap order over the composite key is already role, resource, column
        Ok(self.0.lock().permissions.rows().cloned().collect())
    }

    fn permissions_for(&self, role: Role, resource: &str) -> Result<Vec<ColumnPermission>> {
        let guard = self.0.lock();
        let entries = guard.permissions.rows().filter(|p| p.role == role && p.resource == resource).cloned().collect();
        Ok(entries)
    }

    fn upsert_permission(&self, role: Role, resource: &str, column: &str, can_read: bool) -> Result<ColumnPermission> {
        let mut guard = self.0.lock();
        guard.mutate_permissions(|table| {
            let key: PermissionKey = (role, resource.to_string(), column.to_string());
            if let Some(existing) = table.get_mut(&key) {
                existing.can_read = can_read;
                return existing.clone();
            }
            let entry = ColumnPermission {
                id: table.allocate_id(),
                role,
                resource: resource.to_string(),
                column: column.to_string(),
                can_read,
            };
            table.insert(entry.clone());
            entry
        })
    }

    fn delete_permission(&self, role: Role, resource: &str, column: &str) -> Result<bool> {
        let key: PermissionKey = (role, resource.to_string(), column.to_string());
        let mut guard = self.0.lock();
        if guard.permissions.get(&key).is_none() { return Ok(false); }
        guard.mutate_permissions(|table| table.remove(&key).is_some())
    }

    fn delete_permissions_for(&self, role: Role, resource: &str) -> Result<usize> {
        let mut guard = self.0.lock();
        let matching = guard.permissions.rows().filter(|p| p.role == role && p.resource == resource).count();
        if matching == 0 { return Ok(0); }
        guard.mutate_permissions(|table| {
            let before = table.len();
            table.retain(|(r, res, _), _| !(*r == role && res == resource));
            before - table.len()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SharedStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = SharedStore::new(tmp.path()).unwrap();
        (tmp, store)
    }

    #[test]
    fn upsert_replaces_instead_of_duplicating() {
        let (_tmp, store) = store();
        let first = store.upsert_permission(Role::User, "campaigns", "budget", true).unwrap();
        let again = store.upsert_permission(Role::User, "campaigns", "budget", true).unwrap();
        assert_eq!(first, again);
        let flipped = store.upsert_permission(Role::User, "campaigns", "budget", false).unwrap();
        assert_eq!(flipped.id, first.id);
        assert!(!flipped.can_read);
        assert_eq!(store.list_permissions().unwrap().len(), 1);
    }

    #[test]
    fn list_is_ordered_by_role_resource_column() {
        let (_tmp, store) = store();
        store.upsert_permission(Role::User, "campaigns", "name", true).unwrap();
        store.upsert_permission(Role::Admin, "reports", "total", true).unwrap();
        store.upsert_permission(Role::Admin, "campaigns", "name", true).unwrap();
        store.upsert_permission(Role::Admin, "campaigns", "budget", true).unwrap();
        let keys: Vec<(Role, String, String)> = store.list_permissions().unwrap().iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec![
            (Role::Admin, "campaigns".to_string(), "budget".to_string()),
            (Role::Admin, "campaigns".to_string(), "name".to_string()),
            (Role::Admin, "reports".to_string(), "total".to_string()),
            (Role::User, "campaigns".to_string(), "name".to_string()),
        ]);
    }

    #[test]
    fn deletes_report_what_happened() {
        let (_tmp, store) = store();
        store.upsert_permission(Role::User, "campaigns", "name", true).unwrap();
        store.upsert_permission(Role::User, "campaigns", "budget", false).unwrap();
        store.upsert_permission(Role::Admin, "campaigns", "name", true).unwrap();

        assert!(!store.delete_permission(Role::User, "campaigns", "missing").unwrap());
        assert!(store.delete_permission(Role::User, "campaigns", "budget").unwrap());
        assert_eq!(store.delete_permissions_for(Role::User, "campaigns").unwrap(), 1);
        assert_eq!(store.delete_permissions_for(Role::User, "campaigns").unwrap(), 0);
        assert_eq!(store.list_permissions().unwrap().len(), 1);
    }

    #[test]
    fn serializes_with_camel_case_can_read() {
        let p = ColumnPermission { id: 1, role: Role::User, resource: "campaigns".into(), column: "budget".into(), can_read: true };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["canRead"], serde_json::json!(true));
        assert_eq!(v["role"], serde_json::json!("USER"));
        assert!(v.get("can_read").is_none());
    }
}

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Row, SharedStore};
use crate::identity::{hash_password, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Row for User {
    type Key = i64;
    fn key(&self) -> i64 { self.id }
}

/// Account lookup consumed by login.
pub trait CredentialStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

impl CredentialStore for SharedStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let guard = self.0.lock();
        let found = guard.users.rows().find(|u| u.email == email).cloned();
        Ok(found)
    }
}

impl SharedStore {
    pub fn add_user(&self, email: &str, password: &str, role: Role) -> Result<User> {
        let password_hash = hash_password(password)?;
        let mut guard = self.0.lock();
        guard.mutate_users(|users| {
            if users.rows().any(|u| u.email == email) {
                bail!("user already exists: {}", email);
            }
            let user = User {
                id: users.allocate_id(),
                email: email.to_string(),
                password_hash,
                role,
                created_at: Utc::now(),
            };
            users.insert(user.clone());
            Ok(user)
        })
    }

    pub fn has_users(&self) -> bool {
        !self.0.lock().users.is_empty()
    }
}

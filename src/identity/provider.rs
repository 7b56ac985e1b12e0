use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::password::{verify_password, UNKNOWN_ACCOUNT_HASH};
use super::principal::{Principal, Role};
use super::token::TokenService;
use crate::error::{AppError, AppResult};
use crate::storage::CredentialStore;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse>;
}

/// Email/password login against the local credential table.
pub struct LocalAuthProvider<'a, C: CredentialStore + ?Sized> {
    pub credentials: &'a C,
    pub tokens: &'a TokenService,
}

impl<'a, C: CredentialStore + ?Sized> LocalAuthProvider<'a, C> {
    pub fn new(credentials: &'a C, tokens: &'a TokenService) -> Self { Self { credentials, tokens } }
}

fn invalid_credentials() -> AppError {
    // Same answer for unknown account and wrong password
    AppError::unauthorized("invalid_credentials", "Invalid credentials")
}

impl<'a, C: CredentialStore + Sync + ?Sized> AuthProvider for LocalAuthProvider<'a, C> {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::validation("missing_credentials", "Email and password required"));
        }
        let Some(user) = self.credentials.find_user_by_email(&req.email)? else {
            let _ = verify_password(UNKNOWN_ACCOUNT_HASH, &req.password);
            debug!(target: "auth", "login rejected: unknown account");
            return Err(invalid_credentials());
        };
        if !verify_password(&user.password_hash, &req.password) {
            debug!(target: "auth", user_id = user.id, "login rejected: bad password");
            return Err(invalid_credentials());
        }

        let principal = Principal { user_id: user.id, email: user.email.clone(), role: user.role };
        let token = self.tokens.issue(&principal)?;
        info!(target: "auth", user_id = user.id, role = %user.role, "login");
        Ok(LoginResponse {
            token,
            user: PublicUser { id: user.id, email: user.email, role: user.role },
        })
    }
}

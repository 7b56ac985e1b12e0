//! Identity: who the caller is.
//! Credential hashing, signed session tokens, login, and the request extractors
//! that carry the verified `Principal` into handlers.

mod principal;
mod password;
mod token;
mod provider;
mod extract;

pub use principal::{Principal, Role};
pub use password::{hash_password, verify_password};
pub use token::{TokenClaims, TokenError, TokenService, DEFAULT_AUDIENCE, DEFAULT_EXPIRY_HOURS, DEFAULT_ISSUER};
pub use provider::{AuthProvider, LocalAuthProvider, LoginRequest, LoginResponse, PublicUser};
pub use extract::{authenticate, AdminUser, AuthUser};

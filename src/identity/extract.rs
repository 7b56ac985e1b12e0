//! Request extractors that turn a bearer token into the caller's `Principal`.
//! Rejections happen before any handler body (and so before any store access) runs.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use super::principal::Principal;
use super::token::TokenService;
use crate::error::AppError;
use crate::security::require_admin;

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// Authenticated caller with role ADMIN. Non-admins get 403 before the body is read.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

pub fn authenticate(parts: &Parts, tokens: &TokenService) -> Result<Principal, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Err(AppError::unauthorized("missing_token", "No token provided"));
    };
    match tokens.verify(token) {
        Ok(claims) => Ok(claims.principal()),
        Err(e) => {
            debug!(target: "auth", reason = %e, "token rejected");
            Err(e.into())
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        authenticate(parts, &tokens).map(AuthUser)
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let principal = authenticate(parts, &tokens)?;
        require_admin(&principal)?;
        Ok(AdminUser(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::token::{DEFAULT_AUDIENCE, DEFAULT_ISSUER};
    use crate::identity::Role;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut b = Request::builder().uri("/campaigns");
        if let Some(v) = auth { b = b.header(AUTHORIZATION, v); }
        b.body(()).unwrap().into_parts().0
    }

    #[test]
    fn header_shapes() {
        let tokens = TokenService::new("s", DEFAULT_ISSUER, DEFAULT_AUDIENCE, 1);
        let p = Principal { user_id: 2, email: "u@test.com".into(), role: Role::User };
        let good = tokens.issue(&p).unwrap();

        assert_eq!(authenticate(&parts_with(Some(format!("Bearer {}", good).as_str())), &tokens).unwrap(), p);
        for bad in [None, Some("Bearer "), Some("Basic abc"), Some(good.as_str()), Some("Bearer garbage")] {
            let err = authenticate(&parts_with(bad), &tokens).unwrap_err();
            assert_eq!(err.http_status(), 401, "header {:?}", bad);
        }
    }
}

use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{
    claims::Identity,
    jwt::{JwtKeys, TokenError},
    role::RoleSet,
};
use crate::error::ApiError;

/// Verified bearer token. Rejects with 401.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        // Expect "Bearer <token>"
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthenticated("No token provided".into()))?;

        match keys.verify(token) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(err @ TokenError::Expired) => {
                warn!("expired token");
                Err(ApiError::Unauthenticated(err.to_string()))
            }
            Err(err @ TokenError::InvalidToken) => {
                warn!("invalid token");
                Err(ApiError::Unauthenticated(err.to_string()))
            }
        }
    }
}

/// [`AuthUser`] whose role is in `R`. Rejects with 401, then 403.
pub struct Authorized<R: RoleSet>(pub Identity, pub PhantomData<fn() -> R>);

#[async_trait]
impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
    R: RoleSet,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        if !R::allows(identity.role) {
            warn!(user_id = %identity.id, role = %identity.role, "insufficient role");
            return Err(ApiError::Forbidden("Forbidden: insufficient role".into()));
        }
        Ok(Authorized(identity, PhantomData))
    }
}

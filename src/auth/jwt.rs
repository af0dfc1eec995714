use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    Expired,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::minutes(config.ttl_minutes),
        }
    }

    /// Signs a token for an identity the caller has already authenticated.
    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, identity: &Identity, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let exp = issued_at + self.ttl;
        let claims = Claims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            name: identity.name.clone(),
            iat: issued_at.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %identity.id, role = %identity.role, "jwt signed");
        Ok(token)
    }

    /// Checks signature, issuer, audience and expiry. No store lookup: a demoted
    /// or deleted user's token stays valid until it expires.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ if self.is_past_expiry(token) => TokenError::Expired,
            _ => TokenError::InvalidToken,
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.into())
    }

    /// `exp` check alone, for tokens that already failed full verification.
    /// An expired token reports `Expired` even when its signature is bad.
    fn is_past_expiry(&self, token: &str) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.leeway = 0;
        validation.validate_aud = false;

        matches!(
            decode::<serde_json::Value>(token, &self.decoding, &validation),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature)
        )
    }
}

use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, error::AppError, state::AppState};

/// Only HS256 is accepted; tokens declaring any other `alg` are rejected.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT payload identifying the authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub email: String,
    pub iss: String, // issuer
    pub iat: usize,  // issued at (unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>, // absent when tokens are configured not to expire
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Option<Duration>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let ttl = (cfg.ttl_minutes > 0)
            .then(|| Duration::from_secs((cfg.ttl_minutes as u64).saturating_mul(60)));
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl,
        }
    }

    pub fn issue(&self, username: &str, email: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = match self.ttl {
            Some(ttl) => {
                let ttl = TimeDuration::try_from(ttl).context("token ttl out of range")?;
                let exp = now.checked_add(ttl).context("token expiry out of range")?;
                Some(exp.unix_timestamp() as usize)
            }
            None => None,
        };
        let claims = Claims {
            username: username.to_string(),
            email: email.to_string(),
            iss: self.issuer.clone(),
            iat: now.unix_timestamp() as usize,
            exp,
        };
        let token = self.sign(&claims)?;
        debug!(username = %username, expires = ?exp, "jwt signed");
        Ok(token)
    }

    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(&Header::new(ALGORITHM), claims, &self.encoding)?)
    }

    /// Checks signature, algorithm, issuer and (when present) expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["iss"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::InvalidToken
        })?;
        debug!(username = %data.claims.username, "jwt verified");
        Ok(data.claims)
    }
}

use std::fmt;

use anyhow::{ensure, Context};
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES` (one year).
pub const MAX_TTL_MINUTES: i64 = 525_600;

#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    /// Token lifetime. `0` issues tokens without an `exp` claim.
    pub ttl_minutes: i64,
}

// The secret must never reach the logs.
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let secret = var("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .context("JWT_SECRET must be set to a non-empty value")?;
        let ttl_minutes = var("JWT_TTL_MINUTES")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(60);
        ensure!(
            ttl_minutes <= MAX_TTL_MINUTES,
            "JWT_TTL_MINUTES must be at most {} (got {})",
            MAX_TTL_MINUTES,
            ttl_minutes
        );
        let jwt = JwtConfig {
            secret,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "useraccounts".into()),
            ttl_minutes,
        };
        Ok(Self { database_url, jwt })
    }
}

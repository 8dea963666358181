use std::collections::HashMap;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 hash; only loaded when a query selects it.
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
}

/// Equality filter over user fields. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

impl UserFilter {
    /// Build a filter from query-string pairs such as `?username=alice&active=true`.
    pub fn from_query(params: HashMap<String, String>) -> Result<Self, AppError> {
        let mut filter = UserFilter::default();
        for (key, value) in params {
            match key.as_str() {
                "_id" | "id" => filter.id = Some(parse_user_id(&value)?),
                "username" => filter.username = Some(value),
                "email" => filter.email = Some(value),
                "active" => {
                    let active = value.parse::<bool>().map_err(|_| {
                        AppError::Validation(format!(
                            "`active` must be true or false, got `{}`",
                            value
                        ))
                    })?;
                    filter.active = Some(active);
                }
                other => {
                    return Err(AppError::Validation(format!(
                        "unknown search field `{}`",
                        other
                    )))
                }
            }
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self == &UserFilter::default()
    }

    pub fn matches(&self, user: &User) -> bool {
        self.id.map_or(true, |id| id == user.id)
            && self.username.as_ref().map_or(true, |u| u == &user.username)
            && self.email.as_ref().map_or(true, |e| e == &user.email)
            && self.active.map_or(true, |a| a == user.active)
    }
}

pub fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidIdentifier(raw.to_string()))
}

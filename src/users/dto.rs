use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for `POST /create`. Fields are optional here so that missing
/// ones are reported together instead of failing on the first.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
}

/// A create request with every required field present.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub active: bool,
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<CreateUser, AppError> {
        let username = required(self.username);
        let email = required(self.email);
        let password = required(self.password);

        let missing: Vec<&str> = [
            ("username", username.is_none()),
            ("email", email.is_none()),
            ("password", password.is_none()),
            ("active", self.active.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (username, email, password, self.active) {
            (Some(username), Some(email), Some(password), Some(active)) => Ok(CreateUser {
                username,
                email,
                password,
                active,
            }),
            _ => Err(AppError::Validation(format!(
                "User validation failed: {}",
                missing
                    .iter()
                    .map(|f| format!("{}: `{}` is required", f, f))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Request body for `POST /login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn into_credentials(self) -> Result<(String, String), AppError> {
        match (required(self.username), self.password) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(AppError::Validation(
                "login requires `username` and `password`".into(),
            )),
        }
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Response returned by `DELETE /delete?...`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyResponse {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

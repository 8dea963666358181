use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use tracing::{info, warn};

use super::{
    dto::{CreateUserRequest, LoginRequest},
    repo::UserStore,
    repo_types::{parse_user_id, NewUser, User, UserFilter},
};
use crate::{
    auth::{
        jwt::{Claims, JwtKeys},
        password::{hash_password, verify_password},
    },
    error::AppError,
    state::AppState,
};

/// Account operations over the user store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.keys.clone())
    }
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    /// Validates, hashes the password and inserts. The returned record carries
    /// the stored hash.
    pub async fn create(&self, req: CreateUserRequest) -> Result<User, AppError> {
        let input = req.validate()?;
        let plain = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .context("password hashing task")??;

        let user = self
            .store
            .create(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                active: input.active,
            })
            .await?;
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Exchanges username/password for a signed token.
    pub async fn login(&self, req: LoginRequest) -> Result<String, AppError> {
        let (username, password) = req.into_credentials()?;

        let user = match self.store.find_by_username_with_password(&username).await? {
            Some(u) => u,
            None => {
                warn!(username = %username, "login unknown username");
                return Err(AppError::UserNotFound);
            }
        };
        let hash = user.password.clone().ok_or(AppError::CorruptCredential)?;

        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("password verification task")??;
        if !ok {
            warn!(username = %username, user_id = %user.id, "login incorrect password");
            return Err(AppError::IncorrectPassword);
        }

        let token = self.keys.issue(&user.username, &user.email)?;
        info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok(token)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.find().await?)
    }

    pub async fn find_by_id(&self, raw_id: &str) -> Result<Option<User>, AppError> {
        let id = parse_user_id(raw_id)?;
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn search(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        Ok(self.store.find_by_query(filter).await?)
    }

    /// `Ok(None)` when nothing matched; deleting twice is not an error.
    pub async fn delete_by_id(
        &self,
        actor: &Claims,
        raw_id: &str,
    ) -> Result<Option<User>, AppError> {
        let id = parse_user_id(raw_id)?;
        let deleted = self.store.delete_by_id(id).await?;
        info!(
            actor = %actor.username,
            user_id = %id,
            found = deleted.is_some(),
            "delete by id"
        );
        Ok(deleted)
    }

    pub async fn delete_by_query(
        &self,
        actor: &Claims,
        filter: &UserFilter,
    ) -> Result<u64, AppError> {
        if filter.is_empty() {
            warn!(actor = %actor.username, "delete by query without filter removes every user");
        }
        let count = self.store.delete_by_query(filter).await?;
        info!(actor = %actor.username, ?filter, count, "delete by query");
        Ok(count)
    }
}

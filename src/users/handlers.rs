use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::{
    dto::{CreateUserRequest, DeleteManyResponse, LoginRequest, TokenResponse},
    repo_types::{User, UserFilter},
    services::AccountService,
};
use crate::{
    app::unknown_route, auth::extractors::AuthUser, error::AppError, state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_user).get(unknown_route))
        .route("/all", get(list_users))
        .route("/id/:id", get(get_user))
        .route("/search", get(search_users))
        .route("/login", post(login).get(unknown_route))
}

/// Destructive routes; every handler here takes `AuthUser`.
pub fn delete_routes() -> Router<AppState> {
    Router::new()
        .route("/delete/:id", delete(delete_user).get(unknown_route))
        .route("/delete", delete(delete_users).get(unknown_route))
}

#[instrument(skip(accounts, payload))]
pub async fn create_user(
    State(accounts): State<AccountService>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(req) = payload?;
    let user = accounts.create(req).await?;
    Ok(Json(user))
}

#[instrument(skip(accounts))]
pub async fn list_users(
    State(accounts): State<AccountService>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(accounts.list().await?))
}

/// Serialises to `null` when no record has this id.
#[instrument(skip(accounts))]
pub async fn get_user(
    State(accounts): State<AccountService>,
    Path(id): Path<String>,
) -> Result<Json<Option<User>>, AppError> {
    Ok(Json(accounts.find_by_id(&id).await?))
}

#[instrument(skip(accounts))]
pub async fn search_users(
    State(accounts): State<AccountService>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<User>>, AppError> {
    let filter = UserFilter::from_query(params)?;
    Ok(Json(accounts.search(&filter).await?))
}

#[instrument(skip(accounts, payload))]
pub async fn login(
    State(accounts): State<AccountService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(req) = payload?;
    let token = accounts.login(req).await?;
    Ok(Json(TokenResponse { token }))
}

/// Responds with the removed record, or `{}` when nothing matched.
#[instrument(skip(accounts, actor))]
pub async fn delete_user(
    AuthUser(actor): AuthUser,
    State(accounts): State<AccountService>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let deleted = accounts.delete_by_id(&actor, &id).await?;
    let body = match deleted {
        Some(user) => serde_json::to_value(user).map_err(anyhow::Error::from)?,
        None => json!({}),
    };
    Ok(Json(body))
}

#[instrument(skip(accounts, actor))]
pub async fn delete_users(
    AuthUser(actor): AuthUser,
    State(accounts): State<AccountService>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DeleteManyResponse>, AppError> {
    let filter = UserFilter::from_query(params)?;
    let deleted_count = accounts.delete_by_query(&actor, &filter).await?;
    Ok(Json(DeleteManyResponse {
        acknowledged: true,
        deleted_count,
    }))
}

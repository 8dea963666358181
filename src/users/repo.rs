use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserFilter};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: username `{0}` already exists")]
    DuplicateKey(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. Reads leave `password` unset unless the
/// method name says otherwise.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_query(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;
    async fn find_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError>;
    /// Returns the removed record, password included.
    async fn delete_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Returns the number of removed records.
    async fn delete_by_query(&self, filter: &UserFilter) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(id) = filter.id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(username) = &filter.username {
        qb.push(" AND username = ").push_bind(username.clone());
    }
    if let Some(email) = &filter.email {
        qb.push(" AND email = ").push_bind(email.clone());
    }
    if let Some(active) = filter.active {
        qb.push(" AND active = ").push_bind(active);
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password, active, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.active)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateKey(user.username.clone())
            }
            other => StoreError::Database(other),
        })
    }

    async fn find(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, active, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_query(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, username, email, active, created_at, updated_at FROM users",
        );
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at ASC");
        let users = qb.build_query_as::<User>().fetch_all(&self.db).await?;
        Ok(users)
    }

    async fn find_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, active, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, username, email, password, active, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete_by_query(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM users");
        push_filter(&mut qb, filter);
        let result = qb.build().execute(&self.db).await?;
        Ok(result.rows_affected())
    }
}

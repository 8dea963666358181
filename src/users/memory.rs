use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User, UserFilter};

/// In-process store used by the test suite.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

fn without_password(user: &User) -> User {
    User {
        password: None,
        ..user.clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().expect("user store lock poisoned");
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateKey(user.username));
        }
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password: Some(user.password_hash),
            active: user.active,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().expect("user store lock poisoned");
        Ok(users.iter().map(without_password).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().expect("user store lock poisoned");
        Ok(users.iter().find(|u| u.id == id).map(without_password))
    }

    async fn find_by_query(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().expect("user store lock poisoned");
        Ok(users
            .iter()
            .filter(|u| filter.matches(u))
            .map(without_password)
            .collect())
    }

    async fn find_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.read().expect("user store lock poisoned");
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().expect("user store lock poisoned");
        let removed = users
            .iter()
            .position(|u| u.id == id)
            .map(|idx| users.remove(idx));
        Ok(removed)
    }

    async fn delete_by_query(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        let mut users = self.users.write().expect("user store lock poisoned");
        let before = users.len();
        users.retain(|u| !filter.matches(u));
        Ok((before - users.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: format!("{}@example.com", username),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            active: true,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_and_first_kept() {
        let store = MemoryUserStore::default();
        store.create(new_user("alice")).await.unwrap();
        let err = store.create(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(ref u) if u == "alice"));

        let filter = UserFilter {
            username: Some("alice".into()),
            ..Default::default()
        };
        assert_eq!(store.find_by_query(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reads_strip_password_but_login_lookup_keeps_it() {
        let store = MemoryUserStore::default();
        let created = store.create(new_user("bob")).await.unwrap();
        assert!(created.password.is_some());

        let found = store.find_by_id(created.id).await.unwrap().unwrap();
        assert!(found.password.is_none());
        assert!(store.find().await.unwrap()[0].password.is_none());

        let login = store
            .find_by_username_with_password("bob")
            .await
            .unwrap()
            .unwrap();
        assert!(login.password.is_some());
    }

    #[tokio::test]
    async fn delete_by_query_counts_removed() {
        let store = MemoryUserStore::default();
        store.create(new_user("a")).await.unwrap();
        store.create(new_user("b")).await.unwrap();
        let filter = UserFilter {
            username: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(store.delete_by_query(&filter).await.unwrap(), 1);
        assert_eq!(store.delete_by_query(&filter).await.unwrap(), 0);
        assert_eq!(store.find().await.unwrap().len(), 1);
    }
}

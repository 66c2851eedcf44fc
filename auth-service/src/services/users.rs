use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{Role, User};
use crate::services::ServiceError;
use crate::utils::{hash_password, Password};

/// Identity storage seam. Durable persistence is out of scope for this
/// subsystem; the in-memory implementation backs tests and the fixture
/// deployment, and a database-backed store slots in behind the same trait.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<User>;
    async fn find_by_email(&self, email: &str) -> Option<User>;
    async fn find_by_id(&self, id: Uuid) -> Option<User>;
    async fn insert(&self, user: User) -> Result<(), ServiceError>;
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>);
    async fn list(&self) -> Vec<User>;
}

/// In-memory user store keyed by username (the login key).
#[derive(Default)]
pub struct MemoryUserStore {
    by_username: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a known admin account, hashing the given password.
    pub fn with_admin(
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, anyhow::Error> {
        let store = Self::new();
        let hash = hash_password(&Password::new(password.to_string()))?;
        let user = User::new(
            username.to_string(),
            email.to_string(),
            hash.into_string(),
            Role::Admin,
        );
        store.by_username.insert(user.username.clone(), user);
        Ok(store)
    }

    /// Seed an additional account (fixtures and tests).
    pub fn seed_user(&self, username: &str, email: &str, password: &str, role: Role) {
        let hash = hash_password(&Password::new(password.to_string()))
            .expect("password hashing cannot fail for fixture data");
        let user = User::new(
            username.to_string(),
            email.to_string(),
            hash.into_string(),
            role,
        );
        self.by_username.insert(user.username.clone(), user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Option<User> {
        self.by_username.get(username).map(|u| u.value().clone())
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.by_username
            .iter()
            .find(|entry| entry.email.eq_ignore_ascii_case(email))
            .map(|entry| entry.value().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.by_username
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone())
    }

    async fn insert(&self, user: User) -> Result<(), ServiceError> {
        // Entry API keeps the uniqueness check and the write atomic.
        match self.by_username.entry(user.username.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ServiceError::UsernameTaken),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) {
        if let Some(mut entry) = self
            .by_username
            .iter_mut()
            .find(|entry| entry.id == id)
        {
            entry.last_login = Some(at);
        }
    }

    async fn list(&self) -> Vec<User> {
        self.by_username
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

//! Identity store
//!
//! The auth layer never talks to a database directly; it looks identities up
//! through [`UserStore`]. Two implementations ship with the crate:
//! [`InMemoryUserStore`] for tests and local development, and
//! [`crate::PgUserStore`] for PostgreSQL.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{AddressRecord, CoreError, InternshipRecord, Result, UserRecord, UserUpdate};

/// Trait for identity lookups and persistence of users and what they own
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by login email (exact match)
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Find a user by id
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;

    /// Persist a new user. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, user: UserRecord) -> Result<UserRecord>;

    /// List all users
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// Apply a partial update. Returns `None` if the user is absent and
    /// fails with `Conflict` if the new email belongs to another user.
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<UserRecord>>;

    /// Delete a user and everything it owns. Returns false if absent.
    async fn delete_user(&self, id: &str) -> Result<bool>;

    /// List the addresses owned by a user
    async fn list_addresses(&self, user_id: &str) -> Result<Vec<AddressRecord>>;

    /// Find a single address by id
    async fn find_address(&self, id: &str) -> Result<Option<AddressRecord>>;

    /// Persist an internship. Fails with `NotFound` if the user is absent.
    async fn create_internship(&self, internship: InternshipRecord) -> Result<InternshipRecord>;

    /// List the internships held by a user
    async fn list_internships(&self, user_id: &str) -> Result<Vec<InternshipRecord>>;
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserRecord>,
    addresses: HashMap<String, AddressRecord>,
    internships: HashMap<String, InternshipRecord>,
}

/// In-memory identity store
///
/// Single `RwLock` over all tables so cascading deletes are atomic.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an address to an existing user
    pub async fn add_address(&self, address: AddressRecord) -> Result<AddressRecord> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&address.user_id) {
            return Err(CoreError::NotFound(format!("User {}", address.user_id)));
        }
        tables.addresses.insert(address.id.clone(), address.clone());
        Ok(address)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn create_user(&self, user: UserRecord) -> Result<UserRecord> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(CoreError::Conflict("Email already in use".to_string()));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let tables = self.tables.read().await;
        let mut users: Vec<UserRecord> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<UserRecord>> {
        let mut tables = self.tables.write().await;

        if let Some(email) = &update.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(CoreError::Conflict("Email already in use".to_string()));
            }
        }

        let Some(user) = tables.users.get_mut(id) else {
            return Ok(None);
        };
        user.apply(update);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(id).is_none() {
            return Ok(false);
        }
        tables.addresses.retain(|_, a| a.user_id != id);
        tables.internships.retain(|_, i| i.user_id != id);
        Ok(true)
    }

    async fn list_addresses(&self, user_id: &str) -> Result<Vec<AddressRecord>> {
        let tables = self.tables.read().await;
        let mut addresses: Vec<AddressRecord> = tables
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(addresses)
    }

    async fn find_address(&self, id: &str) -> Result<Option<AddressRecord>> {
        Ok(self.tables.read().await.addresses.get(id).cloned())
    }

    async fn create_internship(&self, internship: InternshipRecord) -> Result<InternshipRecord> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&internship.user_id) {
            return Err(CoreError::NotFound(format!("User {}", internship.user_id)));
        }
        tables
            .internships
            .insert(internship.id.clone(), internship.clone());
        Ok(internship)
    }

    async fn list_internships(&self, user_id: &str) -> Result<Vec<InternshipRecord>> {
        let tables = self.tables.read().await;
        let mut internships: Vec<InternshipRecord> = tables
            .internships
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        internships.sort_by(|a, b| a.joined_date.cmp(&b.joined_date).then(a.id.cmp(&b.id)));
        Ok(internships)
    }
}

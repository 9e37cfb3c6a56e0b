//! In-memory store implementations for testing and WASM targets.
//!
//! Uses `HashMap` behind `std::sync::RwLock` for thread safety. Nothing is
//! persisted; the data lives as long as the store value.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::intake::normalize_email;
use crate::models::User;

use super::{DuplicateEmail, KeyValueStore, UserStore};

/// In-memory [`KeyValueStore`].
#[derive(Default)]
pub struct InMemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("kv lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("kv lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// In-memory [`UserStore`] keyed by id.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow!("user lock poisoned"))?;
        let email = normalize_email(&user.email);
        if users.values().any(|u| u.email == email) {
            return Err(DuplicateEmail(user.email.clone()).into());
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("user lock poisoned"))?;
        let email = normalize_email(email);
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("user lock poisoned"))?;
        Ok(users.get(id).cloned())
    }
}

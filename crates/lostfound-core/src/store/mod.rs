//! Storage abstractions for Lost & Found.
//!
//! Two seams are defined here:
//!
//! - [`KeyValueStore`]: a plain string `get`/`put` store. [`ReportStore`]
//!   keeps each report collection as a JSON array under one key.
//! - [`UserStore`]: create/lookup for registered users.
//!
//! Implementations must be `Send + Sync` to work with async runtimes. The
//! match engine never touches either store; callers load both collections
//! first and pass slices to [`match_reports`](crate::matcher::match_reports).

pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::intake;
use crate::models::{ItemReport, NewReport, ReportKind, User};

/// Abstract string key-value backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Abstract user backend.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a user. Fails if the email is already taken.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Look up a user by (case-insensitive) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by id.
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
}

/// Returned by [`UserStore::create_user`] when the email is already registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a user with email '{0}' already exists")]
pub struct DuplicateEmail(pub String);

/// Lost and found collections persisted through a [`KeyValueStore`].
pub struct ReportStore<K> {
    kv: K,
}

impl<K: KeyValueStore> ReportStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Return the full collection for `kind`, in insertion order.
    ///
    /// A missing key reads as an empty collection.
    pub async fn list_reports(&self, kind: ReportKind) -> Result<Vec<ItemReport>> {
        let key = kind.storage_key();
        match self.kv.get(&key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Failed to decode report collection '{}'", key)),
            None => Ok(Vec::new()),
        }
    }

    /// Validate `new`, assign its id and timestamp, and append it to the
    /// `kind` collection.
    pub async fn add_report(&self, kind: ReportKind, new: NewReport) -> Result<ItemReport> {
        let report = intake::create_report(new)?;
        let mut reports = self.list_reports(kind).await?;
        reports.push(report.clone());

        let encoded = serde_json::to_string(&reports)?;
        self.kv.put(&kind.storage_key(), &encoded).await?;

        tracing::info!(kind = %kind, id = %report.id, "stored report");
        Ok(report)
    }

    /// Load both collections, lost first.
    pub async fn load_all(&self) -> Result<(Vec<ItemReport>, Vec<ItemReport>)> {
        let lost = self.list_reports(ReportKind::Lost).await?;
        let found = self.list_reports(ReportKind::Found).await?;
        Ok((lost, found))
    }
}

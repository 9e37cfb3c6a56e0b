//! SQLite-backed [`KeyValueStore`] and [`UserStore`] implementations.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use lostfound_core::intake::normalize_email;
use lostfound_core::models::User;
use lostfound_core::store::{DuplicateEmail, KeyValueStore, UserStore};

/// Key-value pairs in the `kv` table.
#[derive(Clone)]
pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Users in the `users` table.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let email = normalize_email(&user.email);
        let result =
            sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)")
                .bind(&user.id)
                .bind(&user.name)
                .bind(&email)
                .bind(chrono::Utc::now().timestamp())
                .execute(&self.pool)
                .await;

        // The UNIQUE constraint on `users.email` decides duplicates, so two
        // concurrent registrations cannot both succeed.
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DuplicateEmail(user.email.clone()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use lostfound_core::intake;
    use lostfound_core::models::{NewReport, ReportKind};
    use lostfound_core::store::ReportStore;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::apply(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_kv_put_overwrites() {
        let kv = SqliteKv::new(memory_pool().await);
        assert_eq!(kv.get("k").await.unwrap(), None);
        kv.put("k", "one").await.unwrap();
        kv.put("k", "two").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_report_store_over_sqlite() {
        let store = ReportStore::new(SqliteKv::new(memory_pool().await));
        let report = store
            .add_report(
                ReportKind::Found,
                NewReport {
                    name: "Phone".to_string(),
                    description: "cracked screen".to_string(),
                    location: "Mall".to_string(),
                    reporter_id: "u1".to_string(),
                    ..NewReport::default()
                },
            )
            .await
            .unwrap();
        let found = store.list_reports(ReportKind::Found).await.unwrap();
        assert_eq!(found, vec![report]);
        assert!(store.list_reports(ReportKind::Lost).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_users_lookup_folds_non_ascii_case() {
        let users = SqliteUserStore::new(memory_pool().await);
        let emile = intake::create_user("Emile", "ÉMILE@x.org").unwrap();
        users.create_user(&emile).await.unwrap();

        assert_eq!(
            users.find_by_email("ÉMILE@x.org").await.unwrap(),
            Some(emile.clone())
        );
        assert_eq!(
            users.find_by_email(" émile@X.ORG ").await.unwrap(),
            Some(emile)
        );
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_duplicate_email() {
        let pool = memory_pool().await;
        // A row that landed between another writer's check and insert.
        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES ('u0', 'Ada', 'ada@example.com', 0)")
            .execute(&pool)
            .await
            .unwrap();

        let users = SqliteUserStore::new(pool);
        let dup = intake::create_user("Ada L", "ada@example.com").unwrap();
        let err = users.create_user(&dup).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<DuplicateEmail>().map(|d| d.0.as_str()),
            Some("ada@example.com")
        );
        assert_eq!(users.get_user(&dup.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_users_unique_by_email() {
        let users = SqliteUserStore::new(memory_pool().await);
        let ada = intake::create_user("Ada", "ada@example.com").unwrap();
        users.create_user(&ada).await.unwrap();

        assert_eq!(
            users.find_by_email("Ada@Example.com").await.unwrap(),
            Some(ada.clone())
        );
        assert_eq!(users.get_user(&ada.id).await.unwrap(), Some(ada));

        let dup = intake::create_user("Other", "ada@example.com").unwrap();
        let err = users.create_user(&dup).await.unwrap_err();
        assert!(err.downcast_ref::<DuplicateEmail>().is_some());
    }
}

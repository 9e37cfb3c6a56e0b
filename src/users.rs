//! User registration and lookup (`lf user`, `/users`).

use anyhow::Result;
use lostfound_core::intake;
use lostfound_core::models::User;
use lostfound_core::store::UserStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteUserStore;

/// Validate and register a user on any [`UserStore`].
pub async fn register<S: UserStore>(store: &S, name: &str, email: &str) -> Result<User> {
    let user = intake::create_user(name, email)?;
    store.create_user(&user).await?;
    tracing::info!(id = %user.id, "registered user");
    Ok(user)
}

/// CLI entry point for `lf user add`.
pub async fn run_add(config: &Config, name: &str, email: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteUserStore::new(pool.clone());
    let result = register(&store, name, email).await;
    pool.close().await;

    let user = result?;
    println!("Registered user {} <{}> ({})", user.name, user.email, user.id);
    Ok(())
}

/// CLI entry point for `lf user get`.
pub async fn run_get(config: &Config, email: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteUserStore::new(pool.clone());
    let user = store.find_by_email(email).await;
    pool.close().await;

    match user? {
        Some(user) => {
            println!("id:    {}", user.id);
            println!("name:  {}", user.name);
            println!("email: {}", user.email);
            Ok(())
        }
        None => anyhow::bail!("user not found: {}", email),
    }
}

//! # Lost & Found
//!
//! A local-first lost-and-found tracker. Users file lost and found item
//! reports; a heuristic match engine ranks candidate pairings between the
//! two collections so an owner and a finder can be put in touch.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │    Intake    │──▶│ Report store │──▶│    SQLite    │
//! │  (validate)  │   │  (KV / JSON) │   │  kv + users  │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │ lost[], found[]
//!                           ▼
//!                    ┌──────────────┐
//!                    │   Matcher    │  pure, in-memory
//!                    └──────┬───────┘
//!                ┌──────────┴──────────┐
//!                ▼                     ▼
//!           ┌──────────┐         ┌──────────┐
//!           │   CLI    │         │   HTTP   │
//!           │   (lf)   │         │  (axum)  │
//!           └──────────┘         └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lf init
//! lf report lost --name Wallet --description "black leather" --location Library --reporter u1
//! lf report found --name Wallet --description "black leather wallet" --location Library --reporter u2
//! lf match --explain
//! lf serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite key-value and user stores |
//! | [`reports`] | Report intake and listing |
//! | [`matches`] | Match runs over the stored collections |
//! | [`users`] | User registration and lookup |
//! | [`server`] | JSON HTTP server (Axum) with CORS |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! The match engine, models and store traits live in `lostfound-core`.

pub mod config;
pub mod db;
pub mod logging;
pub mod matches;
pub mod migrate;
pub mod reports;
pub mod server;
pub mod sqlite_store;
pub mod users;

pub use lostfound_core::{intake, matcher, models, store};

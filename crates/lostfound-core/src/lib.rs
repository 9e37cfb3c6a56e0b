//! # Lost & Found Core
//!
//! Shared, WASM-safe logic for Lost & Found: report models, intake
//! validation, store abstractions, and the match engine.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. It compiles to both native targets and
//! `wasm32-unknown-unknown`.

pub mod intake;
pub mod matcher;
pub mod models;
pub mod store;

//! Application-level entry points for the match engine.
//!
//! The ranking itself lives in `lostfound-core::matcher` and works on
//! borrowed slices. This wrapper loads both collections from the database,
//! turns the borrowed candidates into owned results for JSON and CLI
//! output, and applies the certain-match presentation policy: finder
//! contact details are only exposed for certain matches.

use anyhow::{Context, Result};
use serde::Serialize;

pub use lostfound_core::matcher::{
    match_reports, MatchParams, SignalBreakdown, CERTAIN_MATCH_THRESHOLD,
};
use lostfound_core::models::ItemReport;
use lostfound_core::store::{KeyValueStore, ReportStore};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteKv;

/// Contact details of the person who filed the found report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinderContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One ranked candidate, owning copies of both reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResultItem {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub score: f64,
    /// True when `score` reaches [`CERTAIN_MATCH_THRESHOLD`].
    pub certain: bool,
    pub lost: ItemReport,
    pub found: ItemReport,
    /// Present only for certain matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<FinderContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<SignalBreakdown>,
}

/// Run the matcher and convert its candidates into owned results.
pub fn rank(lost: &[ItemReport], found: &[ItemReport], params: &MatchParams) -> Vec<MatchResultItem> {
    match_reports(lost, found, params)
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let certain = c.is_certain();
            let contact = certain.then(|| FinderContact {
                name: c.found_report.contact_name.clone(),
                email: c.found_report.contact_email.clone(),
                phone: c.found_report.contact_phone.clone(),
            });
            MatchResultItem {
                rank: i + 1,
                score: c.score,
                certain,
                lost: c.lost_report.clone(),
                found: c.found_report.clone(),
                contact,
                signals: c.signals,
            }
        })
        .collect()
}

/// Load both collections from `store` and rank them.
///
/// Load failures are reported before the matcher runs.
pub async fn match_from_store<K: KeyValueStore>(
    store: &ReportStore<K>,
    params: &MatchParams,
) -> Result<Vec<MatchResultItem>> {
    let (lost, found) = store
        .load_all()
        .await
        .context("Failed to load report collections")?;

    let results = rank(&lost, &found, params);
    tracing::info!(
        lost = lost.len(),
        found = found.len(),
        returned = results.len(),
        "match run complete"
    );
    Ok(results)
}

/// Core match function returning structured results (used by CLI and server).
pub async fn find_matches(config: &Config, params: &MatchParams) -> Result<Vec<MatchResultItem>> {
    let pool = db::connect(config).await?;
    let store = ReportStore::new(SqliteKv::new(pool.clone()));
    let results = match_from_store(&store, params).await;
    pool.close().await;
    results
}

/// CLI entry point for `lf match`.
pub async fn run_match(config: &Config, params: &MatchParams, json: bool) -> Result<()> {
    let results = find_matches(config, params).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for result in &results {
        let tag = if result.certain { "  CERTAIN" } else { "" };
        println!(
            "{}. [{:.2}]{} {} <-> {}",
            result.rank, result.score, tag, result.lost.name, result.found.name
        );
        if let Some(ref s) = result.signals {
            println!(
                "    signals: name={}  description={}  location={}",
                s.name, s.description, s.location
            );
        }
        println!(
            "    lost:  \"{}\" at {} (id {})",
            result.lost.description, result.lost.location, result.lost.id
        );
        println!(
            "    found: \"{}\" at {} (id {})",
            result.found.description, result.found.location, result.found.id
        );
        if let Some(ref contact) = result.contact {
            println!(
                "    contact: {} / {} / {}",
                contact.name.as_deref().unwrap_or("-"),
                contact.email.as_deref().unwrap_or("-"),
                contact.phone.as_deref().unwrap_or("-")
            );
        }
        println!();
    }

    Ok(())
}

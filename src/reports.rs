//! Report intake and listing.
//!
//! Shared by `lf report`, `lf list` and the `/reports/{kind}` HTTP routes.
//! Collections are stored as JSON arrays in the `kv` table through
//! [`ReportStore`].

use anyhow::Result;
use lostfound_core::models::{ItemReport, NewReport, ReportKind};
use lostfound_core::store::ReportStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteKv;

/// Validate and store a new report, returning it with its assigned id.
pub async fn add_report(config: &Config, kind: ReportKind, new: NewReport) -> Result<ItemReport> {
    let pool = db::connect(config).await?;
    let store = ReportStore::new(SqliteKv::new(pool.clone()));
    let result = store.add_report(kind, new).await;
    pool.close().await;
    result
}

/// Return the full `kind` collection.
pub async fn list_reports(config: &Config, kind: ReportKind) -> Result<Vec<ItemReport>> {
    let pool = db::connect(config).await?;
    let store = ReportStore::new(SqliteKv::new(pool.clone()));
    let result = store.list_reports(kind).await;
    pool.close().await;
    result
}

/// CLI entry point for `lf report`.
pub async fn run_report(config: &Config, kind: ReportKind, new: NewReport) -> Result<()> {
    let report = add_report(config, kind, new).await?;
    println!("Recorded {} report {}", kind, report.id);
    Ok(())
}

/// CLI entry point for `lf list`.
pub async fn run_list(config: &Config, kind: ReportKind, json: bool) -> Result<()> {
    let reports = list_reports(config, kind).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No {} reports.", kind);
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }
    println!("{} {} report(s)", reports.len(), kind);
    Ok(())
}

fn print_report(report: &ItemReport) {
    println!("{}", report.name);
    println!("    description: {}", report.description);
    println!("    location:    {}", report.location);
    if let Some(c) = report.coordinates {
        println!("    coordinates: {:.5}, {:.5}", c.latitude, c.longitude);
    }
    println!(
        "    reported:    {}",
        report.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
    );
    if let Some(ref image) = report.image_reference {
        println!("    image:       {}", image);
    }
    println!("    id:          {}", report.id);
    println!();
}

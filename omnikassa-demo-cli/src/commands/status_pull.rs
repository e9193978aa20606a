//! Status pull command - fetch every order result a notification announces

use anyhow::{Context, Result};
use omnikassa_lib::{Notification, Omnikassa};
use std::path::Path;

use crate::ui;

pub async fn run(config: Option<&Path>, notification: &Path, json: bool, verbose: bool) -> Result<()> {
    let config = super::load_config(config)?;
    let raw = super::read_payload(notification)?;
    let notification = Notification::from_json(&raw)
        .with_context(|| format!("{} is not a notification", notification.display()))?;

    let client = Omnikassa::new(config).context("Failed to build client")?;

    if !json {
        ui::header("Status Pull");
        ui::key_value("Event", notification.event_name());
        ui::key_value("POI", notification.poi_id());
        ui::key_value("Expires", notification.expiry_raw());
        ui::separator();
    }

    let summary = client
        .status_pull(&notification, |result| {
            if json {
                match serde_json::to_string(&result) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "could not encode order result"),
                }
            } else {
                ui::order_result(&result);
            }
        })
        .await?;

    if !json {
        ui::separator();
        ui::success(&format!(
            "{} result(s) over {} page(s)",
            summary.results, summary.pages
        ));
    } else if verbose {
        tracing::info!(pages = summary.pages, results = summary.results, "status pull complete");
    }

    Ok(())
}

//! Verify notification command - offline signature and expiry check

use anyhow::{bail, Context, Result};
use chrono::Utc;
use omnikassa_lib::Notification;
use std::path::Path;

use crate::ui;

pub fn run(config: Option<&Path>, notification: &Path, verbose: bool) -> Result<()> {
    let config = super::load_config(config)?;
    let signer = config
        .signature_service()
        .context("Configured signing key is unusable")?;

    let raw = super::read_payload(notification)?;
    let notification = Notification::from_json(&raw)
        .with_context(|| format!("{} is not a notification", notification.display()))?;

    ui::header("Notification");
    ui::key_value("Event", notification.event_name());
    ui::key_value("POI", notification.poi_id());
    ui::key_value("Expiry", notification.expiry_raw());
    if verbose {
        ui::key_value("Canonical", &notification.canonical_string());
    }

    let signature_ok = notification.valid_signature(&signer);
    let expiring = notification.is_expiring_at(Utc::now());

    if signature_ok {
        ui::success("Signature valid");
    } else {
        ui::error("Signature does not match");
    }
    if expiring {
        ui::warning("Notification has expired or expires within 30 seconds");
    } else {
        ui::success("Notification is fresh");
    }

    match notification.ensure_usable(&signer, Utc::now()) {
        Ok(()) => Ok(()),
        Err(e) => bail!("notification unusable: {}", e),
    }
}

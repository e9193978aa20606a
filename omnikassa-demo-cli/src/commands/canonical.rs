//! Canonical command - show the exact string a payload is signed over

use anyhow::{Context, Result};
use clap::ValueEnum;
use omnikassa_lib::{Notification, OrderResultSet};
use std::path::Path;

/// Payloads the gateway signs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PayloadKind {
    /// Webhook notification
    Notification,
    /// Status pull result page
    Page,
}

pub fn run(kind: PayloadKind, file: &Path) -> Result<()> {
    let raw = super::read_payload(file)?;
    let canonical = canonical_string(kind, &raw)
        .with_context(|| format!("{} is not a valid {:?} payload", file.display(), kind))?;

    println!("{}", canonical);
    Ok(())
}

fn canonical_string(kind: PayloadKind, raw: &str) -> omnikassa_lib::Result<String> {
    Ok(match kind {
        PayloadKind::Notification => Notification::from_json(raw)?.canonical_string(),
        PayloadKind::Page => OrderResultSet::from_json(raw)?.canonical_string(),
    })
}

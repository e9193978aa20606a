//! Sign command - sign a canonical string offline

use anyhow::{Context, Result};
use std::path::Path;

pub fn run(config: Option<&Path>, canonical: &str) -> Result<()> {
    let config = super::load_config(config)?;
    let signer = config
        .signature_service()
        .context("Configured signing key is unusable")?;

    // Raw output so the signature can be piped.
    println!("{}", signer.sign(canonical));
    Ok(())
}

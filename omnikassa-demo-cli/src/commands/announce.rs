//! Announce command - register an order and show the payment page URL

use anyhow::{bail, Context, Result};
use omnikassa_lib::{MerchantOrder, Money, Omnikassa};
use std::path::Path;

use crate::ui;

/// Arguments of `omnikassa-demo announce`.
#[derive(Debug, Clone)]
pub struct AnnounceArgs {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub return_url: String,
    pub description: Option<String>,
    pub assume_yes: bool,
}

impl AnnounceArgs {
    fn to_order(&self) -> Result<MerchantOrder> {
        let amount = Money::new(self.amount, self.currency.as_str())?;
        let mut order = MerchantOrder::new(self.order_id.as_str(), amount, self.return_url.as_str());
        if let Some(description) = &self.description {
            order = order.with_description(description.as_str());
        }
        order.validate()?;
        Ok(order)
    }
}

#[tracing::instrument(skip_all, fields(order_id = %args.order_id))]
pub async fn run(config: Option<&Path>, args: AnnounceArgs, verbose: bool) -> Result<()> {
    ui::header("Announce Order");

    let config = super::load_config(config)?;
    let order = args.to_order()?;

    ui::key_value("Environment", &config.environment.to_string());
    ui::key_value("Order", order.merchant_order_id());
    ui::key_value("Amount", &ui::money(order.amount()));
    ui::key_value("Return URL", order.merchant_return_url());
    if let Some(description) = order.description() {
        ui::key_value("Description", description);
    }

    if !args.assume_yes && !ui::confirm("Announce this order?", true)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let client = Omnikassa::new(config).context("Failed to build client")?;

    let spinner = ui::spinner("Contacting OmniKassa...");
    let outcome = client.announce_order(order).await;
    spinner.finish_and_clear();

    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            if e.is_retryable() {
                ui::warning("The gateway may be temporarily unavailable; retrying later can help");
            }
            if verbose {
                if let Some(detail) = e.api_detail() {
                    tracing::debug!(?detail, "gateway error detail");
                }
            }
            bail!(e);
        }
    };

    ui::success("Order announced");
    ui::key_value("Redirect URL", response.redirect_url());
    if let Some(id) = response.omnikassa_order_id() {
        ui::key_value("OmniKassa order", id);
    }
    if verbose {
        ui::key_value("Signature", response.signature());
    }

    Ok(())
}

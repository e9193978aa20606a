//! Announce an order against the gateway configured in the environment.
//!
//! ```bash
//! export OMNIKASSA_REFRESH_TOKEN=...
//! export OMNIKASSA_SIGNING_KEY=...
//! export OMNIKASSA_BASE_URL=sandbox
//! cargo run -p omnikassa-lib --example announce_order
//! ```

use omnikassa_lib::models::{Language, OrderItem};
use omnikassa_lib::{MerchantOrder, Money, Omnikassa, OmnikassaConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Omnikassa::new(OmnikassaConfig::from_env()?)?;

    let order = MerchantOrder::new("example-order-1", Money::eur(4999), "https://shop.example/return")
        .with_language(Language::En)
        .with_description("Example order")
        .with_item(OrderItem::new("T-shirt", 1, Money::eur(4999)));

    let response = client.announce_order(order).await?;
    println!("Redirect the consumer to: {}", response.redirect_url());
    Ok(())
}

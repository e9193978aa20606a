//! Order announced by the merchant before redirecting the consumer to pay.
//!
//! A [`MerchantOrder`] carries everything except the request timestamp, which
//! is captured when the announce request is built. The signature covers the
//! timestamp followed by the order fields in [`MerchantOrder::signature_fields`].

use serde::{Deserialize, Serialize};

use super::money::Money;
use crate::canonical::{Canonical, FieldSpec, FieldValue};
use crate::{OmnikassaError, Result};

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Value as sent on the wire and signed.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Language of the hosted payment pages.
    Language {
        Nl => "NL",
        En => "EN",
        Fr => "FR",
        De => "DE",
    }
}

wire_enum! {
    /// Payment method preselected for the consumer.
    PaymentBrand {
        Ideal => "IDEAL",
        Afterpay => "AFTERPAY",
        Paypal => "PAYPAL",
        Mastercard => "MASTERCARD",
        Visa => "VISA",
        Bancontact => "BANCONTACT",
        Maestro => "MAESTRO",
        VPay => "V_PAY",
        Cards => "CARDS",
    }
}

wire_enum! {
    /// Whether the consumer may pick another brand than [`PaymentBrand`].
    PaymentBrandForce {
        ForceOnce => "FORCE_ONCE",
        ForceAlways => "FORCE_ALWAYS",
    }
}

wire_enum! {
    ItemCategory {
        Physical => "PHYSICAL",
        Digital => "DIGITAL",
    }
}

wire_enum! {
    /// Dutch VAT bracket of an order item.
    VatCategory {
        High => "1",
        Low => "2",
        Zero => "3",
        Exempt => "4",
    }
}

/// One line of the order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: u32,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Money>,
    pub category: ItemCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_category: Option<VatCategory>,
}

impl OrderItem {
    /// A physical item without id, description, tax or VAT category.
    pub fn new(name: impl Into<String>, quantity: u32, amount: Money) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            quantity,
            amount,
            tax: None,
            category: ItemCategory::Physical,
            vat_category: None,
        }
    }

    pub fn signature_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("id"),
            FieldSpec::new("name"),
            FieldSpec::new("description"),
            FieldSpec::new("quantity"),
            FieldSpec::nested("amount", Money::signature_fields()),
            FieldSpec::nested("tax", Money::signature_fields()),
            FieldSpec::new("category"),
            FieldSpec::new("vat_category"),
        ]
    }
}

impl Canonical for OrderItem {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "id" => FieldValue::optional_text(self.id.as_deref()),
            "name" => FieldValue::text(&self.name),
            "description" => FieldValue::optional_text(self.description.as_deref()),
            "quantity" => FieldValue::display(self.quantity),
            "amount" => FieldValue::Nested(&self.amount),
            "tax" => FieldValue::optional_nested(self.tax.as_ref()),
            "category" => FieldValue::text(self.category.as_str()),
            "vat_category" => {
                FieldValue::optional_text(self.vat_category.as_ref().map(VatCategory::as_str))
            }
            _ => FieldValue::Absent,
        }
    }
}

/// Shipping or billing address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub street: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number_addition: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub country_code: String,
}

impl Address {
    pub fn signature_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("first_name"),
            FieldSpec::new("middle_name"),
            FieldSpec::new("last_name"),
            FieldSpec::new("street"),
            FieldSpec::new("house_number"),
            FieldSpec::new("house_number_addition"),
            FieldSpec::new("postal_code"),
            FieldSpec::new("city"),
            FieldSpec::new("country_code"),
        ]
    }
}

impl Canonical for Address {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "first_name" => FieldValue::text(&self.first_name),
            "middle_name" => FieldValue::optional_text(self.middle_name.as_deref()),
            "last_name" => FieldValue::text(&self.last_name),
            "street" => FieldValue::text(&self.street),
            "house_number" => FieldValue::optional_text(self.house_number.as_deref()),
            "house_number_addition" => {
                FieldValue::optional_text(self.house_number_addition.as_deref())
            }
            "postal_code" => FieldValue::text(&self.postal_code),
            "city" => FieldValue::text(&self.city),
            "country_code" => FieldValue::text(&self.country_code),
            _ => FieldValue::Absent,
        }
    }
}

/// Order to announce.
///
/// Built with [`MerchantOrder::new`] and refined with the `with_*` methods.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantOrder {
    merchant_order_id: String,
    amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "merchantReturnURL")]
    merchant_return_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    order_items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipping_detail: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_brand: Option<PaymentBrand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_brand_force: Option<PaymentBrandForce>,
    #[serde(skip_serializing_if = "Option::is_none")]
    billing_detail: Option<Address>,
}

impl MerchantOrder {
    pub fn new(
        merchant_order_id: impl Into<String>,
        amount: Money,
        merchant_return_url: impl Into<String>,
    ) -> Self {
        Self {
            merchant_order_id: merchant_order_id.into(),
            amount,
            language: None,
            description: None,
            merchant_return_url: merchant_return_url.into(),
            order_items: Vec::new(),
            shipping_detail: None,
            payment_brand: None,
            payment_brand_force: None,
            billing_detail: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_item(mut self, item: OrderItem) -> Self {
        self.order_items.push(item);
        self
    }

    pub fn with_shipping_detail(mut self, address: Address) -> Self {
        self.shipping_detail = Some(address);
        self
    }

    pub fn with_billing_detail(mut self, address: Address) -> Self {
        self.billing_detail = Some(address);
        self
    }

    /// Preselect a payment brand, optionally forcing it.
    pub fn with_payment_brand(mut self, brand: PaymentBrand, force: Option<PaymentBrandForce>) -> Self {
        self.payment_brand = Some(brand);
        self.payment_brand_force = force;
        self
    }

    pub fn merchant_order_id(&self) -> &str {
        &self.merchant_order_id
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn merchant_return_url(&self) -> &str {
        &self.merchant_return_url
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    pub fn shipping_detail(&self) -> Option<&Address> {
        self.shipping_detail.as_ref()
    }

    pub fn billing_detail(&self) -> Option<&Address> {
        self.billing_detail.as_ref()
    }

    pub fn payment_brand(&self) -> Option<PaymentBrand> {
        self.payment_brand
    }

    pub fn payment_brand_force(&self) -> Option<PaymentBrandForce> {
        self.payment_brand_force
    }

    /// Reject orders the gateway would refuse outright.
    pub fn validate(&self) -> Result<()> {
        if self.merchant_order_id.trim().is_empty() {
            return Err(OmnikassaError::invalid_input("merchant_order_id", "must not be empty"));
        }
        if self.amount.amount() < 0 {
            return Err(OmnikassaError::invalid_input(
                "amount",
                format!("must not be negative, got {}", self.amount.amount()),
            ));
        }
        if self.merchant_return_url.trim().is_empty() {
            return Err(OmnikassaError::invalid_input("merchant_return_url", "must not be empty"));
        }
        if self.payment_brand_force.is_some() && self.payment_brand.is_none() {
            return Err(OmnikassaError::invalid_input(
                "payment_brand_force",
                "requires a payment brand",
            ));
        }
        Ok(())
    }

    /// Signing order of an announcement, starting with the request timestamp.
    pub fn signature_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("timestamp"),
            FieldSpec::new("merchant_order_id"),
            FieldSpec::nested("amount", Money::signature_fields()),
            FieldSpec::new("language"),
            FieldSpec::new("description"),
            FieldSpec::new("merchant_return_url"),
            FieldSpec::nested("order_items", OrderItem::signature_fields()),
            FieldSpec::nested("shipping_detail", Address::signature_fields()),
            FieldSpec::new("payment_brand"),
            FieldSpec::new("payment_brand_force"),
            FieldSpec::nested("billing_detail", Address::signature_fields()),
        ]
    }
}

impl Canonical for MerchantOrder {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "merchant_order_id" => FieldValue::text(&self.merchant_order_id),
            "amount" => FieldValue::Nested(&self.amount),
            "language" => FieldValue::optional_text(self.language.as_ref().map(Language::as_str)),
            "description" => FieldValue::optional_text(self.description.as_deref()),
            "merchant_return_url" => FieldValue::text(&self.merchant_return_url),
            "order_items" => FieldValue::Nested(&self.order_items),
            "shipping_detail" => FieldValue::optional_nested(self.shipping_detail.as_ref()),
            "payment_brand" => {
                FieldValue::optional_text(self.payment_brand.as_ref().map(PaymentBrand::as_str))
            }
            "payment_brand_force" => FieldValue::optional_text(
                self.payment_brand_force
                    .as_ref()
                    .map(PaymentBrandForce::as_str),
            ),
            "billing_detail" => FieldValue::optional_nested(self.billing_detail.as_ref()),
            _ => FieldValue::Absent,
        }
    }
}

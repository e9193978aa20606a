//! Wire data exchanged with the gateway.

mod access_token;
mod merchant_order;
mod money;
mod notification;
mod order_result;
mod order_result_set;
pub(crate) mod wire;

pub use access_token::{AccessToken, TokenState, EXPIRATION_MARGIN_SECONDS as TOKEN_EXPIRATION_MARGIN_SECONDS};
pub use merchant_order::{
    Address, ItemCategory, Language, MerchantOrder, OrderItem, PaymentBrand, PaymentBrandForce,
    VatCategory,
};
pub use money::{Money, DEFAULT_CURRENCY};
pub use notification::{Notification, EXPIRATION_MARGIN_SECONDS as NOTIFICATION_EXPIRATION_MARGIN_SECONDS};
pub use order_result::{OrderResult, OrderStatus};
pub use order_result_set::OrderResultSet;

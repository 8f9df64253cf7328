use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::environment::Environment;

/// Milliseconds since the UNIX epoch, as used throughout the App Store
/// Server API.
pub type TimestampMs = u64;

/// Decoded claims of a JWSTransaction, as returned by the App Store Server
/// API.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwstransactiondecodedpayload
///
/// A value of this type is only ever produced after the enclosing JWS has
/// passed signature, chain, environment and bundle-id verification.
/// Nullability is not documented explicitly in the API reference, so
/// reasonable assumptions are made.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwsTransactionDecodedPayload {
    /// A UUID the app created at purchase time to associate the transaction
    /// with a customer on its own service.
    pub app_account_token: Option<String>,
    /// The bundle identifier of the app.
    pub bundle_id: String,
    /// ISO 4217 currency code for `price`; present only if `price` is.
    pub currency: Option<String>,
    /// The server environment, either sandbox or production.
    pub environment: Environment,
    /// When the subscription expires or renews.
    pub expires_date: Option<TimestampMs>,
    /// Whether the transaction was purchased directly or is available
    /// through Family Sharing.
    pub in_app_ownership_type: Option<InAppOwnershipType>,
    /// Whether the customer upgraded to another subscription.
    #[serde(default)]
    pub is_upgraded: bool,
    /// The payment mode of the subscription offer, if any.
    pub offer_discount_type: Option<OfferDiscountType>,
    /// The offer code or promotional offer identifier.
    pub offer_identifier: Option<String>,
    /// The promotional offer type.
    pub offer_type: Option<OfferType>,
    /// Purchase date of the original transaction identifier.
    pub original_purchase_date: Option<TimestampMs>,
    /// The transaction identifier of the original purchase.
    pub original_transaction_id: String,
    /// The price, multiplied by 1000, that the system recorded at purchase
    /// time. `currency` names its currency.
    pub price: Option<i64>,
    /// The unique identifier of the product.
    pub product_id: String,
    /// When the App Store charged the customer's account.
    pub purchase_date: TimestampMs,
    /// The number of consumable products purchased.
    pub quantity: Option<i32>,
    /// When the App Store refunded the transaction or revoked it from
    /// Family Sharing.
    pub revocation_date: Option<TimestampMs>,
    /// Why the App Store refunded or revoked the transaction.
    pub revocation_reason: Option<RevocationReason>,
    /// When the App Store signed the JWS data.
    pub signed_date: TimestampMs,
    /// ISO 3166-1 alpha-3 code of the storefront associated with the
    /// purchase.
    pub storefront: Option<String>,
    /// Apple-defined identifier of that storefront.
    pub storefront_id: Option<String>,
    /// The subscription group the subscription belongs to.
    pub subscription_group_identifier: Option<String>,
    /// The unique identifier of the transaction.
    pub transaction_id: String,
    /// Whether this is a customer-initiated purchase or a system-initiated
    /// renewal.
    pub transaction_reason: Option<TransactionReason>,
    /// The type of the in-app purchase.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Identifier of subscription purchase events across devices, including
    /// renewals.
    pub web_order_line_item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InAppOwnershipType {
    /// The transaction belongs to a family member who benefits from service.
    FamilyShared,
    /// The transaction belongs to the purchaser.
    Purchased,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum RevocationReason {
    /// Refunded for another reason, for example an accidental purchase.
    Other = 0,
    /// Refunded due to an actual or perceived issue within the app.
    Issue = 1,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionReason {
    /// The customer initiated the purchase.
    Purchase,
    /// The App Store server initiated the transaction to renew an
    /// auto-renewable subscription.
    Renewal,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Auto-Renewable Subscription")]
    AutoRenewableSubscription,
    #[serde(rename = "Non-Consumable")]
    NonConsumable,
    #[serde(rename = "Consumable")]
    Consumable,
    #[serde(rename = "Non-Renewing Subscription")]
    NonRenewableSubscription,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDiscountType {
    /// A free trial.
    FreeTrial,
    /// Paid over one or more billing periods.
    PayAsYouGo,
    /// Paid up front.
    PayUpFront,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OfferType {
    /// An introductory offer.
    Introductory = 1,
    /// A promotional offer.
    Promotional = 2,
    /// An offer with a subscription offer code.
    OfferCode = 3,
    /// A win-back offer.
    WinBack = 4,
}

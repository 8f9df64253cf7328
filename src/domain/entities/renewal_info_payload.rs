use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{
    environment::Environment,
    transaction_payload::{OfferDiscountType, OfferType},
};

/// Decoded claims of a JWSRenewalInfo, as returned by the App Store Server
/// API.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwsrenewalinfodecodedpayload
///
/// In this crate renewal info reaches callers only through the lightweight
/// decode path, wrapped in [`crate::domain::entities::unverified::Unverified`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwsRenewalInfoDecodedPayload {
    /// The product that renews at the next billing period.
    pub auto_renew_product_id: String,
    /// The renewal status of the auto-renewable subscription.
    pub auto_renew_status: AutoRenewStatus,
    /// Currency code for `renewal_price`.
    pub currency: Option<String>,
    /// Win-back offer IDs the customer is eligible for.
    #[serde(default)]
    pub eligible_win_back_offer_ids: Vec<String>,
    /// The server environment, either sandbox or production.
    pub environment: Environment,
    /// The reason the subscription expired.
    pub expiration_intent: Option<ExpirationIntent>,
    /// When the billing grace period for renewals expires.
    #[serde(default, with = "ts_milliseconds_option")]
    pub grace_period_expires_date: Option<DateTime<Utc>>,
    /// Whether the App Store is attempting to automatically renew the
    /// expired subscription.
    #[serde(default)]
    pub is_in_billing_retry_period: bool,
    /// The payment mode of the discount offer.
    pub offer_discount_type: Option<OfferDiscountType>,
    /// The offer code or promotional offer identifier.
    pub offer_identifier: Option<String>,
    /// The type of subscription offer.
    pub offer_type: Option<OfferType>,
    /// The transaction identifier of the original purchase.
    pub original_transaction_id: Option<String>,
    /// Whether the subscription is subject to a price increase.
    pub price_increase_status: Option<PriceIncreaseStatus>,
    /// The product identifier of the in-app purchase.
    pub product_id: String,
    /// Earliest start date of the subscription, ignoring lapses of 60 days
    /// or fewer.
    #[serde(default, with = "ts_milliseconds_option")]
    pub recent_subscription_start_date: Option<DateTime<Utc>>,
    /// When the most recent subscription purchase expires.
    #[serde(default, with = "ts_milliseconds_option")]
    pub renewal_date: Option<DateTime<Utc>>,
    /// The renewal price, in milliunits.
    pub renewal_price: Option<i64>,
    /// When the App Store signed the JWS data.
    #[serde(with = "ts_milliseconds")]
    pub signed_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AutoRenewStatus {
    /// Automatic renewal is off.
    Off = 0,
    /// Automatic renewal is on.
    On = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ExpirationIntent {
    /// The customer canceled their subscription.
    VoluntaryCancellation = 1,
    /// Billing error, for example stale payment information.
    BillingError = 2,
    /// The customer didn't consent to a price increase requiring consent.
    PriceIncreaseDecline = 3,
    /// The product wasn't available for purchase at renewal time.
    ProductUnavailable = 4,
    /// Some other reason.
    Other = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PriceIncreaseStatus {
    /// The customer hasn't responded to a price increase requiring consent.
    NoActionTaken = 0,
    /// The customer consented, or the increase doesn't require consent.
    CustomerConsented = 1,
}

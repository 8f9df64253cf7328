use serde::Serialize;
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{
    environment::Environment, renewal_info_payload::JwsRenewalInfoDecodedPayload,
    transaction_payload::JwsTransactionDecodedPayload, unverified::Unverified,
};

/// All subscription statuses for a customer, grouped by subscription group.
///
/// https://developer.apple.com/documentation/appstoreserverapi/statusresponse
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusPage {
    pub environment: Environment,
    pub bundle_id: String,
    pub app_apple_id: Option<u64>,
    pub groups: Vec<SubscriptionGroupStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionGroupStatus {
    pub subscription_group_identifier: String,
    pub last_transactions: Vec<SubscriptionLastTransaction>,
}

/// The most recent transaction of one subscription, with its renewal state.
///
/// `transaction` went through the full verifier. `renewal_info` comes from
/// the lightweight decode path and is therefore wrapped in [`Unverified`];
/// treat it as advisory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLastTransaction {
    pub status: SubscriptionStatus,
    pub original_transaction_id: String,
    pub transaction: JwsTransactionDecodedPayload,
    pub renewal_info: Option<Unverified<JwsRenewalInfoDecodedPayload>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SubscriptionStatus {
    /// The subscription is active.
    Active = 1,
    /// The subscription is expired.
    Expired = 2,
    /// The subscription is in a billing retry period.
    BillingRetry = 3,
    /// The subscription is in a billing grace period.
    BillingGracePeriod = 4,
    /// The subscription is revoked.
    Revoked = 5,
}

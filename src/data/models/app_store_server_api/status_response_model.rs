#![allow(dead_code)]

use serde::Deserialize;

use crate::domain::entities::{
    environment::Environment, subscription_status::SubscriptionStatus,
};

type JwsTransaction = String;
type JwsRenewalInfo = String;

/// Response envelope of the Get All Subscription Statuses endpoint.
///
/// https://developer.apple.com/documentation/appstoreserverapi/statusresponse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusResponseModel {
    pub(crate) environment: Environment,
    pub(crate) bundle_id: String,
    pub(crate) app_apple_id: Option<u64>,
    #[serde(default)]
    pub(crate) data: Vec<SubscriptionGroupIdentifierItemModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionGroupIdentifierItemModel {
    pub(crate) subscription_group_identifier: String,
    #[serde(default)]
    pub(crate) last_transactions: Vec<LastTransactionsItemModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LastTransactionsItemModel {
    pub(crate) status: SubscriptionStatus,
    pub(crate) original_transaction_id: String,
    /// Signed transaction info, in JWS format. Untrusted until verified.
    pub(crate) signed_transaction_info: JwsTransaction,
    /// Signed renewal info, in JWS format. Decoded through the lightweight
    /// path only.
    pub(crate) signed_renewal_info: Option<JwsRenewalInfo>,
}

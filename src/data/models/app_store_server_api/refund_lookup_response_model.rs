#![allow(dead_code)]

use serde::Deserialize;

type JwsTransaction = String;

/// Response envelope of the Get Refund History (v2) endpoint.
///
/// https://developer.apple.com/documentation/appstoreserverapi/refundhistoryresponse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefundLookupResponseModel {
    pub(crate) revision: Option<String>,
    #[serde(default)]
    pub(crate) has_more: bool,
    /// Refunded transactions, signed by Apple, in JWS format.
    #[serde(default)]
    pub(crate) signed_transactions: Vec<JwsTransaction>,
}

#![allow(dead_code)]

use serde::Deserialize;

use crate::domain::entities::environment::Environment;

type JwsTransaction = String;

/// Response envelope of the Get Transaction History endpoint.
///
/// https://developer.apple.com/documentation/appstoreserverapi/historyresponse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryResponseModel {
    /// Token to request the next page; echo it back in `revision`.
    pub(crate) revision: Option<String>,
    #[serde(default)]
    pub(crate) has_more: bool,
    pub(crate) bundle_id: String,
    pub(crate) app_apple_id: Option<u64>,
    pub(crate) environment: Environment,
    /// Signed transactions, in JWS format. Each is untrusted until verified.
    #[serde(default)]
    pub(crate) signed_transactions: Vec<JwsTransaction>,
}

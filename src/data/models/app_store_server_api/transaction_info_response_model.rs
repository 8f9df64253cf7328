#![allow(dead_code)]

use serde::Deserialize;

type JwsTransaction = String;

/// Response envelope of the Get Transaction Info endpoint.
///
/// https://developer.apple.com/documentation/appstoreserverapi/transactioninforesponse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionInfoResponseModel {
    /// The customer's in-app purchase transaction, signed by Apple, in JWS
    /// format. Untrusted until verified.
    pub(crate) signed_transaction_info: JwsTransaction,
}

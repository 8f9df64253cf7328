use serde::Serialize;

use super::{environment::Environment, transaction_payload::JwsTransactionDecodedPayload};

/// One page of a customer's transaction history, with every signed
/// transaction the relay could verify and decode.
///
/// Decoding is best-effort per item: a payload that fails verification is
/// dropped from `transactions` (and logged), so a single bad entry does not
/// fail the whole page. `revision` feeds the next page request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistoryPage {
    pub revision: Option<String>,
    pub has_more: bool,
    pub bundle_id: String,
    pub environment: Environment,
    pub transactions: Vec<JwsTransactionDecodedPayload>,
}

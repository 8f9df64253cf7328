use serde::Serialize;

use super::transaction_payload::JwsTransactionDecodedPayload;

/// One page of refunded transactions for a customer.
///
/// Same best-effort decoding policy as
/// [`super::transaction_history::TransactionHistoryPage`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundHistoryPage {
    pub revision: Option<String>,
    pub has_more: bool,
    pub transactions: Vec<JwsTransactionDecodedPayload>,
}

use async_trait::async_trait;

use crate::{
    domain::entities::{
        refund_history::RefundHistoryPage,
        subscription_status::SubscriptionStatusPage,
        test_notification::{TestNotificationStatus, TestNotificationToken},
        transaction_history::TransactionHistoryPage,
        transaction_payload::JwsTransactionDecodedPayload,
    },
    errors::RelayError,
};

/// The relay's operation surface: each call signs a fresh client
/// assertion, dispatches to the App Store Server API, and verifies/decodes
/// the signed payloads in the response.
///
/// Operations within one call run strictly in that order; concurrent calls
/// share nothing but the read-only signing identity and trust store.
#[async_trait]
pub trait StoreKitRepository: Send + Sync {
    /// Looks up and verifies a single transaction.
    async fn transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransactionDecodedPayload, RelayError>;

    /// Fetches one page of the customer's transaction history, verifying
    /// each entry best-effort.
    async fn transaction_history(
        &self,
        original_transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<TransactionHistoryPage, RelayError>;

    /// Fetches all subscription statuses for the customer. Verification
    /// and dispatch failures propagate; they are never silently dropped.
    async fn subscription_statuses(
        &self,
        transaction_id: &str,
    ) -> Result<SubscriptionStatusPage, RelayError>;

    /// Fetches one page of refunded transactions, verifying each entry
    /// best-effort.
    async fn refund_history(
        &self,
        transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<RefundHistoryPage, RelayError>;

    /// Asks the App Store to send a test server notification.
    async fn send_test_notification(&self) -> Result<TestNotificationToken, RelayError>;

    /// Polls the delivery status of a previously requested test
    /// notification and verifies its signed payload.
    async fn test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<TestNotificationStatus, RelayError>;
}

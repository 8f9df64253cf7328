use crate::{
    config::RelayConfig,
    data::{
        datasources::app_store_server_api_datasource::AppStoreServerApiDatasourceImpl,
        repositories::storekit_repository_impl::StoreKitRepositoryImpl,
    },
    domain::{
        entities::{
            refund_history::RefundHistoryPage,
            subscription_status::SubscriptionStatusPage,
            test_notification::{TestNotificationStatus, TestNotificationToken},
            transaction_history::TransactionHistoryPage,
            transaction_payload::JwsTransactionDecodedPayload,
        },
        repositories::storekit_repository::StoreKitRepository,
    },
    errors::RelayError,
};

/// Public entry point of the relay core.
///
/// Construct one at process start with [`StoreKitRelay::new`] and share it
/// across requests; everything inside is immutable after construction. The
/// routing layer maps method+path+params onto these calls and wraps the
/// typed results/errors into its response envelope
/// (see [`RelayError::http_status`]).
pub struct StoreKitRelay<R: StoreKitRepository> {
    repository: R,
}

impl<R: StoreKitRepository> StoreKitRelay<R> {
    pub async fn transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransactionDecodedPayload, RelayError> {
        self.repository.transaction_info(transaction_id).await
    }

    pub async fn transaction_history(
        &self,
        original_transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<TransactionHistoryPage, RelayError> {
        self.repository.transaction_history(original_transaction_id, revision).await
    }

    pub async fn subscription_statuses(
        &self,
        transaction_id: &str,
    ) -> Result<SubscriptionStatusPage, RelayError> {
        self.repository.subscription_statuses(transaction_id).await
    }

    pub async fn refund_history(
        &self,
        transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<RefundHistoryPage, RelayError> {
        self.repository.refund_history(transaction_id, revision).await
    }

    pub async fn send_test_notification(&self) -> Result<TestNotificationToken, RelayError> {
        self.repository.send_test_notification().await
    }

    pub async fn test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<TestNotificationStatus, RelayError> {
        self.repository.test_notification_status(test_notification_token).await
    }
}

impl StoreKitRelay<StoreKitRepositoryImpl<AppStoreServerApiDatasourceImpl>> {
    /// Wires the default implementation from configuration. Fails fast on
    /// any missing/invalid configuration, unreadable key, or unloadable
    /// trust root; a relay that constructs successfully is ready to serve.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        Ok(Self { repository: StoreKitRepositoryImpl::new(config)? })
    }
}

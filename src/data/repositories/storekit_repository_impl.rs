use async_trait::async_trait;
use chrono::Utc;
use log::warn;

use crate::{
    config::RelayConfig,
    data::datasources::{
        app_store_server_api_datasource::{
            AppStoreServerApiDatasource, AppStoreServerApiDatasourceImpl,
        },
        assertion_signer::{self, BearerAssertion, SigningIdentity},
        decode_unverified_payload,
        signed_data_verifier::SignedDataVerifier,
        trust_store::TrustStore,
    },
    domain::{
        entities::{
            refund_history::RefundHistoryPage,
            subscription_status::{
                SubscriptionGroupStatus, SubscriptionLastTransaction, SubscriptionStatusPage,
            },
            test_notification::{TestNotificationStatus, TestNotificationToken},
            transaction_history::TransactionHistoryPage,
            transaction_payload::JwsTransactionDecodedPayload,
            unverified::Unverified,
        },
        repositories::storekit_repository::StoreKitRepository,
    },
    errors::RelayError,
};

/// Orchestrates the signer, dispatcher and verifier into the relay's
/// operations.
///
/// Holds the two process-scoped read-only singletons (signing identity via
/// value, trust store via the verifier) and nothing mutable, so one
/// instance serves any number of concurrent requests.
pub(crate) struct StoreKitRepositoryImpl<D: AppStoreServerApiDatasource> {
    identity: SigningIdentity,
    datasource: D,
    verifier: SignedDataVerifier,
}

impl StoreKitRepositoryImpl<AppStoreServerApiDatasourceImpl> {
    /// Performs all startup work: reads the private key, builds the
    /// signing identity, loads (or reuses) the pinned trust store, and
    /// constructs the HTTP client. Any failure here prevents serving.
    pub(crate) fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let key_pem = std::fs::read(&config.private_key_path).map_err(|e| {
            RelayError::Configuration(format!(
                "could not read private key at '{}': {e}",
                config.private_key_path.display()
            ))
        })?;
        let identity = SigningIdentity::from_pem(
            &config.issuer_id,
            &config.key_id,
            &config.bundle_id,
            &key_pem,
        )?;
        let trust_store = TrustStore::shared(&config.root_ca_paths)?;
        let verifier = SignedDataVerifier::new(
            trust_store,
            config.environment.clone(),
            config.bundle_id.clone(),
            config.enable_online_checks,
        )?;
        let datasource = AppStoreServerApiDatasourceImpl::new(&config.environment)?;
        Ok(Self { identity, datasource, verifier })
    }
}

impl<D: AppStoreServerApiDatasource> StoreKitRepositoryImpl<D> {
    #[cfg(test)]
    pub(crate) fn with_parts(
        identity: SigningIdentity,
        datasource: D,
        verifier: SignedDataVerifier,
    ) -> Self {
        Self { identity, datasource, verifier }
    }

    /// A fresh assertion per call; never cached, never shared.
    fn bearer(&self) -> Result<BearerAssertion, RelayError> {
        assertion_signer::sign(&self.identity, Utc::now())
    }

    /// Best-effort decode of a page of signed transactions: entries that
    /// fail verification are dropped and logged, the page survives.
    async fn decode_transactions(
        &self,
        operation: &'static str,
        signed_transactions: &[String],
    ) -> Vec<JwsTransactionDecodedPayload> {
        let mut decoded = Vec::with_capacity(signed_transactions.len());
        for signed in signed_transactions {
            match self.verifier.verify_and_decode_transaction(signed).await {
                Ok(transaction) => decoded.push(transaction),
                Err(e) => warn!("{operation}: dropping undecodable signed transaction: {e}"),
            }
        }
        decoded
    }
}

#[async_trait]
impl<D: AppStoreServerApiDatasource> StoreKitRepository for StoreKitRepositoryImpl<D> {
    async fn transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransactionDecodedPayload, RelayError> {
        let bearer = self.bearer()?;
        let response = self.datasource.get_transaction_info(&bearer, transaction_id).await?;
        self.verifier.verify_and_decode_transaction(&response.signed_transaction_info).await
    }

    async fn transaction_history(
        &self,
        original_transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<TransactionHistoryPage, RelayError> {
        let bearer = self.bearer()?;
        let response = self
            .datasource
            .get_transaction_history(&bearer, original_transaction_id, revision)
            .await?;
        let transactions = self
            .decode_transactions("GetTransactionHistory", &response.signed_transactions)
            .await;
        Ok(TransactionHistoryPage {
            revision: response.revision,
            has_more: response.has_more,
            bundle_id: response.bundle_id,
            environment: response.environment,
            transactions,
        })
    }

    async fn subscription_statuses(
        &self,
        transaction_id: &str,
    ) -> Result<SubscriptionStatusPage, RelayError> {
        let bearer = self.bearer()?;
        let response =
            self.datasource.get_all_subscription_statuses(&bearer, transaction_id).await?;

        let mut groups = Vec::with_capacity(response.data.len());
        for group in response.data {
            let mut last_transactions = Vec::with_capacity(group.last_transactions.len());
            for item in group.last_transactions {
                // Transaction info goes through the full verifier; a
                // failure here is a real error and propagates.
                let transaction = self
                    .verifier
                    .verify_and_decode_transaction(&item.signed_transaction_info)
                    .await?;
                // Renewal info takes the lightweight decode path and stays
                // marked as unverified all the way to the caller.
                let renewal_info = item
                    .signed_renewal_info
                    .as_deref()
                    .map(decode_unverified_payload)
                    .transpose()?
                    .map(Unverified::new);
                last_transactions.push(SubscriptionLastTransaction {
                    status: item.status,
                    original_transaction_id: item.original_transaction_id,
                    transaction,
                    renewal_info,
                });
            }
            groups.push(SubscriptionGroupStatus {
                subscription_group_identifier: group.subscription_group_identifier,
                last_transactions,
            });
        }
        Ok(SubscriptionStatusPage {
            environment: response.environment,
            bundle_id: response.bundle_id,
            app_apple_id: response.app_apple_id,
            groups,
        })
    }

    async fn refund_history(
        &self,
        transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<RefundHistoryPage, RelayError> {
        let bearer = self.bearer()?;
        let response =
            self.datasource.get_refund_history(&bearer, transaction_id, revision).await?;
        let transactions =
            self.decode_transactions("GetRefundHistory", &response.signed_transactions).await;
        Ok(RefundHistoryPage {
            revision: response.revision,
            has_more: response.has_more,
            transactions,
        })
    }

    async fn send_test_notification(&self) -> Result<TestNotificationToken, RelayError> {
        let bearer = self.bearer()?;
        let response = self.datasource.request_test_notification(&bearer).await?;
        Ok(TestNotificationToken { test_notification_token: response.test_notification_token })
    }

    async fn test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<TestNotificationStatus, RelayError> {
        let bearer = self.bearer()?;
        let response = self
            .datasource
            .get_test_notification_status(&bearer, test_notification_token)
            .await?;
        let payload =
            self.verifier.verify_and_decode_notification(&response.signed_payload).await?;
        Ok(TestNotificationStatus { send_attempts: response.send_attempts, payload })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        data::models::app_store_server_api::{
            check_test_notification_response_model::CheckTestNotificationResponseModel,
            history_response_model::HistoryResponseModel,
            refund_lookup_response_model::RefundLookupResponseModel,
            send_test_notification_response_model::SendTestNotificationResponseModel,
            status_response_model::{
                LastTransactionsItemModel, StatusResponseModel,
                SubscriptionGroupIdentifierItemModel,
            },
            transaction_info_response_model::TransactionInfoResponseModel,
        },
        domain::entities::{
            environment::Environment, subscription_status::SubscriptionStatus,
        },
        test_utils::{ec_p256_private_key_pem, TestPki},
    };

    const BUNDLE_ID: &str = "com.example.app";

    /// Canned datasource: returns the signed payloads it was constructed
    /// with, no network involved.
    struct StubDatasource {
        signed_transaction: String,
        signed_history: Vec<String>,
        signed_renewal_info: Option<String>,
    }

    #[async_trait]
    impl AppStoreServerApiDatasource for StubDatasource {
        async fn get_transaction_info(
            &self,
            _bearer: &BearerAssertion,
            _transaction_id: &str,
        ) -> Result<TransactionInfoResponseModel, RelayError> {
            Ok(TransactionInfoResponseModel {
                signed_transaction_info: self.signed_transaction.clone(),
            })
        }

        async fn get_transaction_history(
            &self,
            _bearer: &BearerAssertion,
            _original_transaction_id: &str,
            _revision: Option<&str>,
        ) -> Result<HistoryResponseModel, RelayError> {
            Ok(HistoryResponseModel {
                revision: Some("next-page".to_string()),
                has_more: true,
                bundle_id: BUNDLE_ID.to_string(),
                app_apple_id: None,
                environment: Environment::Sandbox,
                signed_transactions: self.signed_history.clone(),
            })
        }

        async fn get_all_subscription_statuses(
            &self,
            _bearer: &BearerAssertion,
            transaction_id: &str,
        ) -> Result<StatusResponseModel, RelayError> {
            Ok(StatusResponseModel {
                environment: Environment::Sandbox,
                bundle_id: BUNDLE_ID.to_string(),
                app_apple_id: Some(123_456_789),
                data: vec![SubscriptionGroupIdentifierItemModel {
                    subscription_group_identifier: "21000001".to_string(),
                    last_transactions: vec![LastTransactionsItemModel {
                        status: SubscriptionStatus::Active,
                        original_transaction_id: transaction_id.to_string(),
                        signed_transaction_info: self.signed_transaction.clone(),
                        signed_renewal_info: self.signed_renewal_info.clone(),
                    }],
                }],
            })
        }

        async fn get_refund_history(
            &self,
            _bearer: &BearerAssertion,
            _transaction_id: &str,
            _revision: Option<&str>,
        ) -> Result<RefundLookupResponseModel, RelayError> {
            Ok(RefundLookupResponseModel {
                revision: None,
                has_more: false,
                signed_transactions: self.signed_history.clone(),
            })
        }

        async fn request_test_notification(
            &self,
            _bearer: &BearerAssertion,
        ) -> Result<SendTestNotificationResponseModel, RelayError> {
            Ok(SendTestNotificationResponseModel {
                test_notification_token: "token-1".to_string(),
            })
        }

        async fn get_test_notification_status(
            &self,
            _bearer: &BearerAssertion,
            _token: &str,
        ) -> Result<CheckTestNotificationResponseModel, RelayError> {
            Ok(CheckTestNotificationResponseModel {
                signed_payload: self.signed_transaction.clone(),
                send_attempts: vec![],
            })
        }
    }

    fn repository(
        pki: &TestPki,
        datasource: StubDatasource,
    ) -> StoreKitRepositoryImpl<StubDatasource> {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.der");
        std::fs::write(&root, pki.root_der()).unwrap();
        let trust_store = Arc::new(TrustStore::load(&[root]).unwrap());
        let verifier = SignedDataVerifier::new(
            trust_store,
            Environment::Sandbox,
            BUNDLE_ID.to_string(),
            false,
        )
        .unwrap();
        let identity =
            SigningIdentity::from_pem("issuer", "key", BUNDLE_ID, &ec_p256_private_key_pem())
                .unwrap();
        StoreKitRepositoryImpl::with_parts(identity, datasource, verifier)
    }

    fn renewal_claims() -> serde_json::Value {
        serde_json::json!({
            "autoRenewProductId": "com.example.app.premium",
            "autoRenewStatus": 1,
            "environment": "Sandbox",
            "productId": "com.example.app.premium",
            "signedDate": 1_698_148_900_000u64,
        })
    }

    #[tokio::test]
    async fn transaction_info_signs_dispatches_and_verifies() {
        let pki = TestPki::new();
        let signed =
            pki.sign_jws(&TestPki::transaction_claims("1000000900000001", BUNDLE_ID, "Sandbox"));
        let repo = repository(
            &pki,
            StubDatasource {
                signed_transaction: signed,
                signed_history: vec![],
                signed_renewal_info: None,
            },
        );

        let decoded = repo.transaction_info("1000000900000001").await.unwrap();
        assert_eq!(decoded.transaction_id, "1000000900000001");
        assert_eq!(decoded.environment, Environment::Sandbox);
    }

    #[tokio::test]
    async fn history_drops_only_the_malformed_entry() {
        let pki = TestPki::new();
        let good = |id: &str| pki.sign_jws(&TestPki::transaction_claims(id, BUNDLE_ID, "Sandbox"));
        let repo = repository(
            &pki,
            StubDatasource {
                signed_transaction: good("1"),
                signed_history: vec![good("1"), "broken.jws".to_string(), good("3")],
                signed_renewal_info: None,
            },
        );

        let page = repo.transaction_history("1", None).await.unwrap();
        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.transactions[0].transaction_id, "1");
        assert_eq!(page.transactions[1].transaction_id, "3");
        assert_eq!(page.revision.as_deref(), Some("next-page"));
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn subscription_statuses_separate_verified_from_unverified() {
        let pki = TestPki::new();
        let signed = pki.sign_jws(&TestPki::transaction_claims("1", BUNDLE_ID, "Sandbox"));
        // Renewal info is only base64-decoded, so any well-formed JWS-shaped
        // string works; no trusted chain needed.
        let renewal = pki.sign_jws(&renewal_claims());
        let repo = repository(
            &pki,
            StubDatasource {
                signed_transaction: signed,
                signed_history: vec![],
                signed_renewal_info: Some(renewal),
            },
        );

        let page = repo.subscription_statuses("1").await.unwrap();
        assert_eq!(page.bundle_id, BUNDLE_ID);
        let last = &page.groups[0].last_transactions[0];
        assert_eq!(last.status, SubscriptionStatus::Active);
        assert_eq!(last.transaction.transaction_id, "1");
        let renewal = last.renewal_info.as_ref().unwrap().as_untrusted();
        assert_eq!(renewal.auto_renew_product_id, "com.example.app.premium");
    }

    #[tokio::test]
    async fn subscription_statuses_propagate_verification_failures() {
        // The transaction info inside the status page is signed by an
        // unpinned chain; the whole call must fail, not quietly succeed.
        let trusted = TestPki::new();
        let hostile = TestPki::new();
        let signed = hostile.sign_jws(&TestPki::transaction_claims("1", BUNDLE_ID, "Sandbox"));
        let repo = repository(
            &trusted,
            StubDatasource {
                signed_transaction: signed,
                signed_history: vec![],
                signed_renewal_info: None,
            },
        );

        assert!(matches!(
            repo.subscription_statuses("1").await,
            Err(RelayError::UntrustedSigner(_))
        ));
    }

    #[tokio::test]
    async fn test_notification_round_trip() {
        let pki = TestPki::new();
        let notification = serde_json::json!({
            "notificationType": "TEST",
            "notificationUUID": "002e14d5-51f5-4503-b5a8-c3a1af68eb20",
            "version": "2.0",
            "signedDate": 1_698_148_900_000u64,
        });
        let repo = repository(
            &pki,
            StubDatasource {
                signed_transaction: pki.sign_jws(&notification),
                signed_history: vec![],
                signed_renewal_info: None,
            },
        );

        let token = repo.send_test_notification().await.unwrap();
        assert_eq!(token.test_notification_token, "token-1");

        let status = repo.test_notification_status(&token.test_notification_token).await.unwrap();
        assert_eq!(status.payload.notification_type, "TEST");
    }
}

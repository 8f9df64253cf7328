use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;

use crate::{
    data::{
        datasources::assertion_signer::BearerAssertion,
        models::app_store_server_api::{
            check_test_notification_response_model::CheckTestNotificationResponseModel,
            error_response_model::ErrorResponseModel,
            history_response_model::HistoryResponseModel,
            refund_lookup_response_model::RefundLookupResponseModel,
            send_test_notification_response_model::SendTestNotificationResponseModel,
            status_response_model::StatusResponseModel,
            transaction_info_response_model::TransactionInfoResponseModel,
        },
    },
    domain::entities::environment::Environment,
    errors::RelayError,
};

const PRODUCTION_BASE_URL: &str = "https://api.storekit.itunes.apple.com";
const SANDBOX_BASE_URL: &str = "https://api.storekit-sandbox.itunes.apple.com";

/// Applies to every outbound call, end to end.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound dispatcher for the App Store Server API.
///
/// The dispatcher owns transport concerns only: attaching the bearer
/// assertion, the fixed request timeout, and normalizing transport/HTTP
/// failures into the error taxonomy. It returns raw response envelopes;
/// signed payloads inside them are someone else's problem.
#[async_trait]
pub(crate) trait AppStoreServerApiDatasource: Send + Sync {
    /// Get Transaction Info:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_transaction_info
    async fn get_transaction_info(
        &self,
        bearer: &BearerAssertion,
        transaction_id: &str,
    ) -> Result<TransactionInfoResponseModel, RelayError>;

    /// Get Transaction History:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_transaction_history
    async fn get_transaction_history(
        &self,
        bearer: &BearerAssertion,
        original_transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<HistoryResponseModel, RelayError>;

    /// Get All Subscription Statuses:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_all_subscription_statuses
    async fn get_all_subscription_statuses(
        &self,
        bearer: &BearerAssertion,
        transaction_id: &str,
    ) -> Result<StatusResponseModel, RelayError>;

    /// Get Refund History (v2):
    /// https://developer.apple.com/documentation/appstoreserverapi/get_refund_history
    async fn get_refund_history(
        &self,
        bearer: &BearerAssertion,
        transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<RefundLookupResponseModel, RelayError>;

    /// Request a Test Notification:
    /// https://developer.apple.com/documentation/appstoreserverapi/request_a_test_notification
    async fn request_test_notification(
        &self,
        bearer: &BearerAssertion,
    ) -> Result<SendTestNotificationResponseModel, RelayError>;

    /// Get Test Notification Status:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_test_notification_status
    async fn get_test_notification_status(
        &self,
        bearer: &BearerAssertion,
        test_notification_token: &str,
    ) -> Result<CheckTestNotificationResponseModel, RelayError>;
}

pub(crate) struct AppStoreServerApiDatasourceImpl {
    client: reqwest::Client,
    base_url: &'static str,
}

impl AppStoreServerApiDatasourceImpl {
    /// The base endpoint is fixed here, once, from the configured
    /// environment. It is never chosen per request.
    pub(crate) fn new(environment: &Environment) -> Result<Self, RelayError> {
        let base_url = match environment {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Unknown(v) => {
                return Err(RelayError::Configuration(format!(
                    "cannot dispatch to unknown environment '{v}'"
                )))
            }
        };
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Configuration(format!("could not build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn request(&self, method: Method, path: &str, bearer: &BearerAssertion) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", bearer.token))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, RelayError> {
        debug!("dispatching {operation}");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::Timeout
            } else {
                RelayError::RemoteApi {
                    status_code: 500,
                    message: format!("{operation} failed to send: {e}"),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote_error(operation, status, &body));
        }

        response.json().await.map_err(|e| RelayError::RemoteApi {
            status_code: 500,
            message: format!("{operation} returned an unparsable response body: {e}"),
        })
    }
}

/// Normalizes a non-2xx remote response, keeping the remote status and the
/// best message the body offers.
fn remote_error(operation: &str, status: StatusCode, body: &str) -> RelayError {
    let message = ErrorResponseModel::message_from_body(body)
        .unwrap_or_else(|| format!("{operation} failed with status {status}"));
    RelayError::RemoteApi { status_code: status.as_u16(), message }
}

#[async_trait]
impl AppStoreServerApiDatasource for AppStoreServerApiDatasourceImpl {
    async fn get_transaction_info(
        &self,
        bearer: &BearerAssertion,
        transaction_id: &str,
    ) -> Result<TransactionInfoResponseModel, RelayError> {
        let request =
            self.request(Method::GET, &format!("/inApps/v1/transactions/{transaction_id}"), bearer);
        self.dispatch(request, "GetTransactionInfo").await
    }

    async fn get_transaction_history(
        &self,
        bearer: &BearerAssertion,
        original_transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<HistoryResponseModel, RelayError> {
        let mut request =
            self.request(Method::GET, &format!("/inApps/v1/history/{original_transaction_id}"), bearer);
        if let Some(revision) = revision {
            request = request.query(&[("revision", revision)]);
        }
        self.dispatch(request, "GetTransactionHistory").await
    }

    async fn get_all_subscription_statuses(
        &self,
        bearer: &BearerAssertion,
        transaction_id: &str,
    ) -> Result<StatusResponseModel, RelayError> {
        let request =
            self.request(Method::GET, &format!("/inApps/v1/subscriptions/{transaction_id}"), bearer);
        self.dispatch(request, "GetAllSubscriptionStatuses").await
    }

    async fn get_refund_history(
        &self,
        bearer: &BearerAssertion,
        transaction_id: &str,
        revision: Option<&str>,
    ) -> Result<RefundLookupResponseModel, RelayError> {
        let mut request = self.request(
            Method::GET,
            &format!("/inApps/v2/refund/lookup/{transaction_id}"),
            bearer,
        );
        if let Some(revision) = revision {
            request = request.query(&[("revision", revision)]);
        }
        self.dispatch(request, "GetRefundHistory").await
    }

    async fn request_test_notification(
        &self,
        bearer: &BearerAssertion,
    ) -> Result<SendTestNotificationResponseModel, RelayError> {
        let request = self.request(Method::POST, "/inApps/v1/notifications/test", bearer);
        self.dispatch(request, "RequestTestNotification").await
    }

    async fn get_test_notification_status(
        &self,
        bearer: &BearerAssertion,
        test_notification_token: &str,
    ) -> Result<CheckTestNotificationResponseModel, RelayError> {
        let request = self.request(
            Method::GET,
            &format!("/inApps/v1/notifications/test/{test_notification_token}"),
            bearer,
        );
        self.dispatch(request, "GetTestNotificationStatus").await
    }
}

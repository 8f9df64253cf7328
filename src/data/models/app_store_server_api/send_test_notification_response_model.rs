#![allow(dead_code)]

use serde::Deserialize;

/// Response envelope of the Request a Test Notification endpoint.
///
/// https://developer.apple.com/documentation/appstoreserverapi/sendtestnotificationresponse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendTestNotificationResponseModel {
    /// Uniquely identifies the requested test notification.
    pub(crate) test_notification_token: String,
}

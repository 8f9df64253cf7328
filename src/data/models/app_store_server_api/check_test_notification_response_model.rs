#![allow(dead_code)]

use serde::Deserialize;

use crate::domain::entities::test_notification::SendAttempt;

type JwsNotification = String;

/// Response envelope of the Get Test Notification Status endpoint.
///
/// https://developer.apple.com/documentation/appstoreserverapi/checktestnotificationresponse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckTestNotificationResponseModel {
    /// The signed notification payload, in JWS format. Untrusted until
    /// verified.
    pub(crate) signed_payload: JwsNotification,
    #[serde(default)]
    pub(crate) send_attempts: Vec<SendAttempt>,
}

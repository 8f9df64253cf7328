use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::{Deserialize, Serialize};

use super::environment::Environment;

/// Token identifying a requested test notification, used to poll its
/// delivery status afterwards.
///
/// https://developer.apple.com/documentation/appstoreserverapi/sendtestnotificationresponse
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNotificationToken {
    pub test_notification_token: String,
}

/// Delivery status of a test notification, with the verified decoded
/// notification payload the App Store signed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNotificationStatus {
    pub send_attempts: Vec<SendAttempt>,
    pub payload: NotificationPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAttempt {
    #[serde(default, with = "ts_milliseconds_option")]
    pub attempt_date: Option<DateTime<Utc>>,
    pub send_attempt_result: String,
}

/// Decoded claims of a version-2 App Store server notification.
///
/// https://developer.apple.com/documentation/appstoreservernotifications/responsebodyv2decodedpayload
///
/// The relay only requests and inspects TEST notifications, so the
/// notification type and subtype are kept as plain strings rather than the
/// full notification-type vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub notification_type: String,
    pub subtype: Option<String>,
    /// App metadata and signed transaction/renewal info, absent for TEST
    /// notifications' siblings that carry a summary instead.
    pub data: Option<NotificationData>,
    /// The notification version, "2.0".
    pub version: String,
    /// When the App Store signed the JWS data.
    #[serde(with = "ts_milliseconds")]
    pub signed_date: DateTime<Utc>,
    #[serde(rename = "notificationUUID")]
    pub notification_uuid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub app_apple_id: Option<u64>,
    pub bundle_id: String,
    pub bundle_version: Option<String>,
    pub environment: Environment,
    pub signed_transaction_info: Option<String>,
    pub signed_renewal_info: Option<String>,
}

#![allow(dead_code)]

use serde::Deserialize;

/// Error body shapes the remote service (or proxies in front of it) returns
/// on non-2xx responses.
///
/// The App Store Server API itself responds with `errorCode`/`errorMessage`
/// (https://developer.apple.com/documentation/appstoreserverapi/error_codes);
/// gateway layers commonly wrap errors as `{"error": {"message": ...}}`.
/// Both are normalized into one message for the error taxonomy.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorResponseModel {
    pub(crate) error_code: Option<i64>,
    pub(crate) error_message: Option<String>,
    pub(crate) error: Option<NestedErrorModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NestedErrorModel {
    pub(crate) message: Option<String>,
}

impl ErrorResponseModel {
    /// Best-effort extraction of a human-readable message from the raw
    /// response body. Never fails; an unparsable body yields `None`.
    pub(crate) fn message_from_body(body: &str) -> Option<String> {
        let parsed: ErrorResponseModel = serde_json::from_str(body).ok()?;
        parsed
            .error_message
            .or(parsed.error.and_then(|e| e.message))
            .filter(|m| !m.is_empty())
    }
}

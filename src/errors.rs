use thiserror::Error;

/// Error taxonomy for the relay core.
///
/// Verification failures (`MalformedPayload`, `UntrustedSigner`,
/// `RevokedCertificate`, `InvalidSignature`, `EnvironmentMismatch`) are
/// security-relevant and always propagate; they are never downgraded to a
/// success with empty data. Messages never contain key material.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid relay configuration. {0}")]
    Configuration(String),
    #[error("Could not produce a signed client assertion. {0}")]
    Signing(String),
    #[error("Could not load trusted root certificate from '{path}'. {reason}")]
    TrustLoad { path: String, reason: String },
    #[error("The request to the App Store Server API timed out.")]
    Timeout,
    #[error("App Store Server API returned an error. {message}")]
    RemoteApi { status_code: u16, message: String },
    #[error("Signed payload is malformed. {0}")]
    MalformedPayload(String),
    #[error("Signing certificate chain does not terminate at a pinned root. {0}")]
    UntrustedSigner(String),
    #[error("A certificate in the signing chain has been revoked.")]
    RevokedCertificate,
    #[error("Signed payload signature verification failed. {0}")]
    InvalidSignature(String),
    #[error("Signed payload does not match the expected environment or bundle id. {0}")]
    EnvironmentMismatch(String),
}

impl RelayError {
    /// HTTP status the (external) routing layer should respond with. The
    /// relay itself never builds responses; this keeps the mapping in one
    /// place so the envelope layer stays dumb.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Configuration(_) | Self::Signing(_) | Self::TrustLoad { .. } => 500,
            Self::Timeout => 504,
            Self::RemoteApi { status_code, .. } => *status_code,
            Self::MalformedPayload(_) => 400,
            Self::UntrustedSigner(_)
            | Self::RevokedCertificate
            | Self::InvalidSignature(_)
            | Self::EnvironmentMismatch(_) => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_api_errors_keep_the_remote_status() {
        let err = RelayError::RemoteApi { status_code: 404, message: "Transaction not found".into() };
        assert_eq!(err.http_status(), 404);
        assert!(err.to_string().contains("Transaction not found"));
    }

    #[test]
    fn verification_failures_map_to_client_errors() {
        assert_eq!(RelayError::MalformedPayload("x".into()).http_status(), 400);
        assert_eq!(RelayError::InvalidSignature("x".into()).http_status(), 403);
        assert_eq!(RelayError::RevokedCertificate.http_status(), 403);
        assert_eq!(RelayError::Timeout.http_status(), 504);
    }
}

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::errors::RelayError;

/// Exact lifetime of an outbound client assertion, per the App Store Server
/// API's authentication rules.
pub(crate) const ASSERTION_LIFETIME_SECS: i64 = 1200;

const ASSERTION_AUDIENCE: &str = "appstoreconnect-v1";

/// The process-scoped signing identity for outbound client assertions.
///
/// Constructed once at startup from configuration and passed by reference
/// into [`sign`]; immutable thereafter, so it is freely shared across
/// concurrent requests. The key material stays opaque inside
/// [`EncodingKey`] and is never logged or echoed in errors.
pub(crate) struct SigningIdentity {
    issuer_id: String,
    key_id: String,
    bundle_id: String,
    encoding_key: EncodingKey,
}

impl SigningIdentity {
    /// Builds the identity from a PKCS#8 EC private key in PEM form (the
    /// `.p8` file App Store Connect issues).
    ///
    /// Fails with `Configuration` when an identifier is empty and with
    /// `Signing` when the key is not usable for ES256.
    pub(crate) fn from_pem(
        issuer_id: &str,
        key_id: &str,
        bundle_id: &str,
        private_key_pem: &[u8],
    ) -> Result<Self, RelayError> {
        for (name, value) in
            [("issuer id", issuer_id), ("key id", key_id), ("bundle id", bundle_id)]
        {
            if value.trim().is_empty() {
                return Err(RelayError::Configuration(format!(
                    "signing identity is missing the {name}"
                )));
            }
        }
        let encoding_key = EncodingKey::from_ec_pem(private_key_pem).map_err(|e| {
            RelayError::Signing(format!("private key is not an ES256-compatible EC key: {e}"))
        })?;
        Ok(Self {
            issuer_id: issuer_id.to_owned(),
            key_id: key_id.to_owned(),
            bundle_id: bundle_id.to_owned(),
            encoding_key,
        })
    }
}

/// A short-lived bearer credential for one outbound call.
///
/// Request-scoped: each call signs a fresh assertion rather than caching
/// one, so an assertion can never be reused past its expiry window. Two
/// assertions signed at the same second carry identical claims but not
/// necessarily identical bytes (ECDSA is non-deterministic); callers must
/// only ever rely on claim equality.
#[derive(Debug, Clone)]
pub(crate) struct BearerAssertion {
    pub(crate) token: String,
    #[allow(dead_code)]
    pub(crate) issued_at: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
}

impl BearerAssertion {
    #[allow(dead_code)]
    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
    bid: &'a str,
}

/// Signs a fresh client assertion valid from `now` for exactly
/// [`ASSERTION_LIFETIME_SECS`].
///
/// The header pins `alg=ES256`, `kid` and `typ=JWT`; the algorithm is never
/// negotiated, so a mis-keyed identity fails here instead of producing a
/// token under a weaker algorithm.
pub(crate) fn sign(
    identity: &SigningIdentity,
    now: DateTime<Utc>,
) -> Result<BearerAssertion, RelayError> {
    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(identity.key_id.clone());

    let issued_at = now;
    let expires_at = now + Duration::seconds(ASSERTION_LIFETIME_SECS);
    let claims = AssertionClaims {
        iss: &identity.issuer_id,
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
        aud: ASSERTION_AUDIENCE,
        bid: &identity.bundle_id,
    };

    let token = jsonwebtoken::encode(&header, &claims, &identity.encoding_key)
        .map_err(|e| RelayError::Signing(format!("failed to sign client assertion: {e}")))?;
    Ok(BearerAssertion { token, issued_at, expires_at })
}

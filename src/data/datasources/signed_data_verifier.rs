use std::{sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use openssl::{
    bn::BigNum,
    ecdsa::EcdsaSig,
    hash::{hash, MessageDigest},
    nid::Nid,
    ocsp::{OcspCertId, OcspCertStatus, OcspRequest, OcspResponse, OcspResponseStatus},
    stack::Stack,
    x509::X509,
};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::{
    data::datasources::{
        trust_store::TrustStore,
        utils::{decode_segment, CompactJws},
    },
    domain::entities::{
        environment::Environment, test_notification::NotificationPayload,
        transaction_payload::JwsTransactionDecodedPayload,
    },
    errors::RelayError,
};

const OCSP_TIMEOUT: Duration = Duration::from_secs(10);

/// Verifies and decodes the signed payloads (JWS) the App Store Server API
/// returns.
///
/// Verification order: compact-form split, algorithm pinning, certificate
/// chain against the pinned roots, optional online revocation check, ECDSA
/// signature over `header.payload`, claims decoding, and finally the
/// mandatory environment/bundle-id cross-check. Claims are never surfaced
/// before every step has passed.
pub(crate) struct SignedDataVerifier {
    trust_store: Arc<TrustStore>,
    environment: Environment,
    bundle_id: String,
    enable_online_checks: bool,
    http: reqwest::Client,
}

/// The protected-header fields the verifier cares about.
#[derive(Debug, Deserialize)]
struct JwsHeaderModel {
    alg: String,
    x5c: Option<Vec<String>>,
}

impl SignedDataVerifier {
    pub(crate) fn new(
        trust_store: Arc<TrustStore>,
        environment: Environment,
        bundle_id: String,
        enable_online_checks: bool,
    ) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(OCSP_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Configuration(format!("could not build OCSP client: {e}")))?;
        debug!("verifier ready with {} pinned root(s)", trust_store.root_count());
        Ok(Self { trust_store, environment, bundle_id, enable_online_checks, http })
    }

    /// Verifies a signed transaction and decodes its claims.
    pub(crate) async fn verify_and_decode_transaction(
        &self,
        signed_transaction: &str,
    ) -> Result<JwsTransactionDecodedPayload, RelayError> {
        let claims = self.verified_claims(signed_transaction).await?;
        let payload: JwsTransactionDecodedPayload =
            serde_json::from_slice(&claims).map_err(|e| {
                RelayError::MalformedPayload(format!("failed to parse transaction claims: {e}"))
            })?;
        self.check_binding(&payload.environment, &payload.bundle_id)?;
        Ok(payload)
    }

    /// Verifies a signed server notification and decodes its claims.
    pub(crate) async fn verify_and_decode_notification(
        &self,
        signed_payload: &str,
    ) -> Result<NotificationPayload, RelayError> {
        let claims = self.verified_claims(signed_payload).await?;
        let payload: NotificationPayload = serde_json::from_slice(&claims).map_err(|e| {
            RelayError::MalformedPayload(format!("failed to parse notification claims: {e}"))
        })?;
        if let Some(data) = &payload.data {
            self.check_binding(&data.environment, &data.bundle_id)?;
        }
        Ok(payload)
    }

    /// Runs every check up to (but excluding) claims-shape validation and
    /// returns the raw claims bytes.
    async fn verified_claims(&self, data: &str) -> Result<Vec<u8>, RelayError> {
        let jws = CompactJws::split(data)?;
        let header: JwsHeaderModel = serde_json::from_slice(&decode_segment(jws.header)?)
            .map_err(|e| RelayError::MalformedPayload(format!("invalid JWS header: {e}")))?;

        // Algorithm pinning. Anything except ES256 is rejected before any
        // key material is even looked at.
        if header.alg != "ES256" {
            return Err(RelayError::InvalidSignature(format!(
                "payload is signed under '{}', expected ES256",
                header.alg
            )));
        }

        let chain = decode_x5c_chain(header.x5c.as_deref().unwrap_or_default())?;
        let Some(leaf) = chain.first() else {
            return Err(RelayError::UntrustedSigner(
                "header carries no signing certificate chain".to_string(),
            ));
        };
        let mut intermediates = Stack::new()
            .map_err(|e| RelayError::UntrustedSigner(e.to_string()))?;
        for cert in &chain[1..] {
            intermediates
                .push(cert.clone())
                .map_err(|e| RelayError::UntrustedSigner(e.to_string()))?;
        }
        self.trust_store
            .verify_chain(leaf, &intermediates)
            .map_err(RelayError::UntrustedSigner)?;

        if self.enable_online_checks {
            // Every certificate in the chain is consulted: each against
            // the issuer that follows it, and the last one against the
            // pinned root that signed it.
            for pair in chain.windows(2) {
                self.check_revocation(&pair[0], &pair[1]).await?;
            }
            if let Some(last) = chain.last() {
                if let Some(root) = self.trust_store.issuer_of(last) {
                    self.check_revocation(last, root).await?;
                }
            }
        }

        verify_es256_signature(&jws, leaf)?;
        decode_segment(jws.payload)
    }

    fn check_binding(
        &self,
        environment: &Environment,
        bundle_id: &str,
    ) -> Result<(), RelayError> {
        if *environment != self.environment {
            return Err(RelayError::EnvironmentMismatch(format!(
                "payload was issued for {environment:?}, relay expects {:?}",
                self.environment
            )));
        }
        if bundle_id != self.bundle_id {
            return Err(RelayError::EnvironmentMismatch(
                "payload bundle id does not match the configured bundle id".to_string(),
            ));
        }
        Ok(())
    }

    /// Asks a certificate's OCSP responder whether it has been revoked.
    /// Only a definitive REVOKED answer fails verification; an unreachable
    /// or inconclusive responder is logged and skipped, so an OCSP outage
    /// cannot take down payment verification.
    async fn check_revocation(&self, cert: &X509, issuer: &X509) -> Result<(), RelayError> {
        let Ok(responders) = cert.ocsp_responders() else {
            return Ok(());
        };
        let Some(url) = responders.iter().next().map(|u| u.to_string()) else {
            return Ok(());
        };
        let Ok(request_der) = build_ocsp_request(cert, issuer) else {
            debug!("could not build OCSP request; skipping revocation check");
            return Ok(());
        };
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/ocsp-request")
            .body(request_der)
            .send()
            .await;
        let Ok(response) = response else {
            debug!("OCSP responder {url} unreachable; skipping revocation check");
            return Ok(());
        };
        let Ok(body) = response.bytes().await else {
            return Ok(());
        };
        let Ok(parsed) = OcspResponse::from_der(&body) else {
            debug!("OCSP responder {url} returned an unparsable response");
            return Ok(());
        };
        if parsed.status() != OcspResponseStatus::SUCCESSFUL {
            return Ok(());
        }
        let (Ok(basic), Ok(cert_id)) =
            (parsed.basic(), OcspCertId::from_cert(MessageDigest::sha1(), cert, issuer))
        else {
            return Ok(());
        };
        if let Some(status) = basic.find_status(&cert_id) {
            if status.status == OcspCertStatus::REVOKED {
                return Err(RelayError::RevokedCertificate);
            }
        }
        Ok(())
    }
}

fn build_ocsp_request(
    cert: &X509,
    issuer: &X509,
) -> Result<Vec<u8>, openssl::error::ErrorStack> {
    let cert_id = OcspCertId::from_cert(MessageDigest::sha1(), cert, issuer)?;
    let mut request = OcspRequest::new()?;
    request.add_id(cert_id)?;
    request.to_der()
}

fn decode_x5c_chain(x5c: &[String]) -> Result<Vec<X509>, RelayError> {
    x5c.iter()
        .map(|encoded| {
            let der = STANDARD.decode(encoded).map_err(|e| {
                RelayError::MalformedPayload(format!("invalid x5c certificate encoding: {e}"))
            })?;
            X509::from_der(&der).map_err(|e| {
                RelayError::MalformedPayload(format!("invalid x5c certificate: {e}"))
            })
        })
        .collect()
}

/// Verifies the raw JOSE `r || s` signature over the signing input using
/// the leaf certificate's P-256 public key.
fn verify_es256_signature(jws: &CompactJws<'_>, leaf: &X509) -> Result<(), RelayError> {
    let public_key = leaf
        .public_key()
        .and_then(|k| k.ec_key())
        .map_err(|_| {
            RelayError::InvalidSignature("signing certificate does not hold an EC key".to_string())
        })?;
    if public_key.group().curve_name() != Some(Nid::X9_62_PRIME256V1) {
        return Err(RelayError::InvalidSignature(
            "signing certificate's key is not on the P-256 curve".to_string(),
        ));
    }

    let raw = decode_segment(jws.signature)?;
    if raw.len() != 64 {
        return Err(RelayError::InvalidSignature(format!(
            "ES256 signature must be 64 bytes, got {}",
            raw.len()
        )));
    }
    let r = BigNum::from_slice(&raw[..32])
        .map_err(|e| RelayError::InvalidSignature(e.to_string()))?;
    let s = BigNum::from_slice(&raw[32..])
        .map_err(|e| RelayError::InvalidSignature(e.to_string()))?;
    let signature = EcdsaSig::from_private_components(r, s)
        .map_err(|e| RelayError::InvalidSignature(e.to_string()))?;

    let digest = hash(MessageDigest::sha256(), jws.signing_input().as_bytes())
        .map_err(|e| RelayError::InvalidSignature(e.to_string()))?;
    match signature.verify(&digest, &public_key) {
        Ok(true) => Ok(()),
        Ok(false) => Err(RelayError::InvalidSignature(
            "signature does not match the signed content".to_string(),
        )),
        Err(e) => Err(RelayError::InvalidSignature(e.to_string())),
    }
}

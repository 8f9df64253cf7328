use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::de::DeserializeOwned;

use crate::errors::RelayError;

/// The three base64url segments of a compact JWS, still encoded. Splitting
/// is shared between the full verifier and the lightweight decode path.
pub(crate) struct CompactJws<'a> {
    pub(crate) header: &'a str,
    pub(crate) payload: &'a str,
    pub(crate) signature: &'a str,
}

impl<'a> CompactJws<'a> {
    pub(crate) fn split(data: &'a str) -> Result<Self, RelayError> {
        let mut segments = data.split('.');
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(header), Some(payload), Some(signature), None)
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                Ok(Self { header, payload, signature })
            }
            _ => Err(RelayError::MalformedPayload(
                "expected a compact JWS with exactly three segments".to_string(),
            )),
        }
    }

    /// The bytes the signature covers: `header || '.' || payload`, still
    /// base64url-encoded, per RFC 7515.
    pub(crate) fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

pub(crate) fn decode_segment(segment: &str) -> Result<Vec<u8>, RelayError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| RelayError::MalformedPayload(format!("invalid base64url segment: {e}")))
}

/// Decodes the claims of a JWS without any signature or certificate-chain
/// verification.
///
/// This is the lower-trust path: the output is only as trustworthy as the
/// transport it arrived over. Callers must wrap the result in
/// [`crate::domain::entities::unverified::Unverified`] before it leaves the
/// data layer.
pub(crate) fn decode_unverified_payload<T: DeserializeOwned>(data: &str) -> Result<T, RelayError> {
    let jws = CompactJws::split(data)?;
    let claims = decode_segment(jws.payload)?;
    serde_json::from_slice(&claims)
        .map_err(|e| RelayError::MalformedPayload(format!("failed to parse JWS claims: {e}")))
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Claims {
        sub: String,
    }

    fn fake_jws(claims: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.as_bytes());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn decodes_claims_without_verifying() {
        let claims: Claims = decode_unverified_payload(&fake_jws(r#"{"sub":"abc"}"#)).unwrap();
        assert_eq!(claims.sub, "abc");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for bad in ["onlyonesegment", "two.segments", "a.b.c.d", "..", "a..c"] {
            assert!(matches!(
                decode_unverified_payload::<Claims>(bad),
                Err(RelayError::MalformedPayload(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_base64_and_bad_json() {
        let bad_b64 = "aGVhZGVy.!!!not-base64!!!.c2ln";
        assert!(matches!(
            decode_unverified_payload::<Claims>(bad_b64),
            Err(RelayError::MalformedPayload(_))
        ));
        let bad_json = fake_jws("not json");
        assert!(matches!(
            decode_unverified_payload::<Claims>(&bad_json),
            Err(RelayError::MalformedPayload(_))
        ));
    }
}

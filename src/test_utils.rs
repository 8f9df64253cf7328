//! Throwaway PKI and key fixtures for unit tests. Everything here is
//! generated in-process per test; nothing touches real Apple material.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use openssl::{
    asn1::Asn1Time,
    bn::{BigNum, MsbOption},
    ec::{EcGroup, EcKey},
    ecdsa::EcdsaSig,
    hash::{hash, MessageDigest},
    nid::Nid,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{extension::BasicConstraints, X509Name, X509},
};

/// A fresh root CA plus a leaf signing certificate issued by it, mimicking
/// the chain embedded in App Store signed payloads (minus the intermediate,
/// which the verifier does not require).
pub(crate) struct TestPki {
    root_cert: X509,
    leaf_key: EcKey<Private>,
    leaf_cert: X509,
}

impl TestPki {
    pub(crate) fn new() -> Self {
        let root_key = p256_pkey();
        let root_name = name("Test Root CA");
        let root_cert = build_cert(&root_name, &root_name, &root_key, &root_key, true);

        let leaf_key = p256_key();
        let leaf_pkey = PKey::from_ec_key(leaf_key.clone()).unwrap();
        let leaf_name = name("Test Signing Leaf");
        let leaf_cert = build_cert(&leaf_name, &root_name, &leaf_pkey, &root_key, false);
        Self { root_cert, leaf_key, leaf_cert }
    }

    pub(crate) fn root_der(&self) -> Vec<u8> {
        self.root_cert.to_der().unwrap()
    }

    pub(crate) fn root_pem(&self) -> Vec<u8> {
        self.root_cert.to_pem().unwrap()
    }

    pub(crate) fn leaf_der(&self) -> Vec<u8> {
        self.leaf_cert.to_der().unwrap()
    }

    /// Signs `claims` as a compact JWS the way the App Store does: ES256
    /// with the certificate chain in the protected header's `x5c`.
    pub(crate) fn sign_jws(&self, claims: &serde_json::Value) -> String {
        let header = serde_json::json!({
            "alg": "ES256",
            "x5c": [
                STANDARD.encode(self.leaf_cert.to_der().unwrap()),
                STANDARD.encode(self.root_cert.to_der().unwrap()),
            ],
        });
        self.sign_jws_with_header(&header, claims)
    }

    /// Same, but with a caller-supplied protected header, for tests that
    /// need a broken or hostile header.
    pub(crate) fn sign_jws_with_header(
        &self,
        header: &serde_json::Value,
        claims: &serde_json::Value,
    ) -> String {
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).unwrap());
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        let signing_input = format!("{header_b64}.{payload_b64}");
        let digest = hash(MessageDigest::sha256(), signing_input.as_bytes()).unwrap();
        let sig = EcdsaSig::sign(&digest, &self.leaf_key).unwrap();
        let mut raw = sig.r().to_vec_padded(32).unwrap();
        raw.extend(sig.s().to_vec_padded(32).unwrap());
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(raw))
    }

    /// A plausible verified-transaction claim set for `bundle_id` in
    /// `environment` ("Sandbox" / "Production").
    pub(crate) fn transaction_claims(
        transaction_id: &str,
        bundle_id: &str,
        environment: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "transactionId": transaction_id,
            "originalTransactionId": transaction_id,
            "bundleId": bundle_id,
            "productId": "com.example.app.premium",
            "environment": environment,
            "purchaseDate": 1_698_148_900_000u64,
            "signedDate": 1_698_148_900_000u64,
            "quantity": 1,
            "type": "Auto-Renewable Subscription",
            "transactionReason": "PURCHASE",
        })
    }
}

pub(crate) fn ec_p256_private_key_pem() -> Vec<u8> {
    PKey::from_ec_key(p256_key()).unwrap().private_key_to_pem_pkcs8().unwrap()
}

pub(crate) fn rsa_private_key_pem() -> Vec<u8> {
    let rsa = Rsa::generate(2048).unwrap();
    PKey::from_rsa(rsa).unwrap().private_key_to_pem_pkcs8().unwrap()
}

fn p256_key() -> EcKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    EcKey::generate(&group).unwrap()
}

fn p256_pkey() -> PKey<Private> {
    PKey::from_ec_key(p256_key()).unwrap()
}

fn name(common_name: &str) -> X509Name {
    let mut builder = X509Name::builder().unwrap();
    builder.append_entry_by_text("CN", common_name).unwrap();
    builder.build()
}

fn random_serial() -> openssl::asn1::Asn1Integer {
    let mut serial = BigNum::new().unwrap();
    serial.rand(128, MsbOption::MAYBE_ZERO, false).unwrap();
    serial.to_asn1_integer().unwrap()
}

fn build_cert(
    subject: &X509Name,
    issuer: &X509Name,
    subject_key: &PKey<Private>,
    signing_key: &PKey<Private>,
    is_ca: bool,
) -> X509 {
    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&random_serial()).unwrap();
    builder.set_subject_name(subject).unwrap();
    builder.set_issuer_name(issuer).unwrap();
    builder.set_pubkey(subject_key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    if is_ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
    }
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

use std::{path::PathBuf, sync::Arc};

use log::debug;
use once_cell::sync::OnceCell;
use openssl::{
    stack::Stack,
    x509::{
        store::{X509Store, X509StoreBuilder},
        X509Ref, X509StoreContext, X509VerifyResult, X509,
    },
};

use crate::errors::RelayError;

static SHARED: OnceCell<Arc<TrustStore>> = OnceCell::new();

/// The pinned root certificates every signing chain must terminate at.
///
/// Loaded once at startup and read-only afterwards, so it can be shared
/// across concurrent verifications without locking.
pub(crate) struct TrustStore {
    store: X509Store,
    roots: Vec<X509>,
}

impl TrustStore {
    /// Loads the pinned roots from disk. All-or-nothing: any unreadable or
    /// unparsable file fails the whole load, naming the path. A partial
    /// trust store is worse than none.
    pub(crate) fn load(paths: &[PathBuf]) -> Result<Self, RelayError> {
        if paths.is_empty() {
            return Err(RelayError::TrustLoad {
                path: "<none>".to_string(),
                reason: "no root certificate paths were configured".to_string(),
            });
        }
        let mut builder = X509StoreBuilder::new().map_err(|e| RelayError::TrustLoad {
            path: "<store>".to_string(),
            reason: e.to_string(),
        })?;
        let mut roots = Vec::with_capacity(paths.len());
        for path in paths {
            let display = path.display().to_string();
            let bytes = std::fs::read(path).map_err(|e| RelayError::TrustLoad {
                path: display.clone(),
                reason: e.to_string(),
            })?;
            // Apple distributes its roots as DER `.cer` files; PEM is
            // accepted for operator convenience.
            let cert = X509::from_der(&bytes)
                .or_else(|_| X509::from_pem(&bytes))
                .map_err(|e| RelayError::TrustLoad {
                    path: display.clone(),
                    reason: format!("not a DER or PEM certificate: {e}"),
                })?;
            builder.add_cert(cert.clone()).map_err(|e| RelayError::TrustLoad {
                path: display,
                reason: e.to_string(),
            })?;
            roots.push(cert);
        }
        debug!("loaded {} pinned root certificate(s)", roots.len());
        Ok(Self { store: builder.build(), roots })
    }

    /// Process-wide cached load. The first successful call wins; later
    /// calls return the same store regardless of `paths`.
    pub(crate) fn shared(paths: &[PathBuf]) -> Result<Arc<Self>, RelayError> {
        SHARED.get_or_try_init(|| Self::load(paths).map(Arc::new)).cloned()
    }

    /// Whether `leaf`, helped by `intermediates`, chains up to one of the
    /// pinned roots. Returns the library's verification error string on
    /// failure so the caller can report which check failed.
    pub(crate) fn verify_chain(
        &self,
        leaf: &X509,
        intermediates: &Stack<X509>,
    ) -> Result<(), String> {
        let mut context = X509StoreContext::new().map_err(|e| e.to_string())?;
        let (passed, detail) = context
            .init(&self.store, leaf, intermediates, |c| {
                let passed = c.verify_cert()?;
                Ok((passed, c.error().error_string().to_string()))
            })
            .map_err(|e| e.to_string())?;
        if passed {
            Ok(())
        } else {
            Err(detail)
        }
    }

    /// The pinned root that issued `cert`, if any. Used to extend
    /// revocation checking to the certificate a pinned root signed
    /// directly, which has no issuer inside the presented chain.
    pub(crate) fn issuer_of(&self, cert: &X509Ref) -> Option<&X509> {
        self.roots.iter().find(|root| root.issued(cert) == X509VerifyResult::OK)
    }

    pub(crate) fn root_count(&self) -> usize {
        self.roots.len()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::test_utils::TestPki;

    #[test]
    fn missing_file_fails_naming_the_path() {
        let paths = vec![PathBuf::from("/definitely/not/here/AppleRootCA-G3.cer")];
        match TrustStore::load(&paths) {
            Err(RelayError::TrustLoad { path, .. }) => {
                assert!(path.contains("AppleRootCA-G3.cer"))
            }
            Err(other) => panic!("expected TrustLoad, got {other:?}"),
            Ok(_) => panic!("load unexpectedly succeeded"),
        }
    }

    #[test]
    fn load_is_all_or_nothing() {
        let pki = TestPki::new();
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("root.der");
        std::fs::write(&good, pki.root_der()).unwrap();
        let bad = dir.path().join("garbage.cer");
        let mut f = std::fs::File::create(&bad).unwrap();
        f.write_all(b"this is not a certificate").unwrap();

        assert!(TrustStore::load(&[good.clone()]).is_ok());
        match TrustStore::load(&[good, bad]) {
            Err(RelayError::TrustLoad { path, .. }) => assert!(path.contains("garbage.cer")),
            Err(other) => panic!("expected TrustLoad, got {other:?}"),
            Ok(_) => panic!("load unexpectedly succeeded"),
        }
    }

    #[test]
    fn issuer_lookup_matches_only_the_issuing_root() {
        let pki = TestPki::new();
        let stranger = TestPki::new();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.der");
        std::fs::write(&root, pki.root_der()).unwrap();
        let store = TrustStore::load(&[root]).unwrap();

        let leaf = X509::from_der(&pki.leaf_der()).unwrap();
        assert!(store.issuer_of(&leaf).is_some());
        let foreign_leaf = X509::from_der(&stranger.leaf_der()).unwrap();
        assert!(store.issuer_of(&foreign_leaf).is_none());
    }

    #[test]
    fn accepts_pem_as_well_as_der() {
        let pki = TestPki::new();
        let dir = tempfile::tempdir().unwrap();
        let pem = dir.path().join("root.pem");
        std::fs::write(&pem, pki.root_pem()).unwrap();
        let store = TrustStore::load(&[pem]).unwrap();
        assert_eq!(store.root_count(), 1);
    }
}

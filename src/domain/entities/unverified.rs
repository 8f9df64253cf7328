use serde::Serialize;

/// Marker wrapper for claims that were base64-decoded without signature or
/// certificate-chain verification.
///
/// Some response fields (renewal info in the subscription-status page) are
/// passed through the lightweight decode path rather than the full verifier.
/// Wrapping them forces call sites to acknowledge the lower trust level
/// before touching the claims; the type system keeps the two paths from
/// being confused.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Unverified<T>(T);

impl<T> Unverified<T> {
    pub(crate) fn new(claims: T) -> Self {
        Self(claims)
    }

    /// Surfaces the unverified claims. The name is deliberately loud.
    pub fn into_untrusted(self) -> T {
        self.0
    }

    /// Borrowing variant of [`Self::into_untrusted`].
    pub fn as_untrusted(&self) -> &T {
        &self.0
    }
}

//! Per-request CSP nonces.
//!
//! A nonce is 16 random bytes, base64-encoded. The byte source is injected so
//! tests can pin the value; production uses [`SystemNonceSource`].

use axum::http::HeaderValue;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;
use std::fmt;

/// Number of random bytes behind each nonce.
pub const NONCE_LEN: usize = 16;

/// Supplies the raw bytes for a nonce.
pub trait NonceSource: Send + Sync {
    fn fill(&self, bytes: &mut [u8; NONCE_LEN]);
}

/// Thread-local CSPRNG, seeded from the operating system.
///
/// Panics if the OS entropy source is unavailable. A predictable nonce would
/// void the `script-src` restriction, so there is no weaker fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNonceSource;

impl NonceSource for SystemNonceSource {
    fn fill(&self, bytes: &mut [u8; NONCE_LEN]) {
        rand::rng().fill_bytes(bytes);
    }
}

/// Always yields the same bytes. Only useful for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedNonceSource(pub [u8; NONCE_LEN]);

impl NonceSource for FixedNonceSource {
    fn fill(&self, bytes: &mut [u8; NONCE_LEN]) {
        *bytes = self.0;
    }
}

/// A base64-encoded nonce, valid for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    pub fn generate(source: &dyn NonceSource) -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        source.fill(&mut bytes);
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8; NONCE_LEN]) -> Self {
        Self(BASE64.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> HeaderValue {
        ascii_header(&self.0)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds a header value from text assembled out of the base64 alphabet and
/// fixed ASCII directives.
pub(crate) fn ascii_header(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).expect("base64 and CSP directives are visible ASCII")
}

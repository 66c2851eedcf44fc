use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Issues and checks double-submit CSRF tokens.
///
/// The token is bound to the browser context through a client-readable
/// cookie; it proves nothing about authentication on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfService;

impl CsrfService {
    /// 32 random bytes, URL-safe base64. Re-issuing replaces the cookie, so
    /// any request still holding the previous value fails verification.
    pub fn issue(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Constant-time comparison of the request header against the cookie.
    pub fn verify(&self, header: &str, cookie: &str) -> bool {
        !header.is_empty() && bool::from(header.as_bytes().ct_eq(cookie.as_bytes()))
    }
}

//! HMAC-SHA256 signed connection tokens.
//!
//! Format: `base64url(username) "." base64url(hmac_sha256(secret, username))`,
//! both without padding. Tokens do not expire; rotating the secret revokes
//! every outstanding token.

use super::{AuthError, AuthProvider, Username};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies signed tokens under one server secret.
#[derive(Clone)]
pub struct HmacTokenAuth {
    secret: Vec<u8>,
}

impl std::fmt::Debug for HmacTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacTokenAuth").finish_non_exhaustive()
    }
}

impl HmacTokenAuth {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Mint a token for `username`.
    pub fn issue(&self, username: &str) -> String {
        let payload = URL_SAFE_NO_PAD.encode(username.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(self.sign(username.as_bytes()));
        format!("{payload}.{signature}")
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    fn check(&self, token: &str) -> Result<Username, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        let name = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken)?;

        let expected = self.sign(&name);
        if !bool::from(expected.ct_eq(&signature)) {
            return Err(AuthError::BadSignature);
        }

        String::from_utf8(name).map_err(|_| AuthError::MalformedToken)
    }
}

#[async_trait]
impl AuthProvider for HmacTokenAuth {
    async fn verify(&self, token: &str) -> Result<Username, AuthError> {
        self.check(token.trim())
    }
}

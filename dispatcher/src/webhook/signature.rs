//! HMAC-SHA256 webhook signature verification

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{error, warn};

type HmacSha256 = Hmac<Sha256>;

/// Prefix the sender puts in front of the hex digest
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Length of a hex-encoded SHA-256 digest
const HEX_DIGEST_LEN: usize = 64;

/// Verifies webhook payloads against a shared secret.
///
/// With no secret configured every payload is accepted.
#[derive(Debug)]
pub struct SignatureVerifier {
    secret: Option<SecretString>,
}

impl SignatureVerifier {
    pub fn new(secret: &str) -> Self {
        Self::from_secret(SecretString::from(secret.to_string()))
    }

    /// An empty secret disables verification
    pub fn from_secret(secret: SecretString) -> Self {
        let secret = (!secret.expose_secret().is_empty()).then_some(secret);
        Self { secret }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Check `signature_header` against the HMAC of `payload`
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> bool {
        let Some(secret) = &self.secret else {
            warn!("No webhook secret configured, signature verification disabled");
            return true;
        };

        if signature_header.is_empty() {
            error!("No signature provided");
            return false;
        }

        let key = secret.expose_secret().as_bytes();
        let valid = matches_signature(key, payload, signature_header);
        if !valid {
            error!("Signature mismatch for {} byte payload", payload.len());
        }
        valid
    }
}

/// Stateless form of [`SignatureVerifier::verify`]
pub fn verify(payload: &[u8], signature_header: &str, secret: &str) -> bool {
    SignatureVerifier::new(secret).verify(payload, signature_header)
}

/// Compute the `sha256=<hex>` header value for `payload`
pub fn sign(payload: &[u8], secret: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload);
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn matches_signature(key: &[u8], payload: &[u8], signature_header: &str) -> bool {
    let provided = signature_header
        .strip_prefix(SIGNATURE_PREFIX)
        .unwrap_or(signature_header);

    // Only the exact lowercase hex encoding is accepted
    if provided.len() != HEX_DIGEST_LEN
        || !provided.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return false;
    }
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(payload);
    // Constant-time comparison
    mac.verify_slice(&provided).is_ok()
}

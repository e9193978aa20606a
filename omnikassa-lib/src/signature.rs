//! Keyed signatures over canonical strings.
//!
//! The gateway authenticates messages with HMAC-SHA512 over the UTF-8 bytes of
//! the canonical string (see [`crate::canonical`]), hex encoded. The shared
//! secret is distributed base64 encoded and decoded once into a [`SigningKey`].
//!
//! Verification compares MACs in constant time and never fails loudly: a
//! malformed signature, an empty canonical string or a wrong key all come back
//! as `false`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::canonical::{self, Canonical, FieldSpec};
use crate::{OmnikassaError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Length of a hex encoded HMAC-SHA512 signature.
pub const SIGNATURE_HEX_LEN: usize = 128;

/// Decoded shared secret. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Decode the key from its base64 transport form.
    ///
    /// Line breaks and surrounding whitespace are ignored.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| OmnikassaError::invalid_setting("signing_key", format!("invalid base64: {}", e)))?;
        Self::from_bytes(bytes)
    }

    /// Use raw key bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(OmnikassaError::invalid_setting(
                "signing_key",
                "decodes to an empty key",
            ));
        }
        Ok(Self(bytes))
    }

    fn mac(&self) -> HmacSha512 {
        // HMAC accepts keys of any length.
        HmacSha512::new_from_slice(&self.0).expect("HMAC can take key of any size")
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey([REDACTED])")
    }
}

/// Compute the hex signature of `canonical` under `key`.
pub fn sign(canonical: &str, key: &SigningKey) -> String {
    let mut mac = key.mac();
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check `signature` against `canonical` under `key`.
pub fn verify(canonical: &str, signature: &str, key: &SigningKey) -> bool {
    if canonical.is_empty() || signature.len() != SIGNATURE_HEX_LEN {
        return false;
    }
    let Ok(supplied) = hex::decode(signature) else {
        return false;
    };

    let mut mac = key.mac();
    mac.update(canonical.as_bytes());
    let expected = mac.finalize().into_bytes();

    expected.as_slice().ct_eq(supplied.as_slice()).into()
}

/// Signs and verifies canonical strings with one shared secret.
#[derive(Clone, Debug)]
pub struct SignatureService {
    key: SigningKey,
}

impl SignatureService {
    /// Create a service around an already decoded key.
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Create a service from the base64 key found in configuration.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Ok(Self::new(SigningKey::from_base64(encoded)?))
    }

    /// Hex signature over a canonical string.
    pub fn sign(&self, canonical: &str) -> String {
        sign(canonical, &self.key)
    }

    /// Constant-time verification of a canonical string.
    pub fn verify(&self, canonical: &str, signature: &str) -> bool {
        verify(canonical, signature, &self.key)
    }

    /// Canonicalize `data` with `fields` and sign the result.
    pub fn sign_fields(&self, fields: &[FieldSpec], data: &dyn Canonical) -> String {
        self.sign(&canonical::serialize(fields, data))
    }

    /// Canonicalize `data` with `fields` and verify `signature` over it.
    pub fn verify_fields(&self, fields: &[FieldSpec], data: &dyn Canonical, signature: &str) -> bool {
        self.verify(&canonical::serialize(fields, data), signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    fn service() -> SignatureService {
        SignatureService::from_base64(fixtures::SIGNING_KEY_BASE64).unwrap()
    }

    #[test]
    fn test_known_vector() {
        let canonical = fixtures::notification_canonical(fixtures::EXPIRY_3_DIGITS);
        assert_eq!(service().sign(&canonical), fixtures::NOTIFICATION_SIGNATURE);
        assert!(service().verify(&canonical, fixtures::NOTIFICATION_SIGNATURE));
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let canonical = fixtures::notification_canonical(fixtures::EXPIRY_3_DIGITS);
        let upper = fixtures::NOTIFICATION_SIGNATURE.to_uppercase();
        assert!(service().verify(&canonical, &upper));
    }

    #[test]
    fn test_malformed_signature_is_false() {
        let svc = service();
        assert!(!svc.verify("abc", "invalidSignature"));
        assert!(!svc.verify("abc", ""));
        assert!(!svc.verify("abc", &"zz".repeat(64)));
    }

    #[test]
    fn test_empty_canonical_is_false() {
        let svc = service();
        let signature = svc.sign("");
        assert!(!svc.verify("", &signature));
    }

    #[test]
    fn test_wrong_key_is_false() {
        let other = SignatureService::new(SigningKey::from_bytes(b"someOtherKey".to_vec()).unwrap());
        let signature = other.sign("payload");
        assert!(!service().verify("payload", &signature));
        assert!(other.verify("payload", &signature));
    }

    #[test]
    fn test_invalid_key_material() {
        assert!(SigningKey::from_base64("***not base64***").is_err());
        assert!(SigningKey::from_base64("").is_err());
        assert!(SigningKey::from_base64("bXlTMWdu\naW5nSzN5\n").is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", service());
        assert!(!debug.contains("myS1gningK3y"));
        assert!(debug.contains("REDACTED"));
    }
}

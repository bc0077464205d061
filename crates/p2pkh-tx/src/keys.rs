use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::CompressedPublicKey;
use crypto_utils::random::try_random_bytes_fixed;
use crypto_utils::zeroizing::ZeroizingString;

use crate::error::BtcError;

/// Fresh draws allowed before giving up on the entropy source. A uniformly
/// random 32-byte string falls outside the curve order with probability
/// below 2^-127, so hitting this limit means the source is broken.
const MAX_KEYGEN_ATTEMPTS: usize = 8;

/// A secp256k1 private scalar and its compressed public point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: CompressedPublicKey,
}

impl KeyPair {
    /// Generate a key pair from the operating system's entropy source.
    pub fn generate() -> Result<Self, BtcError> {
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            let candidate: [u8; 32] = try_random_bytes_fixed()?;
            if let Ok(pair) = Self::from_secret_bytes(&candidate) {
                return Ok(pair);
            }
        }
        Err(BtcError::Randomness(format!(
            "no valid scalar after {MAX_KEYGEN_ATTEMPTS} draws"
        )))
    }

    /// Rebuild a key pair from a 32-byte big-endian scalar.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Result<Self, BtcError> {
        let secret_key = SecretKey::from_slice(secret)
            .map_err(|e| BtcError::InvalidPrivateKey(format!("invalid secret key: {e}")))?;
        let secp = Secp256k1::signing_only();
        let public_key = CompressedPublicKey(PublicKey::from_secret_key(&secp, &secret_key));
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Rebuild a key pair from a 64-character hex scalar.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, BtcError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| BtcError::InvalidPrivateKey(format!("invalid hex: {e}")))?;
        let secret: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            BtcError::InvalidPrivateKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_secret_bytes(&secret)
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> &CompressedPublicKey {
        &self.public_key
    }

    /// 33-byte SEC1 compressed encoding of the public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.to_bytes()
    }

    /// Hex-encoded private scalar, zeroed when dropped.
    pub fn secret_hex(&self) -> ZeroizingString {
        ZeroizingString::new(hex::encode(self.secret_key.secret_bytes()))
    }
}

/// Generate a fresh random key pair.
pub fn generate_key_pair() -> Result<KeyPair, BtcError> {
    KeyPair::generate()
}

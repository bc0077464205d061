use thiserror::Error;

/// Cryptographic utility errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("entropy source failure: {0}")]
    Randomness(String),
}

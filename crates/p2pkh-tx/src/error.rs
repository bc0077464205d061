use crypto_utils::CryptoError;
use thiserror::Error;

/// Errors raised while building and signing P2PKH transactions.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("randomness error: {0}")]
    Randomness(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("address decode error: {0}")]
    AddressDecode(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("script construction error: {0}")]
    ScriptConstruction(String),

    #[error("transaction build error: {0}")]
    TransactionBuild(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("verification failed: {0}")]
    VerificationFailed(String),
}

impl From<CryptoError> for BtcError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Randomness(msg) => BtcError::Randomness(msg),
        }
    }
}

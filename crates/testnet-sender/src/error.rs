use p2pkh_tx::BtcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Btc(#[from] BtcError),

    /// Failure reported by, or on the way to, the node. Carries the RPC
    /// library's error as-is.
    #[error("transport error: {0}")]
    Transport(#[from] bitcoincore_rpc::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("key store error: {0}")]
    KeyStore(String),
}

impl From<crypto_utils::CryptoError> for AppError {
    fn from(e: crypto_utils::CryptoError) -> Self {
        AppError::Btc(e.into())
    }
}

use std::fmt;
use std::fs;
use std::path::Path;

use bitcoin::Address;
use p2pkh_tx::address::derive_address;
use p2pkh_tx::{BtcNetwork, KeyPair};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::AppError;

/// Key material written after generation: the address and the hex scalar.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyRecord {
    pub address: String,
    pub private_key: String,
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl KeyRecord {
    pub fn from_key_pair(key_pair: &KeyPair, network: BtcNetwork) -> Self {
        Self {
            address: derive_address(key_pair.public_key(), network).to_string(),
            private_key: key_pair.secret_hex().to_string(),
        }
    }

    /// Reload the key pair, checking that it still derives the stored address.
    pub fn to_key_pair(&self, network: BtcNetwork) -> Result<(KeyPair, Address), AppError> {
        let key_pair = KeyPair::from_secret_hex(&self.private_key)?;
        let address = derive_address(key_pair.public_key(), network);
        if address.to_string() != self.address {
            return Err(AppError::KeyStore(format!(
                "stored address {} does not match key (derives {address} on {network})",
                self.address
            )));
        }
        Ok((key_pair, address))
    }

    /// Write as pretty-printed JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::KeyStore(format!("serialize: {e}")))?;
        fs::write(path, json)
            .map_err(|e| AppError::KeyStore(format!("write {}: {e}", path.display())))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let json = fs::read_to_string(path)
            .map_err(|e| AppError::KeyStore(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| AppError::KeyStore(format!("parse {}: {e}", path.display())))
    }
}

//! Legacy pay-to-public-key-hash transaction core.
//!
//! Provides key generation, P2PKH address derivation, UTXO coin selection,
//! single-output transaction building, and `SIGHASH_ALL` signing and
//! verification of P2PKH inputs.

pub mod address;
pub mod error;
pub mod keys;
pub mod network;
pub mod signer;
pub mod transaction;
pub mod utxo;

pub use error::BtcError;
pub use keys::KeyPair;
pub use network::BtcNetwork;
pub use transaction::{SignedTransaction, UnsignedTransaction};
pub use utxo::{Utxo, UtxoSelection};

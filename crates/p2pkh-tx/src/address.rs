use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::hashes::Hash;
use bitcoin::CompressedPublicKey;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Derive the P2PKH address for a compressed public key.
///
/// The payload is HASH160 (RIPEMD-160 of SHA-256) of the 33-byte compressed
/// encoding, base58check-encoded behind the network's version byte: `1...`
/// on mainnet, `m...`/`n...` on testnet, signet and regtest.
pub fn derive_address(public_key: &CompressedPublicKey, network: BtcNetwork) -> Address {
    Address::p2pkh(public_key.pubkey_hash(), network.to_bitcoin_network())
}

/// Derive a P2PKH address string from raw compressed public key bytes.
pub fn pubkey_to_p2pkh_address(
    pubkey_bytes: &[u8; 33],
    network: BtcNetwork,
) -> Result<String, BtcError> {
    let compressed_pk = CompressedPublicKey::from_slice(pubkey_bytes).map_err(|e| {
        BtcError::InvalidPublicKey(format!("failed to parse compressed public key: {e}"))
    })?;

    Ok(derive_address(&compressed_pk, network).to_string())
}

/// Parse an address string and require that it belongs to `network`.
pub fn decode_address(address: &str, network: BtcNetwork) -> Result<Address, BtcError> {
    address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::AddressDecode(format!("failed to parse address: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BtcError::AddressDecode(format!("address not valid for {network}: {e}")))
}

/// Decode a P2PKH address back to its 20-byte public key hash.
pub fn address_pubkey_hash(address: &str, network: BtcNetwork) -> Result<[u8; 20], BtcError> {
    let decoded = decode_address(address, network)?;
    decoded
        .pubkey_hash()
        .map(|hash| hash.to_byte_array())
        .ok_or_else(|| BtcError::AddressDecode(format!("{address} is not a P2PKH address")))
}

/// Validate a Bitcoin address string for the given network.
///
/// Returns `true` if the address is valid for the specified network,
/// `false` if it is well-formed but for a different network.
pub fn validate_address(address: &str, network: BtcNetwork) -> Result<bool, BtcError> {
    let parsed = address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::AddressDecode(format!("failed to parse address: {e}")))?;

    Ok(parsed.is_valid_for_network(network.to_bitcoin_network()))
}

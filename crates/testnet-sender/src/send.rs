use std::path::Path;

use bitcoin::{Address, Txid};
use log::{debug, info, warn};
use p2pkh_tx::address::{decode_address, derive_address};
use p2pkh_tx::signer::sign_transaction;
use p2pkh_tx::transaction::build_transaction_to_address;
use p2pkh_tx::utxo::select_utxos;
use p2pkh_tx::{BtcError, BtcNetwork, KeyPair};

use crate::error::AppError;
use crate::key_store::KeyRecord;
use crate::node::NodeClient;

/// Generate a key pair, derive its P2PKH address, and persist both to
/// `wallet_file`.
pub fn create_wallet(
    network: BtcNetwork,
    wallet_file: &Path,
) -> Result<(KeyPair, Address), AppError> {
    let key_pair = KeyPair::generate()?;
    let address = derive_address(key_pair.public_key(), network);

    KeyRecord::from_key_pair(&key_pair, network).save(wallet_file)?;
    info!(
        "generated {network} wallet {address}, key material written to {}",
        wallet_file.display()
    );

    Ok((key_pair, address))
}

/// Pay `amount_sat` from `from` to `to` and broadcast.
///
/// Inputs are taken from the node's confirmed outputs for `from` in the
/// order reported until they cover the amount. There is no change output:
/// any surplus is paid to miners. Fails before building anything if the node
/// reports no spendable outputs.
pub fn send_bitcoin<N>(
    node: &N,
    key_pair: &KeyPair,
    from: &Address,
    to: &str,
    amount_sat: u64,
    network: BtcNetwork,
) -> Result<Txid, AppError>
where
    N: NodeClient + ?Sized,
{
    let destination = decode_address(to, network)
        .map_err(|e| BtcError::ScriptConstruction(format!("destination {to}: {e}")))?;

    let candidates = node.list_unspent(from)?;
    if candidates.is_empty() {
        return Err(BtcError::InsufficientFunds(format!(
            "no unspent outputs found for {from}"
        ))
        .into());
    }

    let selection = select_utxos(&candidates, amount_sat)?;
    let unsigned = build_transaction_to_address(&selection.selected, &destination, amount_sat)?;
    let signed = sign_transaction(&unsigned, key_pair)?;

    let fee_sat = signed.implicit_fee_sat();
    if let Some(warning) = fee_warning(fee_sat, amount_sat) {
        warn!("{warning}");
    }
    info!(
        "sending {amount_sat} sat to {destination} spending {} outputs ({} sat), fee {fee_sat} sat",
        selection.selected.len(),
        selection.total_sat
    );

    debug!("raw transaction {}: {}", signed.txid(), signed.to_hex());

    node.broadcast(&signed)
}

/// Flags an implicit fee that is zero (the node will not relay it) or larger
/// than the payment itself.
fn fee_warning(fee_sat: u64, amount_sat: u64) -> Option<String> {
    if fee_sat == 0 {
        Some(format!(
            "spent outputs cover the {amount_sat} sat payment exactly; \
             a zero-fee transaction will not be relayed"
        ))
    } else if fee_sat > amount_sat {
        Some(format!(
            "implicit fee {fee_sat} sat exceeds the {amount_sat} sat payment; \
             the surplus of the spent outputs goes to miners"
        ))
    } else {
        None
    }
}

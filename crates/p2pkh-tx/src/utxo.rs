use bitcoin::{Amount, OutPoint, ScriptBuf, TxOut, Txid};
use log::debug;

use crate::error::BtcError;

/// A single unspent transaction output (UTXO).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Transaction that created the output.
    pub txid: Txid,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub amount_sat: u64,
    /// The locking script (scriptPubKey).
    pub script_pubkey: ScriptBuf,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }

    /// The output being spent, as recorded for sighash computation.
    pub fn to_txout(&self) -> TxOut {
        TxOut {
            value: Amount::from_sat(self.amount_sat),
            script_pubkey: self.script_pubkey.clone(),
        }
    }
}

/// Result of UTXO selection: the chosen UTXOs and their aggregate value.
#[derive(Debug, Clone)]
pub struct UtxoSelection {
    /// The selected UTXOs, in candidate order.
    pub selected: Vec<Utxo>,
    /// Total value of the selected UTXOs in satoshis.
    pub total_sat: u64,
}

/// Pick a single candidate that covers `target_sat` on its own.
///
/// Returns the first candidate (in the order given) whose value is at least
/// the target. Never fabricates an output: the result always borrows from
/// `candidates`.
pub fn select_utxo(candidates: &[Utxo], target_sat: u64) -> Result<&Utxo, BtcError> {
    if candidates.is_empty() {
        return Err(BtcError::InsufficientFunds(
            "no unspent outputs available".into(),
        ));
    }

    candidates
        .iter()
        .find(|utxo| utxo.amount_sat >= target_sat)
        .ok_or_else(|| {
            let largest = candidates.iter().map(|u| u.amount_sat).max().unwrap_or(0);
            BtcError::InsufficientFunds(format!(
                "no single output covers {target_sat} sat (largest is {largest} sat)"
            ))
        })
}

/// Select UTXOs to cover `target_sat`.
///
/// Accumulates candidates in the order given until the running total reaches
/// the target. Any value above the target is left to the caller; nothing here
/// reserves a fee.
pub fn select_utxos(candidates: &[Utxo], target_sat: u64) -> Result<UtxoSelection, BtcError> {
    if candidates.is_empty() {
        return Err(BtcError::InsufficientFunds(
            "no unspent outputs available".into(),
        ));
    }

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total_sat: u64 = 0;

    for utxo in candidates {
        selected.push(utxo.clone());
        total_sat = total_sat.saturating_add(utxo.amount_sat);

        if total_sat >= target_sat {
            debug!(
                "selected {} of {} outputs totalling {} sat for target {} sat",
                selected.len(),
                candidates.len(),
                total_sat,
                target_sat
            );
            return Ok(UtxoSelection {
                selected,
                total_sat,
            });
        }
    }

    Err(BtcError::InsufficientFunds(format!(
        "have {total_sat} sat across {} outputs, need {target_sat} sat",
        candidates.len()
    )))
}

use bitcoin::absolute::LockTime;
use bitcoin::address::Address;
use bitcoin::consensus::encode::{serialize, serialize_hex};
use bitcoin::script::ScriptBuf;
use bitcoin::transaction::Version;
use bitcoin::{Amount, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use log::debug;

use crate::address::decode_address;
use crate::error::BtcError;
use crate::network::BtcNetwork;
use crate::utxo::Utxo;

/// An unsigned legacy transaction: every input's unlocking script is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    tx: Transaction,
    /// The outputs being spent, in input order. Their locking scripts are the
    /// script code committed to by each input's signature hash.
    prevouts: Vec<TxOut>,
}

impl UnsignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn prevouts(&self) -> &[TxOut] {
        &self.prevouts
    }

    pub fn input_total_sat(&self) -> u64 {
        sum_sat(&self.prevouts)
    }

    pub fn output_total_sat(&self) -> u64 {
        sum_sat(&self.tx.output)
    }

    /// Input value not claimed by any output; miners collect it as the fee.
    pub fn implicit_fee_sat(&self) -> u64 {
        self.input_total_sat() - self.output_total_sat()
    }
}

/// A transaction whose inputs carry unlocking scripts.
///
/// Produced only by the signer, from an [`UnsignedTransaction`]; the two
/// differ in nothing but the `script_sig` of the signed inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: Transaction,
    prevouts: Vec<TxOut>,
}

impl SignedTransaction {
    pub(crate) fn new(tx: Transaction, prevouts: Vec<TxOut>) -> Self {
        Self { tx, prevouts }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn into_transaction(self) -> Transaction {
        self.tx
    }

    pub fn prevouts(&self) -> &[TxOut] {
        &self.prevouts
    }

    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    pub fn implicit_fee_sat(&self) -> u64 {
        sum_sat(&self.prevouts) - sum_sat(&self.tx.output)
    }

    /// Consensus serialization, ready for `sendrawtransaction`.
    pub fn serialize(&self) -> Vec<u8> {
        serialize(&self.tx)
    }

    pub fn to_hex(&self) -> String {
        serialize_hex(&self.tx)
    }
}

fn sum_sat(outputs: &[TxOut]) -> u64 {
    outputs.iter().map(|out| out.value.to_sat()).sum()
}

/// Build an unsigned one-output transaction paying `amount_sat` to `destination`.
///
/// Each selected UTXO becomes one input with an empty unlocking script. No
/// change output is created: whatever the inputs hold beyond `amount_sat` is
/// left as the fee.
pub fn build_transaction(
    selected: &[Utxo],
    destination: &str,
    amount_sat: u64,
    network: BtcNetwork,
) -> Result<UnsignedTransaction, BtcError> {
    let destination_addr = decode_address(destination, network)
        .map_err(|e| BtcError::ScriptConstruction(format!("destination {destination}: {e}")))?;

    build_transaction_to_address(selected, &destination_addr, amount_sat)
}

/// Same as [`build_transaction`] for an already-decoded destination.
pub fn build_transaction_to_address(
    selected: &[Utxo],
    destination: &Address,
    amount_sat: u64,
) -> Result<UnsignedTransaction, BtcError> {
    if selected.is_empty() {
        return Err(BtcError::InsufficientFunds("no inputs selected".into()));
    }
    if amount_sat == 0 {
        return Err(BtcError::TransactionBuild(
            "output amount must be positive".into(),
        ));
    }

    let input_total = selected
        .iter()
        .try_fold(0u64, |acc, utxo| acc.checked_add(utxo.amount_sat))
        .ok_or_else(|| BtcError::TransactionBuild("input total overflows u64".into()))?;
    if input_total < amount_sat {
        return Err(BtcError::InsufficientFunds(format!(
            "inputs hold {input_total} sat, output needs {amount_sat} sat"
        )));
    }

    let inputs: Vec<TxIn> = selected
        .iter()
        .map(|utxo| TxIn {
            previous_output: utxo.outpoint(),
            script_sig: ScriptBuf::new(), // Filled in by the signer.
            sequence: Sequence::MAX,
            witness: Witness::default(),
        })
        .collect();
    let prevouts: Vec<TxOut> = selected.iter().map(Utxo::to_txout).collect();

    let output = TxOut {
        value: Amount::from_sat(amount_sat),
        script_pubkey: destination.script_pubkey(),
    };

    let tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: vec![output],
    };

    debug!(
        "built transaction with {} inputs paying {} sat to {}, implicit fee {} sat",
        tx.input.len(),
        amount_sat,
        destination,
        input_total - amount_sat
    );

    Ok(UnsignedTransaction { tx, prevouts })
}

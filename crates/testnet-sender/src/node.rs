use bitcoin::{Address, Amount, Txid};
use bitcoincore_rpc::json::ListUnspentResultEntry;
use bitcoincore_rpc::{Auth, Client, RpcApi};
use log::{debug, info};
use p2pkh_tx::{SignedTransaction, Utxo};

use crate::config::NodeConfig;
use crate::error::AppError;

/// Minimum confirmations for an output to count as spendable.
pub const MIN_CONFIRMATIONS: usize = 1;

/// Upper confirmation bound passed to `listunspent`.
pub const MAX_CONFIRMATIONS: usize = 9_999_999;

/// The remote node, as seen by the send pipeline.
///
/// Calls are synchronous with a single success/failure outcome; no retries.
pub trait NodeClient {
    /// Confirmed unspent outputs locked to `address`.
    fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>, AppError>;

    /// Submit a signed transaction to the network.
    fn broadcast(&self, tx: &SignedTransaction) -> Result<Txid, AppError>;

    /// Sum of the confirmed unspent outputs locked to `address`.
    fn confirmed_balance(&self, address: &Address) -> Result<Amount, AppError> {
        let total = self
            .list_unspent(address)?
            .iter()
            .map(|utxo| utxo.amount_sat)
            .sum();
        Ok(Amount::from_sat(total))
    }
}

/// Bitcoin Core JSON-RPC client.
pub struct RpcNodeClient {
    client: Client,
}

impl RpcNodeClient {
    /// Create the client. No request is sent until the first call.
    pub fn new(config: &NodeConfig) -> Result<Self, AppError> {
        let auth = Auth::UserPass(config.rpc_user.clone(), config.rpc_password.clone());
        let client = Client::new(&config.rpc_url, auth)?;
        debug!("RPC client configured for {}", config.rpc_url);
        Ok(Self { client })
    }
}

impl NodeClient for RpcNodeClient {
    fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>, AppError> {
        let entries = self.client.list_unspent(
            Some(MIN_CONFIRMATIONS),
            Some(MAX_CONFIRMATIONS),
            Some(&[address]),
            None,
            None,
        )?;
        debug!("node reported {} unspent outputs for {}", entries.len(), address);

        Ok(entries.into_iter().map(utxo_from_entry).collect())
    }

    fn broadcast(&self, tx: &SignedTransaction) -> Result<Txid, AppError> {
        let txid = self.client.send_raw_transaction(tx.to_hex())?;
        info!("broadcast transaction {txid}");
        Ok(txid)
    }
}

fn utxo_from_entry(entry: ListUnspentResultEntry) -> Utxo {
    Utxo {
        txid: entry.txid,
        vout: entry.vout,
        amount_sat: entry.amount.to_sat(),
        script_pubkey: entry.script_pub_key,
    }
}

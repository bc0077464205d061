//! End-to-end tests of the send pipeline against an in-memory node:
//! generate key -> list unspent -> select -> build -> sign -> broadcast.

use std::cell::RefCell;

use bitcoin::hashes::Hash;
use bitcoin::{Address, Amount, Txid};
use p2pkh_tx::address::derive_address;
use p2pkh_tx::signer::{verify_input, verify_transaction};
use p2pkh_tx::{BtcError, BtcNetwork, KeyPair, SignedTransaction, Utxo};
use testnet_sender::{create_wallet, send_bitcoin, AppError, NodeClient};

/// Node double holding a fixed UTXO set and recording every broadcast.
struct FakeNode {
    utxos: Vec<Utxo>,
    broadcasts: RefCell<Vec<SignedTransaction>>,
    list_calls: RefCell<usize>,
    fail_transport: bool,
}

impl FakeNode {
    fn with_utxos(utxos: Vec<Utxo>) -> Self {
        Self {
            utxos,
            broadcasts: RefCell::new(Vec::new()),
            list_calls: RefCell::new(0),
            fail_transport: false,
        }
    }

    fn unreachable() -> Self {
        Self {
            fail_transport: true,
            ..Self::with_utxos(Vec::new())
        }
    }
}

impl NodeClient for FakeNode {
    fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>, AppError> {
        *self.list_calls.borrow_mut() += 1;
        if self.fail_transport {
            return Err(bitcoincore_rpc::Error::ReturnedError("401 Unauthorized".into()).into());
        }
        let script = address.script_pubkey();
        Ok(self
            .utxos
            .iter()
            .filter(|u| u.script_pubkey == script)
            .cloned()
            .collect())
    }

    fn broadcast(&self, tx: &SignedTransaction) -> Result<Txid, AppError> {
        self.broadcasts.borrow_mut().push(tx.clone());
        Ok(tx.txid())
    }
}

fn funded(address: &Address, tag: u8, amount_sat: u64) -> Utxo {
    Utxo {
        txid: Txid::from_byte_array([tag; 32]),
        vout: 1,
        amount_sat,
        script_pubkey: address.script_pubkey(),
    }
}

fn testnet_address_of(pair: &KeyPair) -> Address {
    derive_address(pair.public_key(), BtcNetwork::Testnet)
}

#[test]
fn pays_one_thousand_sats_from_single_utxo() {
    let alice = KeyPair::generate().unwrap();
    let bob = KeyPair::generate().unwrap();
    let alice_addr = testnet_address_of(&alice);
    let bob_addr = testnet_address_of(&bob);

    let utxo = funded(&alice_addr, 0xa1, 50_000);
    let node = FakeNode::with_utxos(vec![utxo.clone()]);

    let txid = send_bitcoin(
        &node,
        &alice,
        &alice_addr,
        &bob_addr.to_string(),
        1_000,
        BtcNetwork::Testnet,
    )
    .unwrap();

    let broadcasts = node.broadcasts.borrow();
    assert_eq!(broadcasts.len(), 1);
    let signed = &broadcasts[0];
    assert_eq!(signed.txid(), txid);

    let tx = signed.transaction();
    assert_eq!(tx.input.len(), 1);
    assert_eq!(tx.input[0].previous_output, utxo.outpoint());
    assert_eq!(tx.output.len(), 1);
    assert_eq!(tx.output[0].value, Amount::from_sat(1_000));
    assert_eq!(tx.output[0].script_pubkey, bob_addr.script_pubkey());
    assert_eq!(signed.implicit_fee_sat(), 49_000);

    verify_input(signed, 0, &utxo.script_pubkey).unwrap();
}

#[test]
fn no_unspent_outputs_is_insufficient_funds_and_nothing_broadcast() {
    let alice = KeyPair::generate().unwrap();
    let alice_addr = testnet_address_of(&alice);
    let node = FakeNode::with_utxos(Vec::new());

    let err = send_bitcoin(
        &node,
        &alice,
        &alice_addr,
        &testnet_address_of(&KeyPair::generate().unwrap()).to_string(),
        1_000,
        BtcNetwork::Testnet,
    )
    .unwrap_err();

    assert!(matches!(err, AppError::Btc(BtcError::InsufficientFunds(_))));
    assert!(node.broadcasts.borrow().is_empty());
}

#[test]
fn aggregates_small_outputs_to_cover_amount() {
    let alice = KeyPair::generate().unwrap();
    let alice_addr = testnet_address_of(&alice);
    let dest = testnet_address_of(&KeyPair::generate().unwrap());

    let node = FakeNode::with_utxos(vec![
        funded(&alice_addr, 0x01, 400),
        funded(&alice_addr, 0x02, 400),
        funded(&alice_addr, 0x03, 400),
    ]);

    send_bitcoin(
        &node,
        &alice,
        &alice_addr,
        &dest.to_string(),
        1_000,
        BtcNetwork::Testnet,
    )
    .unwrap();

    let broadcasts = node.broadcasts.borrow();
    let signed = &broadcasts[0];
    assert_eq!(signed.transaction().input.len(), 3);
    assert_eq!(signed.implicit_fee_sat(), 200);
    verify_transaction(signed).unwrap();
}

#[test]
fn outputs_short_of_amount_fail_before_broadcast() {
    let alice = KeyPair::generate().unwrap();
    let alice_addr = testnet_address_of(&alice);
    let node = FakeNode::with_utxos(vec![funded(&alice_addr, 0x01, 999)]);

    let err = send_bitcoin(
        &node,
        &alice,
        &alice_addr,
        &testnet_address_of(&KeyPair::generate().unwrap()).to_string(),
        1_000,
        BtcNetwork::Testnet,
    )
    .unwrap_err();

    assert!(matches!(err, AppError::Btc(BtcError::InsufficientFunds(_))));
    assert!(node.broadcasts.borrow().is_empty());
}

#[test]
fn bad_destination_fails_before_querying_node() {
    let alice = KeyPair::generate().unwrap();
    let alice_addr = testnet_address_of(&alice);
    let node = FakeNode::with_utxos(vec![funded(&alice_addr, 0x01, 50_000)]);

    let err = send_bitcoin(
        &node,
        &alice,
        &alice_addr,
        "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH",
        1_000,
        BtcNetwork::Testnet,
    )
    .unwrap_err();

    assert!(matches!(err, AppError::Btc(BtcError::ScriptConstruction(_))));
    assert_eq!(*node.list_calls.borrow(), 0);
}

#[test]
fn transport_failure_surfaces_unmodified() {
    let alice = KeyPair::generate().unwrap();
    let alice_addr = testnet_address_of(&alice);
    let node = FakeNode::unreachable();

    let err = send_bitcoin(
        &node,
        &alice,
        &alice_addr,
        &testnet_address_of(&KeyPair::generate().unwrap()).to_string(),
        1_000,
        BtcNetwork::Testnet,
    )
    .unwrap_err();

    match err {
        AppError::Transport(bitcoincore_rpc::Error::ReturnedError(msg)) => {
            assert_eq!(msg, "401 Unauthorized")
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn confirmed_balance_sums_outputs() {
    let alice = KeyPair::generate().unwrap();
    let alice_addr = testnet_address_of(&alice);
    let other = testnet_address_of(&KeyPair::generate().unwrap());
    let node = FakeNode::with_utxos(vec![
        funded(&alice_addr, 0x01, 1_500),
        funded(&alice_addr, 0x02, 2_500),
        funded(&other, 0x03, 99_999),
    ]);

    assert_eq!(
        node.confirmed_balance(&alice_addr).unwrap(),
        Amount::from_sat(4_000)
    );
}

#[test]
fn wallet_file_key_can_spend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    let (key_pair, address) = create_wallet(BtcNetwork::Testnet, &path).unwrap();

    let record = testnet_sender::KeyRecord::load(&path).unwrap();
    let (reloaded, reloaded_addr) = record.to_key_pair(BtcNetwork::Testnet).unwrap();
    assert_eq!(reloaded, key_pair);

    let utxo = funded(&reloaded_addr, 0x55, 10_000);
    let node = FakeNode::with_utxos(vec![utxo.clone()]);
    let dest = testnet_address_of(&KeyPair::generate().unwrap());

    send_bitcoin(
        &node,
        &reloaded,
        &address,
        &dest.to_string(),
        5_000,
        BtcNetwork::Testnet,
    )
    .unwrap();
    verify_input(&node.broadcasts.borrow()[0], 0, &utxo.script_pubkey).unwrap();
}

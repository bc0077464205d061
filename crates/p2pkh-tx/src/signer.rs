//! Legacy `SIGHASH_ALL` signing and verification of P2PKH inputs.
//!
//! The signature hash is computed over a copy of the transaction in which
//! every other input's unlocking script is blanked and the signed input's
//! script is replaced by the previous output's locking script. All outputs
//! are committed to.

use bitcoin::ecdsa;
use bitcoin::hashes::Hash;
use bitcoin::script::{Instruction, PushBytesBuf, Script, ScriptBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{PubkeyHash, PublicKey, Transaction};
use log::debug;

use crate::error::BtcError;
use crate::keys::KeyPair;
use crate::transaction::{SignedTransaction, UnsignedTransaction};

/// Sign one input of `unsigned`, returning a new [`SignedTransaction`].
///
/// `previous_locking_script` must be the P2PKH script of the output being
/// spent, locked to `key_pair`'s public key hash. The unsigned value is left
/// untouched; in the result only the target input's `script_sig` differs.
pub fn sign_input(
    unsigned: &UnsignedTransaction,
    input_index: usize,
    key_pair: &KeyPair,
    previous_locking_script: &Script,
) -> Result<SignedTransaction, BtcError> {
    let tx = unsigned.transaction();
    let script_sig = unlocking_script(tx, input_index, key_pair, previous_locking_script)?;

    let mut signed = tx.clone();
    signed.input[input_index].script_sig = script_sig;

    Ok(SignedTransaction::new(signed, unsigned.prevouts().to_vec()))
}

/// Sign every input of `unsigned` with `key_pair`.
///
/// Each input is signed against the locking script recorded for it at build
/// time, so all inputs must be spendable by the same key.
pub fn sign_transaction(
    unsigned: &UnsignedTransaction,
    key_pair: &KeyPair,
) -> Result<SignedTransaction, BtcError> {
    let tx = unsigned.transaction();
    let mut signed = tx.clone();

    for (input_index, prevout) in unsigned.prevouts().iter().enumerate() {
        signed.input[input_index].script_sig =
            unlocking_script(tx, input_index, key_pair, &prevout.script_pubkey)?;
    }

    Ok(SignedTransaction::new(signed, unsigned.prevouts().to_vec()))
}

/// Check input `input_index` of `signed` against `previous_locking_script`.
///
/// Succeeds only if the unlocking script is `<sig> <pubkey>`, the public key
/// hashes to the key hash in the locking script, and the signature is a
/// valid ECDSA signature over the input's legacy signature hash.
pub fn verify_input(
    signed: &SignedTransaction,
    input_index: usize,
    previous_locking_script: &Script,
) -> Result<(), BtcError> {
    verify_script_sig(signed.transaction(), input_index, previous_locking_script)
}

/// Verify every input of `signed` against the outputs it spends.
pub fn verify_transaction(signed: &SignedTransaction) -> Result<(), BtcError> {
    for (input_index, prevout) in signed.prevouts().iter().enumerate() {
        verify_script_sig(signed.transaction(), input_index, &prevout.script_pubkey)?;
    }
    Ok(())
}

fn unlocking_script(
    tx: &Transaction,
    input_index: usize,
    key_pair: &KeyPair,
    previous_locking_script: &Script,
) -> Result<ScriptBuf, BtcError> {
    if input_index >= tx.input.len() {
        return Err(BtcError::Signing(format!(
            "input index {input_index} out of range ({} inputs)",
            tx.input.len()
        )));
    }
    let expected = p2pkh_key_hash(previous_locking_script)
        .map_err(|e| BtcError::Signing(e.to_string()))?;
    if key_pair.public_key().pubkey_hash() != expected {
        return Err(BtcError::Signing(format!(
            "input {input_index} is locked to key hash {expected}, not to the signing key"
        )));
    }

    let signature = sign_digest(tx, input_index, key_pair, previous_locking_script)?;
    let script_sig = build_script_sig(&signature, PublicKey::new(key_pair.public_key().0))?;

    debug!(
        "signed input {} ({} byte unlocking script)",
        input_index,
        script_sig.len()
    );
    Ok(script_sig)
}

fn sign_digest(
    tx: &Transaction,
    input_index: usize,
    key_pair: &KeyPair,
    script_code: &Script,
) -> Result<ecdsa::Signature, BtcError> {
    let sighash_type = EcdsaSighashType::All;
    let sighash = SighashCache::new(tx)
        .legacy_signature_hash(input_index, script_code, sighash_type.to_u32())
        .map_err(|e| BtcError::Signing(format!("sighash computation failed: {e}")))?;

    let secp = Secp256k1::signing_only();
    let msg = Message::from_digest(sighash.to_byte_array());
    let signature = secp.sign_ecdsa(&msg, key_pair.secret_key());

    Ok(ecdsa::Signature {
        signature,
        sighash_type,
    })
}

/// `<DER signature || sighash byte> <compressed pubkey>`
fn build_script_sig(
    signature: &ecdsa::Signature,
    public_key: PublicKey,
) -> Result<ScriptBuf, BtcError> {
    let sig_push = PushBytesBuf::try_from(signature.to_vec())
        .map_err(|e| BtcError::ScriptConstruction(format!("signature push: {e}")))?;

    Ok(ScriptBuf::builder()
        .push_slice(sig_push)
        .push_key(&public_key)
        .into_script())
}

fn verify_script_sig(
    tx: &Transaction,
    input_index: usize,
    previous_locking_script: &Script,
) -> Result<(), BtcError> {
    let input = tx.input.get(input_index).ok_or_else(|| {
        BtcError::VerificationFailed(format!(
            "input index {input_index} out of range ({} inputs)",
            tx.input.len()
        ))
    })?;
    let expected = p2pkh_key_hash(previous_locking_script)?;

    let pushes = input
        .script_sig
        .instructions()
        .map(|ins| match ins {
            Ok(Instruction::PushBytes(bytes)) => Ok(bytes.as_bytes().to_vec()),
            Ok(Instruction::Op(op)) => Err(BtcError::VerificationFailed(format!(
                "unexpected opcode {op} in unlocking script"
            ))),
            Err(e) => Err(BtcError::VerificationFailed(format!(
                "malformed unlocking script: {e}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let [sig_bytes, key_bytes] = pushes.as_slice() else {
        return Err(BtcError::VerificationFailed(format!(
            "expected 2 pushes in unlocking script, found {}",
            pushes.len()
        )));
    };

    let signature = ecdsa::Signature::from_slice(sig_bytes)
        .map_err(|e| BtcError::VerificationFailed(format!("bad signature encoding: {e}")))?;
    let public_key = PublicKey::from_slice(key_bytes)
        .map_err(|e| BtcError::VerificationFailed(format!("bad public key: {e}")))?;

    if public_key.pubkey_hash() != expected {
        return Err(BtcError::VerificationFailed(format!(
            "public key does not hash to {expected}"
        )));
    }

    let sighash = SighashCache::new(tx)
        .legacy_signature_hash(
            input_index,
            previous_locking_script,
            signature.sighash_type.to_u32(),
        )
        .map_err(|e| BtcError::VerificationFailed(format!("sighash computation failed: {e}")))?;
    let msg = Message::from_digest(sighash.to_byte_array());

    Secp256k1::verification_only()
        .verify_ecdsa(&msg, &signature.signature, &public_key.inner)
        .map_err(|e| BtcError::VerificationFailed(format!("signature check failed: {e}")))
}

/// Key hash committed to by a P2PKH locking script:
/// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`.
fn p2pkh_key_hash(script: &Script) -> Result<PubkeyHash, BtcError> {
    if !script.is_p2pkh() {
        return Err(BtcError::VerificationFailed(
            "previous locking script is not pay-to-public-key-hash".into(),
        ));
    }
    let hash: [u8; 20] = script.as_bytes()[3..23]
        .try_into()
        .map_err(|_| BtcError::VerificationFailed("truncated P2PKH script".into()))?;
    Ok(PubkeyHash::from_byte_array(hash))
}

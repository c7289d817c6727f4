//! The utility methods for BIP-322 for message signing
//! according to the BIP-322 standard.

use alloc::{string::ToString, vec};

use bitcoin::{
    absolute::LockTime,
    hashes::{sha256, Hash, HashEngine},
    opcodes::{all::OP_RETURN, OP_0},
    script::Builder,
    secp256k1::{All, Secp256k1},
    transaction::Version,
    Amount, OutPoint, Psbt, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use log::{debug, trace};

use crate::{output_script, AddressKind, Error, NetworkId};

const TAG: &str = "BIP0322-signed-message";

/// Creates a tagged hash of a message according to the BIP322 specification.
pub fn tagged_message_hash(message: &[u8]) -> sha256::Hash {
    let mut engine = sha256::Hash::engine();

    let tag_hash = sha256::Hash::hash(TAG.as_bytes());
    engine.input(&tag_hash[..]);
    engine.input(&tag_hash[..]);
    engine.input(message);

    sha256::Hash::from_engine(engine)
}

/// Constructs the "to_spend" transaction according to the BIP322 specification.
///
/// The single input spends the impossible outpoint `0000…00:0xFFFFFFFF`, so
/// the transaction can never be mined.
pub fn to_spend(script_pubkey: &ScriptBuf, message: &str) -> Transaction {
    let outpoint = OutPoint {
        txid: Txid::all_zeros(),
        vout: 0xFFFFFFFF,
    };
    let message_hash = tagged_message_hash(message.as_bytes());
    trace!("BIP322 message hash {}", message_hash);

    let script_sig = Builder::new()
        .push_opcode(OP_0)
        .push_slice(message_hash.to_byte_array())
        .into_script();

    Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: outpoint,
            script_sig,
            sequence: Sequence::ZERO,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(0),
            script_pubkey: script_pubkey.clone(),
        }],
    }
}

/// Constructs the "to_sign" container spending output 0 of `to_spend`.
///
/// Returns a PSBT ready for signing, with the spent output attached as the
/// witness UTXO of input 0.
pub fn to_sign(to_spend: &Transaction) -> Result<Psbt, Error> {
    let spent = to_spend
        .output
        .first()
        .ok_or_else(|| Error::ExtractionError("to_spend output".to_string()))?;

    let outpoint = OutPoint {
        txid: to_spend.compute_txid(),
        vout: 0x00,
    };
    trace!("BIP322 to_spend txid {}", outpoint.txid);

    let script_pub_key = Builder::new().push_opcode(OP_RETURN).into_script();

    let tx = Transaction {
        version: Version(0),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: outpoint,
            sequence: Sequence::ZERO,
            script_sig: ScriptBuf::new(),
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(0),
            script_pubkey: script_pub_key,
        }],
    };

    let mut psbt =
        Psbt::from_unsigned_tx(tx).map_err(|e| Error::ExtractionError(e.to_string()))?;

    psbt.inputs[0].witness_utxo = Some(TxOut {
        value: Amount::from_sat(0),
        script_pubkey: spent.script_pubkey.clone(),
    });

    Ok(psbt)
}

/// Builds the container a wallet signs to produce a simple BIP322 signature
/// for `message` under `address`.
///
/// Only single-key P2WPKH and P2TR addresses are accepted. The result
/// serializes with `to_string()` (base64) or `serialize_hex()`.
pub fn generate(message: &str, address: &str, network: NetworkId) -> Result<Psbt, Error> {
    let kind = AddressKind::from_address(address);
    if kind == AddressKind::Unsupported {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    debug!("Generating BIP322 {:?} container on {}", kind, network);

    let script_pubkey = output_script(address, network)?;
    if !script_pubkey.is_p2wpkh() && !script_pubkey.is_p2tr() {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    let to_spend = to_spend(&script_pubkey, message);

    to_sign(&to_spend)
}

pub(crate) type SecpCtx = Secp256k1<All>;

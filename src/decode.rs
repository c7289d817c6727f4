//! Human-readable summary of a PSBT, as shown to a user before they sign.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::str::FromStr;

use bitcoin::{
    consensus::encode::serialize_hex,
    hex::{DisplayHex, FromHex},
    opcodes::all::OP_RETURN,
    script::Instruction,
    Address, Amount, Psbt, Script, Txid,
};
use log::trace;

use crate::{Error, NetworkId};

/// Display forms of an output script.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptDetails {
    /// The address paying to this script, when it has one on the network
    pub address: Option<Address>,
    pub hex: String,
    pub asm: String,
    /// Data carried after a leading `OP_RETURN`, bytes masked to 7 bits
    pub ascii: String,
}

impl ScriptDetails {
    pub fn new(script: &Script, network: NetworkId) -> Self {
        Self {
            address: Address::from_script(script, network.to_network()).ok(),
            hex: script.as_bytes().to_lower_hex_string(),
            asm: script.to_asm_string(),
            ascii: op_return_ascii(script),
        }
    }
}

/// A spent or created output.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedTxOut {
    pub script: ScriptDetails,
    pub value: Amount,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedPsbt {
    /// Spent outputs, for the inputs that carry a witness UTXO
    pub inputs: Vec<DecodedTxOut>,
    pub outputs: Vec<DecodedTxOut>,
    pub txid: Txid,
    /// Inputs minus outputs; `None` when the outputs exceed the known inputs
    pub fee: Option<Amount>,
    pub vsize: usize,
    /// PSBT format version
    pub version: u32,
}

impl DecodedPsbt {
    pub fn from_hex(psbt_hex: &str, network: NetworkId) -> Result<Self, Error> {
        let bytes = Vec::<u8>::from_hex(psbt_hex.trim())
            .map_err(|e| Error::DecodeError(e.to_string()))?;
        let psbt = Psbt::deserialize(&bytes).map_err(|e| Error::DecodeError(e.to_string()))?;

        Ok(Self::from_psbt(&psbt, network))
    }

    pub fn from_base64(psbt_base64: &str, network: NetworkId) -> Result<Self, Error> {
        let psbt =
            Psbt::from_str(psbt_base64.trim()).map_err(|e| Error::DecodeError(e.to_string()))?;

        Ok(Self::from_psbt(&psbt, network))
    }

    pub fn from_psbt(psbt: &Psbt, network: NetworkId) -> Self {
        let inputs: Vec<DecodedTxOut> = psbt
            .inputs
            .iter()
            .filter_map(|input| input.witness_utxo.as_ref())
            .map(|utxo| DecodedTxOut {
                script: ScriptDetails::new(&utxo.script_pubkey, network),
                value: utxo.value,
            })
            .collect();

        let outputs: Vec<DecodedTxOut> = psbt
            .unsigned_tx
            .output
            .iter()
            .map(|txout| DecodedTxOut {
                script: ScriptDetails::new(&txout.script_pubkey, network),
                value: txout.value,
            })
            .collect();

        let fee = total(&inputs)
            .zip(total(&outputs))
            .and_then(|(spent, created)| spent.checked_sub(created));

        let txid = psbt.unsigned_tx.compute_txid();
        trace!("Decoded PSBT {} with fee {:?}", txid, fee);

        Self {
            inputs,
            outputs,
            txid,
            fee,
            vsize: psbt.unsigned_tx.vsize(),
            version: psbt.version,
        }
    }
}

/// Extracts the network-ready transaction from a signed PSBT, hex in and
/// hex out. Every input must already carry its final witness or script_sig.
pub fn extract_signed_tx_hex(psbt_hex: &str) -> Result<String, Error> {
    let bytes =
        Vec::<u8>::from_hex(psbt_hex.trim()).map_err(|e| Error::DecodeError(e.to_string()))?;
    let psbt = Psbt::deserialize(&bytes).map_err(|e| Error::DecodeError(e.to_string()))?;

    let unfinalized = psbt
        .inputs
        .iter()
        .position(|input| input.final_script_witness.is_none() && input.final_script_sig.is_none());
    if let Some(index) = unfinalized {
        return Err(Error::DecodeError(format!("input {} is not finalized", index)));
    }

    let tx = psbt.extract_tx().map_err(|e| Error::DecodeError(e.to_string()))?;
    trace!("Extracted signed transaction {}", tx.compute_txid());

    Ok(serialize_hex(&tx))
}

fn total(entries: &[DecodedTxOut]) -> Option<Amount> {
    entries
        .iter()
        .try_fold(Amount::ZERO, |acc, entry| acc.checked_add(entry.value))
}

fn op_return_ascii(script: &Script) -> String {
    let mut instructions = script.instructions();

    match instructions.next() {
        Some(Ok(Instruction::Op(op))) if op == OP_RETURN => {}
        _ => return String::new(),
    }

    instructions
        .filter_map(|instruction| match instruction {
            Ok(Instruction::PushBytes(push)) => Some(push.as_bytes()),
            _ => None,
        })
        .flat_map(|data| data.iter().map(|byte| char::from(byte & 0x7f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{
        absolute::LockTime, consensus::encode::deserialize, script::Builder, script::PushBytesBuf,
        transaction::Version, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
    };

    use crate::{generate, Signer};

    const PRIVATE_KEY: &str = "L3VFeEujGtevx9w18HD1fhRbCH67Az2dpCymeRE1SoPK6XQtaN2k";
    const SEGWIT_ADDRESS: &str = "bc1q9vza2e8x573nczrlzms0wvx3gsqjx7vavgkx0l";

    #[test]
    fn test_decode_bip322_container() {
        let psbt = generate("Hello World", SEGWIT_ADDRESS, NetworkId::Mainnet).unwrap();
        let decoded = DecodedPsbt::from_hex(&psbt.serialize_hex(), NetworkId::Mainnet).unwrap();

        assert_eq!(
            decoded.txid.to_string(),
            "88737ae86f2077145f93cc4b153ae9a1cb8d56afa511988c149c5c8c9d93bddf"
        );
        assert_eq!(decoded.version, 0);
        assert_eq!(decoded.fee, Some(Amount::ZERO));

        assert_eq!(decoded.inputs.len(), 1);
        assert_eq!(
            decoded.inputs[0].script.address.as_ref().unwrap().to_string(),
            SEGWIT_ADDRESS
        );
        assert_eq!(decoded.inputs[0].value, Amount::ZERO);

        assert_eq!(decoded.outputs.len(), 1);
        assert_eq!(decoded.outputs[0].script.address, None);
        assert_eq!(decoded.outputs[0].script.hex, "6a");
        assert_eq!(decoded.outputs[0].script.asm, "OP_RETURN");
        assert_eq!(decoded.outputs[0].script.ascii, "");

        let from_base64 = DecodedPsbt::from_base64(&psbt.to_string(), NetworkId::Mainnet).unwrap();
        assert_eq!(from_base64, decoded);
    }

    #[test]
    fn test_decode_fee_and_op_return_data() {
        let payee = Address::from_str(SEGWIT_ADDRESS)
            .unwrap()
            .assume_checked()
            .script_pubkey();
        let memo = Builder::new()
            .push_opcode(OP_RETURN)
            .push_slice(PushBytesBuf::try_from(b"hello".to_vec()).unwrap())
            .into_script();

        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![
                TxOut {
                    value: Amount::from_sat(9_000),
                    script_pubkey: payee.clone(),
                },
                TxOut {
                    value: Amount::ZERO,
                    script_pubkey: memo,
                },
            ],
        };
        let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();
        psbt.inputs[0].witness_utxo = Some(TxOut {
            value: Amount::from_sat(10_000),
            script_pubkey: payee,
        });

        let decoded = DecodedPsbt::from_psbt(&psbt, NetworkId::Mainnet);
        assert_eq!(decoded.fee, Some(Amount::from_sat(1_000)));
        assert_eq!(decoded.outputs[0].script.ascii, "");
        assert_eq!(decoded.outputs[1].script.ascii, "hello");
        assert!(decoded.vsize > 0);

        // the same script renders as a testnet address
        let testnet = DecodedPsbt::from_psbt(&psbt, NetworkId::Testnet);
        assert_ne!(
            testnet.outputs[0].script.address,
            decoded.outputs[0].script.address
        );
    }

    #[test]
    fn test_decode_missing_inputs_has_no_fee() {
        let mut psbt = generate("Hello World", SEGWIT_ADDRESS, NetworkId::Mainnet).unwrap();
        psbt.inputs[0].witness_utxo = None;
        psbt.unsigned_tx.output[0].value = Amount::from_sat(1);

        let decoded = DecodedPsbt::from_psbt(&psbt, NetworkId::Mainnet);
        assert!(decoded.inputs.is_empty());
        assert_eq!(decoded.fee, None);
    }

    #[test]
    fn test_extract_signed_segwit_spend() {
        let mut psbt = generate("Hello World", SEGWIT_ADDRESS, NetworkId::Mainnet).unwrap();
        let payload = Signer::new(
            PRIVATE_KEY.to_string(),
            "Hello World".to_string(),
            SEGWIT_ADDRESS.to_string(),
            NetworkId::Mainnet,
        )
        .sign_payload()
        .unwrap();
        psbt.inputs[0].final_script_witness = Some(Witness::from_slice(payload.elements()));

        let tx_hex = extract_signed_tx_hex(&psbt.serialize_hex()).unwrap();
        let tx: Transaction = deserialize(&Vec::<u8>::from_hex(&tx_hex).unwrap()).unwrap();

        assert_eq!(
            tx.compute_txid().to_string(),
            "88737ae86f2077145f93cc4b153ae9a1cb8d56afa511988c149c5c8c9d93bddf"
        );
        assert_eq!(tx.input[0].witness.to_vec(), payload.elements());
        // version 0 followed by the segwit marker and flag
        assert!(tx_hex.starts_with("000000000001"));
    }

    #[test]
    fn test_extract_requires_finalized_inputs() {
        let psbt = generate("Hello World", SEGWIT_ADDRESS, NetworkId::Mainnet).unwrap();

        assert!(matches!(
            extract_signed_tx_hex(&psbt.serialize_hex()),
            Err(Error::DecodeError(_))
        ));
        assert!(matches!(extract_signed_tx_hex("zz"), Err(Error::DecodeError(_))));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            DecodedPsbt::from_hex("zz", NetworkId::Mainnet),
            Err(Error::DecodeError(_))
        ));
        assert!(matches!(
            DecodedPsbt::from_hex("deadbeef", NetworkId::Mainnet),
            Err(Error::DecodeError(_))
        ));
        assert!(matches!(
            DecodedPsbt::from_base64("cHNidP8=", NetworkId::Mainnet),
            Err(Error::DecodeError(_))
        ));
    }
}

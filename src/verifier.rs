//! BIP-322 simple signature verification.
//!
//! Verification has two distinct failure channels. Input that cannot be
//! interpreted (bad address for the network, undecodable payload) is an
//! [`Error`]. A payload that decodes but does not prove control of the
//! address is `Ok(false)`, as is an address type the simple format is not
//! implemented for.

use alloc::string::{String, ToString};

use bitcoin::{
    ecdsa,
    hashes::Hash,
    secp256k1::Message,
    sighash::{Prevouts, SighashCache},
    taproot, Psbt, PublicKey, ScriptBuf, TapSighashType, XOnlyPublicKey,
};
use log::debug;

use crate::{
    output_script, to_sign, to_spend, AddressKind, Error, NetworkId, SecpCtx, SignatureEncoding,
    SignaturePayload,
};

/// A verification request for a simple BIP322 signature.
#[derive(Clone, Debug)]
pub struct Verifier {
    address_str: String,
    signature: String,
    message: String,
    network: NetworkId,
    encoding: SignatureEncoding,
}

impl Verifier {
    pub fn new(address_str: String, signature: String, message: String, network: NetworkId) -> Self {
        Self {
            address_str,
            signature,
            message,
            network,
            encoding: SignatureEncoding::Base64,
        }
    }

    /// Reads the signature as `encoding` instead of base64.
    pub fn with_encoding(mut self, encoding: SignatureEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn verify(&self) -> Result<bool, Error> {
        verify_with_encoding(
            &self.address_str,
            &self.message,
            &self.signature,
            self.network,
            self.encoding,
        )
    }
}

/// Verifies a base64 simple BIP322 signature of `message` by `address`.
pub fn verify(
    address: &str,
    message: &str,
    signature: &str,
    network: NetworkId,
) -> Result<bool, Error> {
    verify_with_encoding(address, message, signature, network, SignatureEncoding::Base64)
}

/// Verifies a simple BIP322 signature given in `encoding`.
pub fn verify_with_encoding(
    address: &str,
    message: &str,
    signature: &str,
    network: NetworkId,
    encoding: SignatureEncoding,
) -> Result<bool, Error> {
    let kind = AddressKind::from_address(address);
    if kind == AddressKind::Unsupported {
        debug!("BIP322 simple verification not supported for {}", address);
        return Ok(false);
    }

    let script_pubkey = output_script(address, network)?;
    let payload = SignaturePayload::decode(signature, encoding)?;

    let to_spend = to_spend(&script_pubkey, message);
    let to_sign = to_sign(&to_spend)?;

    let valid = match kind {
        AddressKind::WitnessV0 if script_pubkey.is_p2wpkh() => verify_p2wpkh(to_sign, &payload)?,
        AddressKind::WitnessV1 if script_pubkey.is_p2tr() => {
            verify_p2tr(&to_sign, &payload, &script_pubkey)?
        }
        _ => {
            debug!("{} is not a single-key witness address", address);
            false
        }
    };

    debug!("BIP322 {:?} signature for {} valid: {}", kind, address, valid);
    Ok(valid)
}

/// Attaches the (public key, signature) pair from the payload as the partial
/// signature of input 0 and validates it.
fn verify_p2wpkh(mut to_sign: Psbt, payload: &SignaturePayload) -> Result<bool, Error> {
    let [encoded_signature, encoded_pub_key] = payload.expect_elements::<2>()?;

    let signature = match ecdsa::Signature::from_slice(encoded_signature) {
        Ok(signature) => signature,
        Err(e) => {
            debug!("Unparseable ECDSA signature: {}", e);
            return Ok(false);
        }
    };
    let pub_key = match PublicKey::from_slice(encoded_pub_key) {
        Ok(pub_key) => pub_key,
        Err(e) => {
            debug!("Unparseable public key: {}", e);
            return Ok(false);
        }
    };

    to_sign.inputs[0].partial_sigs.insert(pub_key, signature);

    validate_partial_sigs(&to_sign)
}

/// Checks every partial signature of every input against the BIP-143
/// sighash of its own sighash type. Inputs must be P2WPKH with a witness
/// UTXO and at least one signature, and each key must hash to the witness
/// program it signs for.
fn validate_partial_sigs(psbt: &Psbt) -> Result<bool, Error> {
    let secp = SecpCtx::new();
    let mut sighash_cache = SighashCache::new(&psbt.unsigned_tx);

    for (input_index, input) in psbt.inputs.iter().enumerate() {
        let Some(prevout) = input.witness_utxo.as_ref() else {
            return Ok(false);
        };
        if input.partial_sigs.is_empty() || !prevout.script_pubkey.is_p2wpkh() {
            return Ok(false);
        }

        for (pub_key, signature) in &input.partial_sigs {
            let Ok(wpubkey_hash) = pub_key.wpubkey_hash() else {
                return Ok(false);
            };
            if ScriptBuf::new_p2wpkh(&wpubkey_hash) != prevout.script_pubkey {
                debug!("Public key {} does not match the signed output", pub_key);
                return Ok(false);
            }

            let sighash = sighash_cache
                .p2wpkh_signature_hash(
                    input_index,
                    &prevout.script_pubkey,
                    prevout.value,
                    signature.sighash_type,
                )
                .map_err(|e| Error::SighashError(e.to_string()))?;

            let msg = Message::from_digest(sighash.to_byte_array());

            if secp
                .verify_ecdsa(&msg, &signature.signature, &pub_key.inner)
                .is_err()
            {
                return Ok(false);
            }
        }
    }

    Ok(true)
}

/// Verifies a key-path spend of input 0 by the output key in `script_pubkey`.
fn verify_p2tr(
    to_sign: &Psbt,
    payload: &SignaturePayload,
    script_pubkey: &ScriptBuf,
) -> Result<bool, Error> {
    let secp = SecpCtx::new();
    let [encoded_signature] = payload.expect_elements::<1>()?;

    // 64 bytes commit to SIGHASH_DEFAULT, 65 bytes carry an explicit type
    let signature = match taproot::Signature::from_slice(encoded_signature) {
        Ok(signature) => signature,
        Err(e) => {
            debug!("Unparseable Schnorr signature: {}", e);
            return Ok(false);
        }
    };
    if !matches!(
        signature.sighash_type,
        TapSighashType::Default | TapSighashType::All
    ) {
        debug!("Unexpected sighash type {}", signature.sighash_type);
        return Ok(false);
    }

    // OP_1 OP_PUSHBYTES_32 <output key>
    let Ok(pub_key) = XOnlyPublicKey::from_slice(&script_pubkey.as_bytes()[2..]) else {
        return Ok(false);
    };

    let prevout = to_sign.inputs[0]
        .witness_utxo
        .clone()
        .ok_or_else(|| Error::ExtractionError("witness utxo".to_string()))?;

    let mut sighash_cache = SighashCache::new(&to_sign.unsigned_tx);
    let sighash = sighash_cache
        .taproot_key_spend_signature_hash(0, &Prevouts::All(&[prevout]), signature.sighash_type)
        .map_err(|e| Error::SighashError(e.to_string()))?;

    let msg = Message::from_digest(sighash.to_byte_array());

    Ok(secp
        .verify_schnorr(&signature.signature, &msg, &pub_key)
        .is_ok())
}

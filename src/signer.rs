//! Local production of simple BIP322 signatures from a WIF private key.

use alloc::string::{String, ToString};

use bitcoin::{
    ecdsa,
    hashes::Hash,
    key::{Keypair, TapTweak},
    secp256k1::Message,
    sighash::{Prevouts, SighashCache},
    taproot, Amount, CompressedPublicKey, EcdsaSighashType, PrivateKey, Psbt, ScriptBuf, TapSighashType,
    Witness,
};
use log::debug;

use crate::{
    output_script, to_sign, to_spend, AddressKind, Error, NetworkId, SecpCtx, SignatureEncoding,
    SignaturePayload,
};

pub struct Signer {
    private_key_str: String,
    message: String,
    address_str: String,
    network: NetworkId,
}

impl Signer {
    pub fn new(
        private_key_str: String,
        message: String,
        address_str: String,
        network: NetworkId,
    ) -> Self {
        Self {
            private_key_str,
            message,
            address_str,
            network,
        }
    }

    /// Signs and returns the base64 witness payload.
    pub fn sign(&self) -> Result<String, Error> {
        self.sign_with_encoding(SignatureEncoding::Base64)
    }

    pub fn sign_with_encoding(&self, encoding: SignatureEncoding) -> Result<String, Error> {
        Ok(self.sign_payload()?.encode(encoding))
    }

    /// Signs the "to_sign" container of the message and returns the
    /// finalized witness of its only input.
    pub fn sign_payload(&self) -> Result<SignaturePayload, Error> {
        let secp = SecpCtx::new();
        let private_key =
            PrivateKey::from_wif(&self.private_key_str).map_err(|_| Error::InvalidPrivateKey)?;

        if AddressKind::from_address(&self.address_str) == AddressKind::Unsupported {
            return Err(Error::InvalidAddress(self.address_str.clone()));
        }
        let script_pubkey = output_script(&self.address_str, self.network)?;

        let to_spend = to_spend(&script_pubkey, &self.message);
        let to_sign = to_sign(&to_spend)?;

        let witness = if script_pubkey.is_p2wpkh() {
            sign_p2wpkh(&secp, &to_sign, &private_key, &script_pubkey)?
        } else if script_pubkey.is_p2tr() {
            sign_p2tr(&secp, &to_sign, &private_key, &script_pubkey)?
        } else {
            return Err(Error::UnsupportedType);
        };
        debug!("Signed BIP322 message for {}", self.address_str);

        Ok(SignaturePayload::from_witness(&witness))
    }
}

fn sign_p2wpkh(
    secp: &SecpCtx,
    to_sign: &Psbt,
    private_key: &PrivateKey,
    script_pubkey: &ScriptBuf,
) -> Result<Witness, Error> {
    let sighash_type = EcdsaSighashType::All;

    let pub_key = CompressedPublicKey::from_private_key(secp, private_key)
        .map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
    if ScriptBuf::new_p2wpkh(&pub_key.wpubkey_hash()) != *script_pubkey {
        return Err(Error::InvalidPublicKey(
            "key does not control the address".to_string(),
        ));
    }

    let sighash = SighashCache::new(&to_sign.unsigned_tx)
        .p2wpkh_signature_hash(0, script_pubkey, prevout_value(to_sign)?, sighash_type)
        .map_err(|e| Error::SighashError(e.to_string()))?;

    let msg = Message::from_digest(sighash.to_byte_array());
    let signature = ecdsa::Signature {
        signature: secp.sign_ecdsa(&msg, &private_key.inner),
        sighash_type,
    };

    Ok(Witness::p2wpkh(&signature, &pub_key.0))
}

fn sign_p2tr(
    secp: &SecpCtx,
    to_sign: &Psbt,
    private_key: &PrivateKey,
    script_pubkey: &ScriptBuf,
) -> Result<Witness, Error> {
    // BIP-340 signatures without a sighash byte commit to SIGHASH_DEFAULT
    let sighash_type = TapSighashType::Default;

    let keypair = Keypair::from_secret_key(secp, &private_key.inner);
    let (internal_key, _) = keypair.x_only_public_key();
    if ScriptBuf::new_p2tr(secp, internal_key, None) != *script_pubkey {
        return Err(Error::InvalidPublicKey(
            "key does not control the address".to_string(),
        ));
    }
    let tweaked = keypair.tap_tweak(secp, None).to_keypair();

    let prevout = to_sign.inputs[0]
        .witness_utxo
        .clone()
        .ok_or_else(|| Error::ExtractionError("witness utxo".to_string()))?;

    let sighash = SighashCache::new(&to_sign.unsigned_tx)
        .taproot_key_spend_signature_hash(0, &Prevouts::All(&[prevout]), sighash_type)
        .map_err(|e| Error::SighashError(e.to_string()))?;

    let msg = Message::from_digest(sighash.to_byte_array());
    let signature = taproot::Signature {
        signature: secp.sign_schnorr_no_aux_rand(&msg, &tweaked),
        sighash_type,
    };

    Ok(Witness::p2tr_key_spend(&signature))
}

fn prevout_value(to_sign: &Psbt) -> Result<Amount, Error> {
    to_sign.inputs[0]
        .witness_utxo
        .as_ref()
        .map(|utxo| utxo.value)
        .ok_or_else(|| Error::ExtractionError("witness utxo".to_string()))
}

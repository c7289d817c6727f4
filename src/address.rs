//! Address type dispatch and output script derivation.

use alloc::string::ToString;
use core::str::FromStr;

use bitcoin::{Address, ScriptBuf};

use crate::{Error, NetworkId};

/// The address types the simple signature format is implemented for,
/// picked from the address' human-readable prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    /// `bc1q`, `tb1q`, `bcrt1q`: single-key P2WPKH
    WitnessV0,
    /// `bc1p`, `tb1p`, `bcrt1p`: single-key P2TR
    WitnessV1,
    /// Anything else, including legacy and nested segwit addresses
    Unsupported,
}

const V0_PREFIXES: [&str; 3] = ["bc1q", "tb1q", "bcrt1q"];
const V1_PREFIXES: [&str; 3] = ["bc1p", "tb1p", "bcrt1p"];

impl AddressKind {
    /// Classifies an address string without decoding it.
    ///
    /// Bech32 strings are valid in either all-lower or all-upper case, so the
    /// prefix is compared case-insensitively.
    pub fn from_address(address: &str) -> Self {
        let has_prefix = |prefix: &str| {
            address
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        };

        if V0_PREFIXES.iter().any(|p| has_prefix(p)) {
            Self::WitnessV0
        } else if V1_PREFIXES.iter().any(|p| has_prefix(p)) {
            Self::WitnessV1
        } else {
            Self::Unsupported
        }
    }
}

/// Decodes `address` for `network` and returns its output script.
///
/// The script decodes back to the same address under the same network.
pub fn output_script(address: &str, network: NetworkId) -> Result<ScriptBuf, Error> {
    let address = Address::from_str(address)
        .map_err(|e| Error::InvalidAddress(e.to_string()))?
        .require_network(network.to_network())
        .map_err(|e| Error::InvalidAddress(e.to_string()))?;

    Ok(address.script_pubkey())
}
